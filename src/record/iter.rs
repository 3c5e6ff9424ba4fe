//! Field iteration.

use std::iter::FusedIterator;
use std::slice;

use crate::record::FieldDecl;
use crate::value::Value;

/// Iterator over `(name, value)` entries in declaration order.
///
/// Created by [`Record::iter`](crate::Record::iter). Each call to `iter`
/// starts a fresh pass.
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    decls: slice::Iter<'a, FieldDecl>,
    values: slice::Iter<'a, Value>,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(decls: &'a [FieldDecl], values: &'a [Value]) -> Self {
        Self {
            decls: decls.iter(),
            values: values.iter(),
        }
    }
}

impl<'a> Iterator for Fields<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        let decl = self.decls.next()?;
        let value = self.values.next()?;
        Some((decl.name.as_str(), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.decls.len().min(self.values.len());
        (len, Some(len))
    }
}

impl DoubleEndedIterator for Fields<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let decl = self.decls.next_back()?;
        let value = self.values.next_back()?;
        Some((decl.name.as_str(), value))
    }
}

impl ExactSizeIterator for Fields<'_> {}

impl FusedIterator for Fields<'_> {}
