//! Field keys for indexed access.

use crate::value::Value;

/// Locates a field by ordinal position or by name.
///
/// Any dynamic [`Value`] converts into a key; kinds other than integers and
/// strings become `Unsupported` and fail when resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey<'a> {
    /// Position in declaration order; negative counts from the end.
    Index(isize),
    /// Field name.
    Name(&'a str),
    /// A key of an unsupported kind, tagged with its type name.
    Unsupported(&'static str),
}

impl From<usize> for FieldKey<'_> {
    fn from(v: usize) -> Self {
        Self::Index(isize::try_from(v).unwrap_or(isize::MAX))
    }
}

impl From<isize> for FieldKey<'_> {
    fn from(v: isize) -> Self {
        Self::Index(v)
    }
}

impl From<i32> for FieldKey<'_> {
    fn from(v: i32) -> Self {
        Self::Index(v as isize)
    }
}

impl<'a> From<&'a str> for FieldKey<'a> {
    fn from(v: &'a str) -> Self {
        Self::Name(v)
    }
}

impl<'a> From<&'a String> for FieldKey<'a> {
    fn from(v: &'a String) -> Self {
        Self::Name(v)
    }
}

impl<'a> From<&'a Value> for FieldKey<'a> {
    fn from(v: &'a Value) -> Self {
        match v {
            Value::Int(i) => Self::Index(isize::try_from(*i).unwrap_or(isize::MAX)),
            Value::String(s) => Self::Name(s),
            other => Self::Unsupported(other.type_name()),
        }
    }
}
