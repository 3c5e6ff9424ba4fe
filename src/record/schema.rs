//! Record schemas: the per-type field descriptor.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::decl::TypeDecl;
use crate::error::{AccessError, SchemaError};
use crate::record::FieldKey;
use crate::value::Value;

/// One declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// Field name.
    pub name: String,
    /// Declared type.
    pub decl: TypeDecl,
    /// Value used when construction does not supply one.
    pub default: Option<Value>,
}

/// An ordered table of field name to declared type.
///
/// Schemas are immutable once built and shared through `Arc`.
///
/// # Examples
///
/// ```
/// use strictrecord::{RecordSchema, TypeDecl};
///
/// let schema = RecordSchema::builder("Point")
///     .field("x", TypeDecl::Int)
///     .field("y", TypeDecl::Int)
///     .build()
///     .unwrap();
/// assert_eq!(schema.all_fields(), ["x", "y"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    name: String,
    fields: Vec<FieldDecl>,
}

impl RecordSchema {
    /// Starts a schema with the given record name.
    pub fn builder(name: impl Into<String>) -> RecordSchemaBuilder {
        RecordSchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in declaration order.
    #[must_use]
    pub fn all_fields(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Field name to declared type, in declaration order.
    #[must_use]
    pub fn fields_dict(&self) -> IndexMap<&str, &TypeDecl> {
        self.fields
            .iter()
            .map(|f| (f.name.as_str(), &f.decl))
            .collect()
    }

    /// Position of the named field.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Resolves a key to a field position. Negative ordinals count from the end.
    pub fn resolve(&self, key: FieldKey<'_>) -> Result<usize, AccessError> {
        match key {
            FieldKey::Index(index) => {
                let len = self.fields.len();
                let resolved = if index < 0 {
                    len.checked_sub(index.unsigned_abs())
                } else {
                    Some(index.unsigned_abs())
                };
                resolved
                    .filter(|&i| i < len)
                    .ok_or_else(|| AccessError::IndexOutOfRange {
                        record: self.name.clone(),
                        index,
                        len,
                    })
            }
            FieldKey::Name(name) => self.position(name).ok_or_else(|| AccessError::UnknownField {
                record: self.name.clone(),
                name: name.to_string(),
            }),
            FieldKey::Unsupported(key_type) => Err(AccessError::UnsupportedKey {
                record: self.name.clone(),
                key_type,
            }),
        }
    }
}

/// Builder for [`RecordSchema`].
#[derive(Debug, Clone)]
pub struct RecordSchemaBuilder {
    name: String,
    fields: Vec<FieldDecl>,
}

impl RecordSchemaBuilder {
    /// Declares a required field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, decl: TypeDecl) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            decl,
            default: None,
        });
        self
    }

    /// Declares a field with a default value.
    ///
    /// The default goes through coercion like any supplied value.
    #[must_use]
    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        decl: TypeDecl,
        default: impl Into<Value>,
    ) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            decl,
            default: Some(default.into()),
        });
        self
    }

    /// Declares a prepared field.
    #[must_use]
    pub fn push(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    /// Builds the schema.
    ///
    /// Returns `SchemaError::EmptyName` / `EmptyFieldName` for blank names,
    /// `DuplicateField` when a name repeats, and `DefaultOrder` when a
    /// required field follows a defaulted one.
    pub fn build(self) -> Result<Arc<RecordSchema>, SchemaError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(SchemaError::EmptyName);
        }

        let mut seen_default = false;
        for (i, field) in self.fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                return Err(SchemaError::EmptyFieldName { record: name });
            }
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateField {
                    record: name,
                    field: field.name.clone(),
                });
            }
            if field.default.is_some() {
                seen_default = true;
            } else if seen_default {
                return Err(SchemaError::DefaultOrder {
                    record: name,
                    field: field.name.clone(),
                });
            }
        }

        Ok(Arc::new(RecordSchema {
            name,
            fields: self.fields,
        }))
    }
}
