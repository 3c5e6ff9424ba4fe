//! Type-enforced records.
//!
//! A [`Record`] pairs a shared [`RecordSchema`] with one value per declared
//! field. Construction binds positional and named arguments, fills
//! defaults, and then coerces every field to its declared type in
//! declaration order. Afterwards the record behaves as a plain value
//! object: fields are read and written by ordinal or by name, and can
//! never be deleted.

mod iter;
mod key;
mod schema;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::coerce::coerce;
use crate::decl::TypeDecl;
use crate::error::{AccessError, ConstructionError};
use crate::value::Value;

pub use iter::Fields;
pub use key::FieldKey;
pub use schema::{FieldDecl, RecordSchema, RecordSchemaBuilder};

/// An instance of a record schema.
///
/// # Examples
///
/// ```
/// use strictrecord::{Record, RecordSchema, TypeDecl, Value};
///
/// let schema = RecordSchema::builder("Point")
///     .field("x", TypeDecl::Int)
///     .field("y", TypeDecl::Float)
///     .build()
///     .unwrap();
///
/// let mut p = Record::new(&schema, ["1".into(), Value::Int(2)]).unwrap();
/// assert_eq!(p.get(0).unwrap(), &Value::Int(1));
/// assert_eq!(p.get("y").unwrap(), &Value::Float(2.0));
///
/// p.set("x", Value::Int(5)).unwrap();
/// assert!(p.remove("x").unwrap_err().is_unsupported());
/// assert_eq!(p.to_string(), "Point(x=5, y=2.0)");
/// ```
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<RecordSchema>,
    values: Vec<Value>,
}

impl Record {
    /// Constructs from positional arguments.
    pub fn new(
        schema: &Arc<RecordSchema>,
        positional: impl IntoIterator<Item = Value>,
    ) -> Result<Self, ConstructionError> {
        Self::construct(schema, positional, Vec::<(String, Value)>::new())
    }

    /// Constructs from named arguments.
    pub fn from_named<K: Into<String>>(
        schema: &Arc<RecordSchema>,
        named: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<Self, ConstructionError> {
        Self::construct(schema, Vec::new(), named)
    }

    /// Constructs from positional and named arguments, then coerces every field.
    ///
    /// Returns an arity error when the arguments do not bind (too many
    /// positional, unknown keyword, a field given twice, a required field
    /// missing) and `ConstructionError::FieldCoercion` for the first field
    /// whose value cannot be coerced.
    pub fn construct<K: Into<String>>(
        schema: &Arc<RecordSchema>,
        positional: impl IntoIterator<Item = Value>,
        named: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<Self, ConstructionError> {
        let mut record = Self::bind(schema, positional, named)?;
        record.coerce_fields()?;
        Ok(record)
    }

    fn bind<K: Into<String>>(
        schema: &Arc<RecordSchema>,
        positional: impl IntoIterator<Item = Value>,
        named: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<Self, ConstructionError> {
        let record_name = || schema.name().to_string();
        let mut slots: Vec<Option<Value>> = vec![None; schema.len()];

        let positional: Vec<Value> = positional.into_iter().collect();
        if positional.len() > slots.len() {
            return Err(ConstructionError::TooManyPositional {
                record: record_name(),
                expected: slots.len(),
                actual: positional.len(),
            });
        }
        for (slot, value) in slots.iter_mut().zip(positional) {
            *slot = Some(value);
        }

        for (name, value) in named {
            let name = name.into();
            let Some(pos) = schema.position(&name) else {
                return Err(ConstructionError::UnexpectedKeyword {
                    record: record_name(),
                    name,
                });
            };
            if slots[pos].is_some() {
                return Err(ConstructionError::DuplicateArgument {
                    record: record_name(),
                    field: name,
                });
            }
            slots[pos] = Some(value);
        }

        let values = slots
            .into_iter()
            .zip(schema.fields())
            .map(|(slot, field)| {
                slot.or_else(|| field.default.clone())
                    .ok_or_else(|| ConstructionError::MissingArgument {
                        record: record_name(),
                        field: field.name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            schema: Arc::clone(schema),
            values,
        })
    }

    /// Constructs from a JSON document: an object binds by name, an array by position.
    ///
    /// # Examples
    ///
    /// ```
    /// use strictrecord::{Record, RecordSchema, TypeDecl, Value};
    ///
    /// let schema = RecordSchema::builder("Reading")
    ///     .field("sensor", TypeDecl::Str)
    ///     .field("value", TypeDecl::Float)
    ///     .build()
    ///     .unwrap();
    /// let r = Record::from_json_str(&schema, r#"{"sensor": "t1", "value": "21.5"}"#).unwrap();
    /// assert_eq!(r.get("value").unwrap(), &Value::Float(21.5));
    /// ```
    pub fn from_json_str(schema: &Arc<RecordSchema>, text: &str) -> Result<Self, ConstructionError> {
        let json: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ConstructionError::Malformed {
                message: format!("parse JSON: {e}"),
            })?;
        match Value::from(json) {
            Value::Map(entries) => Self::from_named(schema, entries),
            Value::List(items) => Self::new(schema, items),
            other => Err(ConstructionError::Malformed {
                message: format!(
                    "expected a JSON object or array for `{}`, found {}",
                    schema.name(),
                    other.type_name()
                ),
            }),
        }
    }

    /// Coerces every field to its declared type, in declaration order.
    ///
    /// Construction runs this automatically. Writes through [`Record::set`]
    /// are not coerced; call this to normalize again. On failure the field
    /// that failed keeps its previous value and later fields are untouched.
    pub fn coerce_fields(&mut self) -> Result<(), ConstructionError> {
        let schema = Arc::clone(&self.schema);
        for (field, slot) in schema.fields().iter().zip(self.values.iter_mut()) {
            match coerce(slot.clone(), &field.decl) {
                Ok(value) => *slot = value,
                Err(source) => {
                    debug!(
                        record = schema.name(),
                        field = field.name.as_str(),
                        declared = %field.decl,
                        error = %source,
                        "field coercion failed"
                    );
                    return Err(ConstructionError::FieldCoercion {
                        record: schema.name().to_string(),
                        field: field.name.clone(),
                        source,
                    });
                }
            }
        }
        Ok(())
    }

    /// The shared schema.
    #[must_use]
    pub const fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    /// The record type name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// Field values in declaration order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for a record with no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Reads a field by ordinal or name.
    pub fn get<'k>(&self, key: impl Into<FieldKey<'k>>) -> Result<&Value, AccessError> {
        let pos = self.schema.resolve(key.into())?;
        Ok(&self.values[pos])
    }

    /// Overwrites a field by ordinal or name and returns the previous value.
    ///
    /// The new value is stored as given, without coercion.
    pub fn set<'k>(
        &mut self,
        key: impl Into<FieldKey<'k>>,
        value: impl Into<Value>,
    ) -> Result<Value, AccessError> {
        let pos = self.schema.resolve(key.into())?;
        Ok(std::mem::replace(&mut self.values[pos], value.into()))
    }

    /// Field deletion is not supported: this always fails.
    pub fn remove<'k>(&mut self, key: impl Into<FieldKey<'k>>) -> Result<Value, AccessError> {
        let _ = key.into();
        Err(AccessError::DeleteUnsupported {
            record: self.schema.name().to_string(),
        })
    }

    /// Field names in declaration order.
    #[must_use]
    pub fn all_fields(&self) -> Vec<&str> {
        self.schema.all_fields()
    }

    /// Field name to declared type, in declaration order.
    #[must_use]
    pub fn fields_dict(&self) -> IndexMap<&str, &TypeDecl> {
        self.schema.fields_dict()
    }

    /// An owned snapshot with nested records flattened to maps.
    #[must_use]
    pub fn to_dict(&self) -> IndexMap<String, Value> {
        self.iter()
            .map(|(name, value)| (name.to_string(), value.to_plain()))
            .collect()
    }

    /// Iterates `(name, value)` entries in declaration order.
    #[must_use]
    pub fn iter(&self) -> Fields<'_> {
        Fields::new(self.schema.fields(), &self.values)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.schema, &other.schema) || self.schema == other.schema)
            && self.values == other.values
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a str, &'a Value);
    type IntoIter = Fields<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.schema.name())?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
