//! Named type registry and schema documents.
//!
//! Declared types written as text (`"list[Point]"`, `"Optional[Money]"`)
//! refer to record types and custom constructors by name. A
//! [`TypeRegistry`] holds those names so the declaration parser can
//! resolve them, and loads record schemas from JSON documents:
//!
//! ```json
//! {
//!   "name": "Order",
//!   "fields": [
//!     {"name": "id", "type": "int"},
//!     {"name": "lines", "type": "list[Line]"},
//!     {"name": "note", "type": "Optional[str]", "default": null}
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::coerce::Constructor;
use crate::decl::{Parser, TypeDecl};
use crate::error::SchemaError;
use crate::record::{FieldDecl, RecordSchema};
use crate::value::Value;

/// Name to declared type lookup used when parsing declaration text.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDecl>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `decl` under `name`, returning any declaration it replaces.
    pub fn register(&mut self, name: impl Into<String>, decl: TypeDecl) -> Option<TypeDecl> {
        let name = name.into();
        debug!(name = %name, decl = %decl, "registered type");
        self.types.insert(name, decl)
    }

    /// Registers a record schema under its record name.
    pub fn register_record(&mut self, schema: &Arc<RecordSchema>) -> Option<TypeDecl> {
        self.register(schema.name().to_string(), TypeDecl::record(schema))
    }

    /// Registers a custom constructor under its own name.
    pub fn register_constructor(&mut self, ctor: Arc<dyn Constructor>) -> Option<TypeDecl> {
        self.register(ctor.name().to_string(), TypeDecl::Custom(ctor))
    }

    /// Looks up a registered name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&TypeDecl> {
        self.types.get(name)
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Parses declaration text, resolving unknown names against this registry.
    ///
    /// Names that are neither built in nor registered become
    /// `TypeDecl::Opaque` and reject every value at coercion time.
    pub fn parse(&self, text: &str) -> Result<TypeDecl, SchemaError> {
        Parser::new(text, Some(self)).parse()
    }

    /// Builds a schema from a document and registers it under its name.
    pub fn load_schema(&mut self, doc: &SchemaDocument) -> Result<Arc<RecordSchema>, SchemaError> {
        let mut builder = RecordSchema::builder(doc.name.as_str());
        for field in &doc.fields {
            builder = builder.push(FieldDecl {
                name: field.name.clone(),
                decl: self.parse(&field.ty)?,
                default: field.default.clone(),
            });
        }
        let schema = builder.build()?;
        self.register_record(&schema);
        Ok(schema)
    }

    /// Parses a JSON schema document, then loads it.
    ///
    /// # Examples
    ///
    /// ```
    /// use strictrecord::{Record, TypeRegistry, Value};
    ///
    /// let mut registry = TypeRegistry::new();
    /// registry
    ///     .load_schema_json(r#"{"name": "Line", "fields": [{"name": "qty", "type": "int"}]}"#)
    ///     .unwrap();
    /// let order = registry
    ///     .load_schema_json(r#"{"name": "Order", "fields": [{"name": "lines", "type": "list[Line]"}]}"#)
    ///     .unwrap();
    ///
    /// let lines = Value::List(vec![Value::map([("qty", Value::from("3"))])]);
    /// let o = Record::new(&order, [lines]).unwrap();
    /// assert_eq!(o.to_string(), "Order(lines=[Line(qty=3)])");
    /// ```
    pub fn load_schema_json(&mut self, text: &str) -> Result<Arc<RecordSchema>, SchemaError> {
        let doc: SchemaDocument =
            serde_json::from_str(text).map_err(|e| SchemaError::Document {
                message: e.to_string(),
            })?;
        self.load_schema(&doc)
    }
}

/// Serialized form of a record schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Record name.
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<FieldDocument>,
}

/// Serialized form of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDocument {
    /// Field name.
    pub name: String,
    /// Declared type as text.
    #[serde(rename = "type")]
    pub ty: String,
    /// Default value; an explicit `null` is a `None` default, absence means required.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,
}

impl SchemaDocument {
    /// Describes an existing schema.
    #[must_use]
    pub fn from_schema(schema: &RecordSchema) -> Self {
        Self {
            name: schema.name().to_string(),
            fields: schema
                .fields()
                .iter()
                .map(|f| FieldDocument {
                    name: f.name.clone(),
                    ty: f.decl.to_string(),
                    default: f.default.clone(),
                })
                .collect(),
        }
    }
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConstructError;
    use crate::record::Record;

    #[derive(Debug)]
    struct Percent;

    impl Constructor for Percent {
        fn name(&self) -> &str {
            "Percent"
        }

        fn from_value(&self, value: &Value) -> Result<Value, ConstructError> {
            let text = value
                .as_str()
                .ok_or_else(|| ConstructError::mismatch("expected text"))?;
            let digits = text.trim().trim_end_matches('%');
            digits
                .parse::<f64>()
                .map(|p| Value::Float(p / 100.0))
                .map_err(|e| ConstructError::rejected(e.to_string()))
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = TypeRegistry::new();
        assert!(registry.is_empty());
        registry.register_constructor(Arc::new(Percent));
        assert!(registry.contains("Percent"));
        assert_eq!(
            registry.parse("Optional[Percent]").unwrap().to_string(),
            "Optional[Percent]"
        );
        assert_eq!(
            registry.parse("Unknown").unwrap(),
            TypeDecl::Opaque("Unknown".to_string())
        );
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = TypeRegistry::new();
        assert!(registry.register("Id", TypeDecl::Int).is_none());
        assert_eq!(registry.register("Id", TypeDecl::Str), Some(TypeDecl::Int));
        assert_eq!(registry.resolve("Id"), Some(&TypeDecl::Str));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_load_schema_document() {
        let mut registry = TypeRegistry::new();
        registry.register_constructor(Arc::new(Percent));
        let schema = registry
            .load_schema_json(
                r#"{
                    "name": "Discount",
                    "fields": [
                        {"name": "code", "type": "str"},
                        {"name": "rate", "type": "Percent"},
                        {"name": "note", "type": "Optional[str]", "default": null}
                    ]
                }"#,
            )
            .unwrap();

        assert_eq!(schema.all_fields(), ["code", "rate", "note"]);
        assert_eq!(schema.field("note").unwrap().default, Some(Value::Null));
        assert!(registry.contains("Discount"));

        let d = Record::new(&schema, ["SPRING".into(), "15%".into()]).unwrap();
        assert_eq!(d.get("rate").unwrap(), &Value::Float(0.15));
        assert_eq!(d.get("note").unwrap(), &Value::Null);
    }

    #[test]
    fn test_document_round_trip() {
        let mut registry = TypeRegistry::new();
        let schema = registry
            .load_schema_json(
                r#"{"name": "Tag", "fields": [{"name": "labels", "type": "set[str]"}]}"#,
            )
            .unwrap();
        let doc = SchemaDocument::from_schema(&schema);
        let text = serde_json::to_string(&doc).unwrap();
        assert_eq!(
            text,
            r#"{"name":"Tag","fields":[{"name":"labels","type":"set[str]"}]}"#
        );
    }

    #[test]
    fn test_deeply_nested_field_type_is_rejected() {
        let ty = format!("{}int{}", "list[".repeat(20_000), "]".repeat(20_000));
        let doc = serde_json::json!({"name": "Deep", "fields": [{"name": "a", "type": ty}]});
        let mut registry = TypeRegistry::new();
        let err = registry.load_schema_json(&doc.to_string()).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::InvalidDecl { ref reason, .. } if reason == "declaration nested too deeply"
        ));
        assert!(!registry.contains("Deep"));
    }

    #[test]
    fn test_bad_documents() {
        let mut registry = TypeRegistry::new();
        assert!(matches!(
            registry.load_schema_json("{\"name\": \"X\"}"),
            Err(SchemaError::Document { .. })
        ));
        assert!(matches!(
            registry.load_schema_json(
                r#"{"name": "X", "fields": [{"name": "a", "type": "list[int"}]}"#
            ),
            Err(SchemaError::InvalidDecl { .. })
        ));
        assert!(matches!(
            registry.load_schema_json(
                r#"{"name": "X", "fields": [{"name": "a", "type": "int"}, {"name": "a", "type": "str"}]}"#
            ),
            Err(SchemaError::DuplicateField { .. })
        ));
        assert!(!registry.contains("X"));
    }
}
