//! # StrictRecord - Type-Enforced Data Records
//!
//! StrictRecord wraps plain data records so that every field is converted
//! to its declared type when a record is constructed. Values arriving from
//! JSON, CSV, or form input as strings, numbers, lists, and maps are
//! coerced recursively: containers element by element, unions member by
//! member, and nested records rebuilt from maps or arrays.
//!
//! ## Core Concepts
//!
//! - **Value**: The dynamically typed value held in record fields
//! - **TypeDecl**: A declared field type, built in code or parsed from text
//! - **Coercion**: The recursive engine converting a value to a declared type
//! - **Record**: A schema-bound instance with ordinal and named field access
//! - **TypeRegistry**: Named record and custom types for text declarations
//!
//! ## Usage
//!
//! ```rust
//! use strictrecord::{Record, RecordSchema, TypeDecl, Value};
//!
//! let schema = RecordSchema::builder("Shipment")
//!     .field("id", TypeDecl::Int)
//!     .field("fragile", TypeDecl::Bool)
//!     .field("shipped", TypeDecl::optional(TypeDecl::Date))
//!     .field("tags", TypeDecl::list(TypeDecl::Str))
//!     .build()?;
//!
//! let s = Record::from_named(
//!     &schema,
//!     [
//!         ("id", Value::from("42")),
//!         ("fragile", Value::from("t")),
//!         ("shipped", Value::from("12 Mar 2024")),
//!         ("tags", Value::List(vec![Value::Int(1), Value::from("urgent")])),
//!     ],
//! )?;
//!
//! assert_eq!(s.get("id")?, &Value::Int(42));
//! assert_eq!(s.get(1)?, &Value::Bool(true));
//! assert_eq!(s.get("tags")?.to_string(), r#"["1", "urgent"]"#);
//! # Ok::<(), strictrecord::StrictError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod coerce;
pub mod decl;
pub mod error;
pub mod record;
pub mod registry;
pub mod value;

// Re-export primary types at crate root for convenience
pub use coerce::{coerce, coerce_any};
pub use decl::TypeDecl;
pub use error::{
    AccessError, CoercionError, ConstructError, ConstructionError, SchemaError, StrictError,
    StrictResult,
};
pub use record::{FieldDecl, FieldKey, Record, RecordSchema};
pub use registry::{SchemaDocument, TypeRegistry};
pub use value::Value;
