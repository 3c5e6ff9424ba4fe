//! Error types for strictrecord.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! the exact failure: a value that cannot be coerced, a record accessed in
//! an unsupported way, arguments that do not bind to a schema, or a schema
//! that is itself malformed.

use thiserror::Error;

use crate::decl::TypeDecl;
use crate::value::Value;

/// Raised when no coercion path turns a value into its declared type.
///
/// # Examples
///
/// ```
/// use strictrecord::{coerce, TypeDecl, Value};
///
/// let err = coerce(Value::from("abc"), &TypeDecl::Int).unwrap_err();
/// assert_eq!(err.value_type, "str");
/// assert!(err.to_string().contains("not castable to `int`"));
/// ```
#[derive(Debug, Clone, Error)]
#[error("`{value}` of type `{value_type}` is not castable to `{target}`")]
pub struct CoercionError {
    /// The offending value.
    pub value: Value,
    /// Runtime type name of the offending value.
    pub value_type: &'static str,
    /// The declaration the value was coerced against.
    pub target: TypeDecl,
    /// Detail from the step that rejected the value, when there is one.
    pub reason: Option<String>,
}

impl CoercionError {
    /// Creates a coercion error for `value` against `target`.
    #[must_use]
    pub fn new(value: Value, target: &TypeDecl) -> Self {
        Self {
            value_type: value.type_name(),
            value,
            target: target.clone(),
            reason: None,
        }
    }

    /// Attaches a reason to this error.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Outcome of one failed construction strategy.
///
/// A mismatch lets the engine fall through to the next strategy; a
/// rejection ends the attempt with a coercion error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructError {
    #[error("argument shape mismatch: {0}")]
    Mismatch(String),

    #[error("value rejected: {0}")]
    Rejected(String),
}

impl ConstructError {
    /// Creates a mismatch (try the next strategy).
    #[must_use]
    pub fn mismatch(reason: impl Into<String>) -> Self {
        Self::Mismatch(reason.into())
    }

    /// Creates a rejection (stop trying).
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }
}

/// Errors raised by indexed access on a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("Accessing `{record}` fields by `{key_type}` is not supported")]
    UnsupportedKey {
        record: String,
        key_type: &'static str,
    },

    #[error("`{record}` has no field named '{name}'")]
    UnknownField {
        record: String,
        name: String,
    },

    #[error("Field index {index} is out of range for `{record}` ({len} fields)")]
    IndexOutOfRange {
        record: String,
        index: isize,
        len: usize,
    },

    #[error("Deleting fields of `{record}` is not supported")]
    DeleteUnsupported {
        record: String,
    },
}

impl AccessError {
    /// Returns true for the unsupported-operation kinds (bad key kind, delete).
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedKey { .. } | Self::DeleteUnsupported { .. }
        )
    }
}

/// Errors raised while constructing a record instance.
#[derive(Debug, Clone, Error)]
pub enum ConstructionError {
    #[error("`{record}` is missing required argument '{field}'")]
    MissingArgument {
        record: String,
        field: String,
    },

    #[error("`{record}` got an unexpected keyword argument '{name}'")]
    UnexpectedKeyword {
        record: String,
        name: String,
    },

    #[error("`{record}` takes {expected} positional arguments but {actual} were given")]
    TooManyPositional {
        record: String,
        expected: usize,
        actual: usize,
    },

    #[error("`{record}` got multiple values for argument '{field}'")]
    DuplicateArgument {
        record: String,
        field: String,
    },

    #[error("`{record}` field '{field}': {source}")]
    FieldCoercion {
        record: String,
        field: String,
        #[source]
        source: CoercionError,
    },

    #[error("Malformed record input: {message}")]
    Malformed {
        message: String,
    },
}

impl ConstructionError {
    /// Returns the coercion error behind a field failure, if that is what this is.
    #[must_use]
    pub const fn coercion(&self) -> Option<&CoercionError> {
        match self {
            Self::FieldCoercion { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Returns true if the arguments did not bind to the schema's fields.
    #[must_use]
    pub const fn is_arity(&self) -> bool {
        matches!(
            self,
            Self::MissingArgument { .. }
                | Self::UnexpectedKeyword { .. }
                | Self::TooManyPositional { .. }
                | Self::DuplicateArgument { .. }
        )
    }
}

/// Errors raised while defining a record schema or parsing a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Record name cannot be empty")]
    EmptyName,

    #[error("Field name cannot be empty in `{record}`")]
    EmptyFieldName {
        record: String,
    },

    #[error("Field '{field}' is declared twice in `{record}`")]
    DuplicateField {
        record: String,
        field: String,
    },

    #[error("Field '{field}' without a default follows a defaulted field in `{record}`")]
    DefaultOrder {
        record: String,
        field: String,
    },

    #[error("Invalid type declaration '{input}' at offset {offset}: {reason}")]
    InvalidDecl {
        input: String,
        offset: usize,
        reason: String,
    },

    #[error("Invalid schema document: {message}")]
    Document {
        message: String,
    },
}

/// Top-level error type for strictrecord.
#[derive(Debug, Clone, Error)]
pub enum StrictError {
    #[error("Coercion error: {0}")]
    Coercion(#[from] CoercionError),

    #[error("Access error: {0}")]
    Access(#[from] AccessError),

    #[error("Construction error: {0}")]
    Construction(#[from] ConstructionError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

impl StrictError {
    /// Returns true if this is a coercion error, directly or behind a field.
    #[must_use]
    pub const fn is_coercion(&self) -> bool {
        match self {
            Self::Coercion(_) => true,
            Self::Construction(e) => e.coercion().is_some(),
            _ => false,
        }
    }

    /// Returns true if this is an access error.
    #[must_use]
    pub const fn is_access(&self) -> bool {
        matches!(self, Self::Access(_))
    }

    /// Returns true if this is a construction error.
    #[must_use]
    pub const fn is_construction(&self) -> bool {
        matches!(self, Self::Construction(_))
    }

    /// Returns true if this is a schema error.
    #[must_use]
    pub const fn is_schema(&self) -> bool {
        matches!(self, Self::Schema(_))
    }

    /// Returns true for the unsupported-operation kinds.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        match self {
            Self::Access(e) => e.is_unsupported(),
            _ => false,
        }
    }
}

/// Result type alias for strictrecord operations.
pub type StrictResult<T> = Result<T, StrictError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coercion_error_message() {
        let err = CoercionError::new(Value::from("abc"), &TypeDecl::Int);
        let msg = format!("{err}");
        assert!(msg.contains("\"abc\""));
        assert!(msg.contains("`str`"));
        assert!(msg.contains("`int`"));
        assert!(err.reason.is_none());
    }

    #[test]
    fn test_coercion_error_reason() {
        let err = CoercionError::new(Value::Int(1), &TypeDecl::Date).with_reason("not a string");
        assert_eq!(err.reason.as_deref(), Some("not a string"));
        assert_eq!(err.value, Value::Int(1));
    }

    #[test]
    fn test_access_error_unsupported() {
        let err = AccessError::DeleteUnsupported {
            record: "Point".to_string(),
        };
        assert!(err.is_unsupported());
        assert!(format!("{err}").contains("Point"));

        let err = AccessError::UnknownField {
            record: "Point".to_string(),
            name: "z".to_string(),
        };
        assert!(!err.is_unsupported());
    }

    #[test]
    fn test_construction_error_coercion() {
        let inner = CoercionError::new(Value::from("x"), &TypeDecl::Float);
        let err = ConstructionError::FieldCoercion {
            record: "Point".to_string(),
            field: "x".to_string(),
            source: inner,
        };
        assert!(err.coercion().is_some());
        assert!(!err.is_arity());
        let msg = format!("{err}");
        assert!(msg.contains("field 'x'"));
        assert!(msg.contains("float"));
    }

    #[test]
    fn test_strict_error_from() {
        let err: StrictError = AccessError::DeleteUnsupported {
            record: "R".to_string(),
        }
        .into();
        assert!(err.is_access());
        assert!(err.is_unsupported());
        assert!(!err.is_coercion());

        let err: StrictError = ConstructionError::FieldCoercion {
            record: "R".to_string(),
            field: "a".to_string(),
            source: CoercionError::new(Value::Null, &TypeDecl::Int),
        }
        .into();
        assert!(err.is_construction());
        assert!(err.is_coercion());

        let err: StrictError = SchemaError::EmptyName.into();
        assert!(err.is_schema());
    }
}
