//! Constructor strategies.
//!
//! A constructible target exposes up to three strategies, tried in fixed
//! priority order by [`construct`]:
//!
//! 1. **keywords**: a map value supplies named arguments;
//! 2. **positional**: a sequence value supplies positional arguments;
//! 3. **single**: the value itself is the one argument.
//!
//! This lets nested records be rebuilt from plain maps or arrays without the
//! caller special-casing them.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::trace;

use crate::decl::TypeDecl;
use crate::error::{CoercionError, ConstructError};
use crate::record::{Record, RecordSchema};
use crate::value::Value;

/// A user-defined constructible type.
///
/// Every strategy defaults to a mismatch, so implementors only provide the
/// ones that make sense for their type.
///
/// # Examples
///
/// ```
/// use strictrecord::coerce::Constructor;
/// use strictrecord::{coerce, ConstructError, TypeDecl, Value};
///
/// /// Lower-cased e-mail addresses.
/// #[derive(Debug)]
/// struct Email;
///
/// impl Constructor for Email {
///     fn name(&self) -> &str {
///         "Email"
///     }
///
///     fn from_value(&self, value: &Value) -> Result<Value, ConstructError> {
///         match value.as_str() {
///             Some(s) if s.contains('@') => Ok(Value::from(s.to_lowercase())),
///             Some(_) => Err(ConstructError::rejected("missing '@'")),
///             None => Err(ConstructError::mismatch("expected a string")),
///         }
///     }
/// }
///
/// let decl = TypeDecl::custom(Email);
/// assert_eq!(coerce(Value::from("A@B.io"), &decl).unwrap(), Value::from("a@b.io"));
/// assert!(coerce(Value::from("nobody"), &decl).is_err());
/// ```
pub trait Constructor: fmt::Debug + Send + Sync {
    /// Type name used in messages and declarations.
    fn name(&self) -> &str;

    /// Whether `value` is already an instance of this type.
    fn admits(&self, value: &Value) -> bool {
        let _ = value;
        false
    }

    /// Builds from named arguments.
    fn from_keywords(&self, kwargs: &IndexMap<String, Value>) -> Result<Value, ConstructError> {
        let _ = kwargs;
        Err(ConstructError::mismatch("keyword arguments are not accepted"))
    }

    /// Builds from positional arguments.
    fn from_positional(&self, args: &[Value]) -> Result<Value, ConstructError> {
        let _ = args;
        Err(ConstructError::mismatch("positional arguments are not accepted"))
    }

    /// Builds from a single argument.
    fn from_value(&self, value: &Value) -> Result<Value, ConstructError> {
        let _ = value;
        Err(ConstructError::mismatch("single arguments are not accepted"))
    }
}

/// Construction strategies, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// A map value supplies named arguments.
    Keywords,
    /// A list, set, or tuple value supplies positional arguments.
    Positional,
    /// The value itself is the only argument.
    Single,
}

impl Tier {
    /// Priority order.
    pub const ORDER: [Self; 3] = [Self::Keywords, Self::Positional, Self::Single];

    /// Runs this tier, or returns `None` when the value has the wrong shape for it.
    fn attempt(
        self,
        ctor: &dyn Constructor,
        value: &Value,
    ) -> Option<Result<Value, ConstructError>> {
        match self {
            Self::Keywords => value.as_map().map(|kwargs| ctor.from_keywords(kwargs)),
            Self::Positional => value.as_sequence().map(|args| ctor.from_positional(args)),
            Self::Single => Some(ctor.from_value(value)),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keywords => write!(f, "keywords"),
            Self::Positional => write!(f, "positional"),
            Self::Single => write!(f, "single"),
        }
    }
}

/// Runs the strategy fallback for `ctor`.
///
/// The first strategy that succeeds wins. A mismatch moves on to the next
/// strategy; a rejection stops immediately.
pub fn construct(
    value: Value,
    ctor: &dyn Constructor,
    target: &TypeDecl,
) -> Result<Value, CoercionError> {
    let mut last = None;
    for tier in Tier::ORDER {
        match tier.attempt(ctor, &value) {
            None => {}
            Some(Ok(built)) => {
                trace!(target_type = %target, %tier, "constructed");
                return Ok(built);
            }
            Some(Err(ConstructError::Rejected(reason))) => {
                trace!(target_type = %target, %tier, %reason, "constructor rejected value");
                return Err(CoercionError::new(value, target).with_reason(reason));
            }
            Some(Err(ConstructError::Mismatch(reason))) => {
                trace!(target_type = %target, %tier, %reason, "falling through");
                last = Some(reason);
            }
        }
    }
    let err = CoercionError::new(value, target);
    Err(match last {
        Some(reason) => err.with_reason(reason),
        None => err,
    })
}

/// Applies `single` to the only positional argument; no arguments give `empty`.
fn one_positional(
    args: &[Value],
    name: &str,
    empty: Value,
    single: impl FnOnce(&Value) -> Result<Value, ConstructError>,
) -> Result<Value, ConstructError> {
    match args {
        [] => Ok(empty),
        [arg] => single(arg),
        _ => Err(ConstructError::mismatch(format!(
            "{name}() takes at most 1 argument ({} given)",
            args.len()
        ))),
    }
}

/// No named arguments give `empty`; any name is unexpected.
fn no_keywords(
    kwargs: &IndexMap<String, Value>,
    name: &str,
    empty: Value,
) -> Result<Value, ConstructError> {
    match kwargs.keys().next() {
        None => Ok(empty),
        Some(key) => Err(ConstructError::mismatch(format!(
            "'{key}' is an invalid keyword argument for {name}()"
        ))),
    }
}

#[derive(Debug)]
pub(crate) struct IntConstructor;

impl Constructor for IntConstructor {
    fn name(&self) -> &str {
        "int"
    }

    fn admits(&self, value: &Value) -> bool {
        value.is_int()
    }

    fn from_keywords(&self, kwargs: &IndexMap<String, Value>) -> Result<Value, ConstructError> {
        no_keywords(kwargs, self.name(), Value::Int(0))
    }

    fn from_positional(&self, args: &[Value]) -> Result<Value, ConstructError> {
        one_positional(args, self.name(), Value::Int(0), |arg| self.from_value(arg))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn from_value(&self, value: &Value) -> Result<Value, ConstructError> {
        match value {
            Value::Int(v) => Ok(Value::Int(*v)),
            Value::Bool(v) => Ok(Value::Int(i64::from(*v))),
            Value::Float(v) if !v.is_finite() => Err(ConstructError::rejected(format!(
                "cannot convert float {v} to integer"
            ))),
            Value::Float(v) => {
                let truncated = v.trunc();
                if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
                    return Err(ConstructError::rejected(format!(
                        "float {v} is out of integer range"
                    )));
                }
                Ok(Value::Int(truncated as i64))
            }
            Value::String(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                ConstructError::rejected(format!("invalid literal for int(): {s:?}"))
            }),
            other => Err(ConstructError::mismatch(format!(
                "int() argument must be a string or a number, not '{}'",
                other.type_name()
            ))),
        }
    }
}

#[derive(Debug)]
pub(crate) struct FloatConstructor;

impl Constructor for FloatConstructor {
    fn name(&self) -> &str {
        "float"
    }

    fn admits(&self, value: &Value) -> bool {
        value.is_float()
    }

    fn from_keywords(&self, kwargs: &IndexMap<String, Value>) -> Result<Value, ConstructError> {
        no_keywords(kwargs, self.name(), Value::Float(0.0))
    }

    fn from_positional(&self, args: &[Value]) -> Result<Value, ConstructError> {
        one_positional(args, self.name(), Value::Float(0.0), |arg| {
            self.from_value(arg)
        })
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_value(&self, value: &Value) -> Result<Value, ConstructError> {
        match value {
            Value::Float(v) => Ok(Value::Float(*v)),
            Value::Int(v) => Ok(Value::Float(*v as f64)),
            Value::Bool(v) => Ok(Value::Float(if *v { 1.0 } else { 0.0 })),
            Value::String(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
                ConstructError::rejected(format!("could not convert string to float: {s:?}"))
            }),
            other => Err(ConstructError::mismatch(format!(
                "float() argument must be a string or a number, not '{}'",
                other.type_name()
            ))),
        }
    }
}

#[derive(Debug)]
pub(crate) struct StrConstructor;

impl Constructor for StrConstructor {
    fn name(&self) -> &str {
        "str"
    }

    fn admits(&self, value: &Value) -> bool {
        value.is_string()
    }

    fn from_keywords(&self, kwargs: &IndexMap<String, Value>) -> Result<Value, ConstructError> {
        no_keywords(kwargs, self.name(), Value::from(""))
    }

    fn from_positional(&self, args: &[Value]) -> Result<Value, ConstructError> {
        one_positional(args, self.name(), Value::from(""), |arg| self.from_value(arg))
    }

    fn from_value(&self, value: &Value) -> Result<Value, ConstructError> {
        Ok(match value {
            Value::String(s) => Value::String(s.clone()),
            other => Value::String(other.to_string()),
        })
    }
}

/// Builds instances of a record schema.
#[derive(Debug)]
pub(crate) struct RecordConstructor<'a>(pub(crate) &'a Arc<RecordSchema>);

impl Constructor for RecordConstructor<'_> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn admits(&self, value: &Value) -> bool {
        value
            .as_record()
            .is_some_and(|record| **record.schema() == **self.0)
    }

    fn from_keywords(&self, kwargs: &IndexMap<String, Value>) -> Result<Value, ConstructError> {
        Record::from_named(self.0, kwargs.clone())
            .map(Value::Record)
            .map_err(|e| ConstructError::mismatch(e.to_string()))
    }

    fn from_positional(&self, args: &[Value]) -> Result<Value, ConstructError> {
        Record::new(self.0, args.to_vec())
            .map(Value::Record)
            .map_err(|e| ConstructError::mismatch(e.to_string()))
    }

    fn from_value(&self, value: &Value) -> Result<Value, ConstructError> {
        Record::new(self.0, [value.clone()])
            .map(Value::Record)
            .map_err(|e| ConstructError::mismatch(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Fussy;

    impl Constructor for Fussy {
        fn name(&self) -> &str {
            "Fussy"
        }

        fn from_positional(&self, args: &[Value]) -> Result<Value, ConstructError> {
            if args.len() == 2 {
                Ok(Value::Tuple(args.to_vec()))
            } else {
                Err(ConstructError::rejected("needs a pair"))
            }
        }

        fn from_value(&self, value: &Value) -> Result<Value, ConstructError> {
            Ok(value.clone())
        }
    }

    #[test]
    fn test_int_from_value() {
        let ctor = IntConstructor;
        assert_eq!(ctor.from_value(&Value::from(" 42 ")), Ok(Value::Int(42)));
        assert_eq!(ctor.from_value(&Value::Float(-3.9)), Ok(Value::Int(-3)));
        assert_eq!(ctor.from_value(&Value::Bool(true)), Ok(Value::Int(1)));
        assert!(matches!(
            ctor.from_value(&Value::from("4.5")),
            Err(ConstructError::Rejected(_))
        ));
        assert!(matches!(
            ctor.from_value(&Value::Float(f64::NAN)),
            Err(ConstructError::Rejected(_))
        ));
        assert!(matches!(
            ctor.from_value(&Value::List(vec![])),
            Err(ConstructError::Mismatch(_))
        ));
    }

    #[test]
    fn test_empty_arguments_give_zero_values() {
        let empty = IndexMap::new();
        assert_eq!(IntConstructor.from_keywords(&empty), Ok(Value::Int(0)));
        assert_eq!(FloatConstructor.from_positional(&[]), Ok(Value::Float(0.0)));
        assert_eq!(StrConstructor.from_positional(&[]), Ok(Value::from("")));
    }

    #[test]
    fn test_float_and_str_from_value() {
        assert_eq!(
            FloatConstructor.from_value(&Value::from("1e3")),
            Ok(Value::Float(1000.0))
        );
        assert_eq!(FloatConstructor.from_value(&Value::Int(2)), Ok(Value::Float(2.0)));
        assert_eq!(
            StrConstructor.from_value(&Value::List(vec![Value::Int(1), Value::from("a")])),
            Ok(Value::from("[1, \"a\"]"))
        );
        assert_eq!(StrConstructor.from_value(&Value::Float(2.0)), Ok(Value::from("2.0")));
    }

    #[test]
    fn test_construct_positional_tier_unpacks_single_element() {
        let out = construct(
            Value::List(vec![Value::from("7")]),
            &IntConstructor,
            &TypeDecl::Int,
        )
        .unwrap();
        assert_eq!(out, Value::Int(7));
    }

    #[test]
    fn test_construct_falls_through_mismatch() {
        let out = construct(
            Value::List(vec![Value::from("1"), Value::from("2")]),
            &IntConstructor,
            &TypeDecl::Int,
        );
        let err = out.unwrap_err();
        assert!(err.reason.unwrap().contains("int()"));
    }

    #[test]
    fn test_construct_rejection_stops_fallback() {
        let decl = TypeDecl::custom(Fussy);
        // The single tier would accept anything, but the positional
        // rejection comes first.
        let err = construct(Value::List(vec![Value::Int(1)]), &Fussy, &decl).unwrap_err();
        assert_eq!(err.reason.as_deref(), Some("needs a pair"));

        let ok = construct(Value::from("x"), &Fussy, &decl).unwrap();
        assert_eq!(ok, Value::from("x"));
    }

    #[test]
    fn test_tier_order() {
        assert_eq!(
            Tier::ORDER,
            [Tier::Keywords, Tier::Positional, Tier::Single]
        );
        assert_eq!(Tier::Positional.to_string(), "positional");
    }
}
