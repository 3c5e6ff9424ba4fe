//! The coercion engine.
//!
//! [`coerce`] maps a runtime [`Value`] and a [`TypeDecl`] to a value that
//! the declaration admits, or fails with a [`CoercionError`]. It is pure:
//! no shared state, no I/O, and the only allocation is the result.
//!
//! Dispatch order:
//! 1. the no-value sentinel is accepted only by a single-level optional;
//! 2. values the declaration already admits pass through unchanged;
//! 3. parameterized declarations recurse (unions try members in order,
//!    containers coerce each element);
//! 4. concrete declarations parse (calendar types), interpret (booleans),
//!    or construct through the three-strategy fallback.

mod boolean;
mod construct;
mod temporal;

use indexmap::IndexMap;
use tracing::trace;

use crate::decl::TypeDecl;
use crate::error::CoercionError;
use crate::value::Value;

pub use boolean::{interpret_bool, TRUE_TOKENS};
pub use construct::{construct, Constructor, Tier};
pub use temporal::{parse_date, parse_datetime, TemporalError};

use construct::{FloatConstructor, IntConstructor, RecordConstructor, StrConstructor};

/// Coerces `value` to satisfy `decl`.
///
/// # Examples
///
/// ```
/// use strictrecord::{coerce, TypeDecl, Value};
///
/// let decl = TypeDecl::list(TypeDecl::Int);
/// let out = coerce(Value::List(vec!["1".into(), "2".into()]), &decl).unwrap();
/// assert_eq!(out, Value::List(vec![Value::Int(1), Value::Int(2)]));
///
/// assert_eq!(coerce(Value::Null, &TypeDecl::optional(TypeDecl::Int)).unwrap(), Value::Null);
/// assert!(coerce(Value::Null, &TypeDecl::Int).is_err());
/// ```
pub fn coerce(value: Value, decl: &TypeDecl) -> Result<Value, CoercionError> {
    if value.is_null() {
        return match decl {
            TypeDecl::Optional(inner) if !matches!(**inner, TypeDecl::Optional(_)) => {
                Ok(Value::Null)
            }
            TypeDecl::Optional(_) => Err(CoercionError::new(value, decl)
                .with_reason("nested optional declarations do not accept the no-value sentinel")),
            _ => Err(CoercionError::new(value, decl)
                .with_reason("declaration does not accept the no-value sentinel")),
        };
    }
    if decl.admits(&value) {
        return Ok(value);
    }

    match decl {
        TypeDecl::Optional(inner) => coerce_members(value, std::slice::from_ref(&**inner), decl),
        TypeDecl::Union(members) => coerce_members(value, members, decl),
        TypeDecl::List(elem) => match into_sequence(value) {
            Ok(items) => coerce_each(items, elem).map(Value::List),
            Err(value) => Err(CoercionError::new(value, decl).with_reason("expected a sequence")),
        },
        TypeDecl::Set(elem) => match into_sequence(value) {
            Ok(items) => coerce_each(items, elem).map(Value::set),
            Err(value) => Err(CoercionError::new(value, decl).with_reason("expected a sequence")),
        },
        TypeDecl::Tuple(elems) => coerce_tuple(value, elems, decl),
        TypeDecl::Map(elem) => match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(key, v)| coerce(v, elem).map(|v| (key, v)))
                .collect::<Result<IndexMap<_, _>, _>>()
                .map(Value::Map),
            other => Err(CoercionError::new(other, decl).with_reason("expected a mapping")),
        },
        TypeDecl::Generic { .. } => Err(CoercionError::new(value, decl)
            .with_reason("unsupported parameterized declaration")),
        TypeDecl::Any => Ok(value),
        TypeDecl::Bool => Ok(Value::Bool(interpret_bool(&value))),
        TypeDecl::Date => temporal::coerce_date(value, decl),
        TypeDecl::DateTime => temporal::coerce_datetime(value, decl),
        TypeDecl::Int => construct(value, &IntConstructor, decl),
        TypeDecl::Float => construct(value, &FloatConstructor, decl),
        TypeDecl::Str => construct(value, &StrConstructor, decl),
        TypeDecl::Record(schema) => construct(value, &RecordConstructor(schema), decl),
        TypeDecl::Custom(ctor) => construct(value, ctor.as_ref(), decl),
        TypeDecl::Opaque(_) => {
            Err(CoercionError::new(value, decl).with_reason("declared type is not constructible"))
        }
    }
}

/// Coerces `value` against candidate declarations, left to right.
///
/// Each candidate gets full [`coerce`] semantics; the first success wins.
/// A candidate list is not an optional declaration, so the no-value
/// sentinel is rejected before any candidate is tried.
///
/// # Examples
///
/// ```
/// use strictrecord::{coerce, coerce_any, TypeDecl, Value};
///
/// // Candidates are tried in order, so `int` constructs first...
/// let out = coerce_any(Value::from("5"), &[TypeDecl::Int, TypeDecl::Str]).unwrap();
/// assert_eq!(out, Value::Int(5));
///
/// // ...while a union admits the string as is.
/// let union = TypeDecl::union([TypeDecl::Int, TypeDecl::Str]);
/// assert_eq!(coerce(Value::from("5"), &union).unwrap(), Value::from("5"));
/// ```
pub fn coerce_any(value: Value, candidates: &[TypeDecl]) -> Result<Value, CoercionError> {
    let target = TypeDecl::Union(candidates.to_vec());
    if value.is_null() {
        return Err(CoercionError::new(value, &target)
            .with_reason("candidate types do not accept the no-value sentinel"));
    }
    coerce_members(value, candidates, &target)
}

fn coerce_members(
    value: Value,
    members: &[TypeDecl],
    target: &TypeDecl,
) -> Result<Value, CoercionError> {
    for member in members {
        match coerce(value.clone(), member) {
            Ok(out) => return Ok(out),
            Err(err) => {
                trace!(candidate = %member, error = %err, "union candidate failed");
            }
        }
    }
    Err(CoercionError::new(value, target).with_reason("no candidate type accepted the value"))
}

/// Unwraps a list, set, or tuple; hands anything else back.
fn into_sequence(value: Value) -> Result<Vec<Value>, Value> {
    match value {
        Value::List(items) | Value::Set(items) | Value::Tuple(items) => Ok(items),
        other => Err(other),
    }
}

fn coerce_each(items: Vec<Value>, elem: &TypeDecl) -> Result<Vec<Value>, CoercionError> {
    items.into_iter().map(|item| coerce(item, elem)).collect()
}

fn coerce_tuple(
    value: Value,
    elems: &[TypeDecl],
    decl: &TypeDecl,
) -> Result<Value, CoercionError> {
    let arity = value.as_sequence().map(<[Value]>::len);
    match arity {
        Some(len) if len == elems.len() => {}
        Some(len) => {
            return Err(CoercionError::new(value, decl).with_reason(format!(
                "expected {} elements, found {len}",
                elems.len()
            )))
        }
        None => return Err(CoercionError::new(value, decl).with_reason("expected a sequence")),
    }
    let items = into_sequence(value).unwrap_or_default();
    items
        .into_iter()
        .zip(elems)
        .map(|(item, elem)| coerce(item, elem))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Tuple)
}
