//! Dynamic runtime values.
//!
//! A [`Value`] is what record fields hold and what the coercion engine
//! consumes and produces. It covers scalars, calendar values, the usual
//! container shapes, and nested record instances.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::record::Record;

/// A dynamically typed value.
///
/// `Null` is the no-value sentinel: it stands for an absent value and is
/// distinct from an empty string or an empty container.
///
/// # Examples
///
/// ```
/// use strictrecord::Value;
///
/// let int_val = Value::Int(42);
/// let list_val = Value::List(vec![Value::from("a"), Value::from("b")]);
///
/// assert!(int_val.is_int());
/// assert_eq!(list_val.type_name(), "list");
/// assert_eq!(list_val.to_string(), "[\"a\", \"b\"]");
/// ```
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    List(Vec<Value>),
    /// Unique elements in first-insertion order. Build with [`Value::set`].
    Set(Vec<Value>),
    Tuple(Vec<Value>),
    Map(IndexMap<String, Value>),
    Record(Record),
}

impl Value {
    /// Builds a set value, dropping repeated elements.
    ///
    /// Sets of scalars deduplicate through a hash set in linear time. Sets
    /// holding containers or records fall back to pairwise comparison,
    /// which is quadratic in the number of elements.
    #[must_use]
    pub fn set(items: impl IntoIterator<Item = Self>) -> Self {
        let items: Vec<Self> = items.into_iter().collect();
        let keep: Option<Vec<bool>> = {
            let mut seen = HashSet::with_capacity(items.len());
            items
                .iter()
                .map(|item| ScalarKey::of(item).map(|key| seen.insert(key)))
                .collect()
        };
        if let Some(keep) = keep {
            return Self::Set(
                items
                    .into_iter()
                    .zip(keep)
                    .filter_map(|(item, first)| first.then_some(item))
                    .collect(),
            );
        }

        let mut unique: Vec<Self> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Self::Set(unique)
    }

    /// Builds a map value from key/value pairs.
    #[must_use]
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Self)>) -> Self {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    pub const fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float(_))
    }

    pub const fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    pub const fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    pub const fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }

    /// Returns true for the ordered or unordered sequence shapes.
    pub const fn is_sequence(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_) | Self::Tuple(_))
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the elements of a list, set, or tuple.
    pub fn as_sequence(&self) -> Option<&[Self]> {
        match self {
            Self::List(v) | Self::Set(v) | Self::Tuple(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_map(&self) -> Option<&IndexMap<String, Self>> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(v) => Some(v),
            _ => None,
        }
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "str",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Tuple(_) => "tuple",
            Self::Map(_) => "dict",
            Self::Record(_) => "record",
        }
    }

    /// Generic truthiness: zero, empty, and `Null` are false.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(v) => *v,
            Self::Int(v) => *v != 0,
            Self::Float(v) => *v != 0.0,
            Self::String(v) => !v.is_empty(),
            Self::List(v) | Self::Set(v) | Self::Tuple(v) => !v.is_empty(),
            Self::Map(v) => !v.is_empty(),
            Self::Date(_) | Self::DateTime(_) | Self::Record(_) => true,
        }
    }

    /// Returns a copy with every nested record replaced by its field map.
    #[must_use]
    pub fn to_plain(&self) -> Self {
        match self {
            Self::Record(r) => Self::Map(r.to_dict()),
            Self::List(items) => Self::List(items.iter().map(Self::to_plain).collect()),
            Self::Set(items) => Self::Set(items.iter().map(Self::to_plain).collect()),
            Self::Tuple(items) => Self::Tuple(items.iter().map(Self::to_plain).collect()),
            Self::Map(entries) => Self::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_plain()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Converts to a JSON value. Calendar values become ISO 8601 strings.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Self::Null => Json::Null,
            Self::Bool(v) => Json::Bool(*v),
            Self::Int(v) => Json::from(*v),
            Self::Float(v) => serde_json::Number::from_f64(*v).map_or(Json::Null, Json::Number),
            Self::String(v) => Json::String(v.clone()),
            Self::Date(v) => Json::String(v.to_string()),
            Self::DateTime(v) => Json::String(v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::List(items) | Self::Set(items) | Self::Tuple(items) => {
                Json::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::Record(r) => Json::Object(
                r.iter()
                    .map(|(name, v)| (name.to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => a == b,
            // Sets compare without regard to order.
            (Self::Set(a), Self::Set(b)) => a.len() == b.len() && set_contains_all(b, a),
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => a == b,
            _ => false,
        }
    }
}

/// Hashable view of a scalar value, equal exactly when the values are equal.
#[derive(Debug, PartialEq, Eq, Hash)]
enum ScalarKey<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(&'a str),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl<'a> ScalarKey<'a> {
    /// `None` for containers, records, and NaN (which equals nothing).
    fn of(value: &'a Value) -> Option<Self> {
        Some(match value {
            Value::Null => Self::Null,
            Value::Bool(v) => Self::Bool(*v),
            Value::Int(v) => Self::Int(*v),
            Value::Float(v) if v.is_nan() => return None,
            // -0.0 == 0.0
            Value::Float(v) if *v == 0.0 => Self::Float(0.0f64.to_bits()),
            Value::Float(v) => Self::Float(v.to_bits()),
            Value::String(v) => Self::Str(v),
            Value::Date(v) => Self::Date(*v),
            Value::DateTime(v) => Self::DateTime(*v),
            Value::List(_)
            | Value::Set(_)
            | Value::Tuple(_)
            | Value::Map(_)
            | Value::Record(_) => return None,
        })
    }
}

/// Whether every element of `needles` appears in `haystack`.
fn set_contains_all(haystack: &[Value], needles: &[Value]) -> bool {
    let keys: Option<HashSet<ScalarKey<'_>>> = haystack.iter().map(ScalarKey::of).collect();
    match keys {
        Some(keys) => needles
            .iter()
            .all(|item| ScalarKey::of(item).is_some_and(|key| keys.contains(&key))),
        None => needles.iter().all(|item| haystack.contains(item)),
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Date(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{}", v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::List(items) => {
                f.write_str("[")?;
                write_items(f, items)?;
                f.write_str("]")
            }
            Self::Set(items) if items.is_empty() => f.write_str("set()"),
            Self::Set(items) => {
                f.write_str("{")?;
                write_items(f, items)?;
                f.write_str("}")
            }
            Self::Tuple(items) => {
                f.write_str("(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                f.write_str("}")
            }
            Self::Record(r) => write!(f, "{r}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::String(v) => serializer.serialize_str(v),
            Self::Date(v) => serializer.collect_str(v),
            Self::DateTime(v) => {
                serializer.serialize_str(&v.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Self::List(items) | Self::Set(items) | Self::Tuple(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Self::Record(r) => r.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

// Convenient From implementations
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(v: IndexMap<String, Value>) -> Self {
        Self::Map(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Self::Record(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match v {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            Json::String(s) => Self::String(s),
            Json::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Json::Object(entries) => {
                Self::Map(entries.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_int() {
        let val = Value::Int(42);
        assert!(val.is_int());
        assert_eq!(val.as_int(), Some(42));
        assert_eq!(val.as_float(), Some(42.0)); // Int can be read as float
        assert_eq!(val.type_name(), "int");
    }

    #[test]
    fn test_value_null_is_default() {
        let val = Value::default();
        assert!(val.is_null());
        assert_eq!(val.type_name(), "NoneType");
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3)), Value::Int(3));
    }

    #[test]
    fn test_value_set_dedups_and_ignores_order() {
        let a = Value::set([Value::Int(1), Value::Int(2), Value::Int(1)]);
        assert_eq!(a.as_sequence().map(<[Value]>::len), Some(2));

        let b = Value::set([Value::Int(2), Value::Int(1)]);
        assert_eq!(a, b);
        assert_ne!(
            Value::List(vec![Value::Int(1), Value::Int(2)]),
            Value::List(vec![Value::Int(2), Value::Int(1)])
        );
    }

    #[test]
    fn test_value_set_large_and_mixed() {
        let big = Value::set((0..20_000).map(|i| Value::Int(i % 5_000)));
        assert_eq!(big.as_sequence().map(<[Value]>::len), Some(5_000));
        let reversed = Value::set((0..5_000).rev().map(Value::Int));
        assert_eq!(big, reversed);

        let floats = Value::set([Value::Float(0.0), Value::Float(-0.0), Value::Int(0)]);
        assert_eq!(floats.as_sequence().map(<[Value]>::len), Some(2));

        let nested = Value::set([
            Value::List(vec![Value::Int(1)]),
            Value::from("a"),
            Value::List(vec![Value::Int(1)]),
        ]);
        assert_eq!(nested.as_sequence().map(<[Value]>::len), Some(2));
        assert_eq!(
            nested,
            Value::set([Value::from("a"), Value::List(vec![Value::Int(1)])])
        );
        assert_ne!(nested, Value::set([Value::from("a"), Value::from("b")]));
    }

    #[test]
    fn test_value_kinds_do_not_mix() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Int(1), Value::Bool(true));
        assert_ne!(
            Value::List(vec![Value::Int(1)]),
            Value::Tuple(vec![Value::Int(1)])
        );
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Null.to_string(), "None");
        assert_eq!(Value::Float(5.0).to_string(), "5.0");
        assert_eq!(Value::from("hi").to_string(), "\"hi\"");
        assert_eq!(Value::Tuple(vec![Value::Int(1)]).to_string(), "(1,)");
        assert_eq!(Value::set([]).to_string(), "set()");
        assert_eq!(
            Value::map([("a", Value::Int(1))]).to_string(),
            "{\"a\": 1}"
        );
    }

    #[test]
    fn test_value_truthiness() {
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Float(0.5).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).is_truthy());
    }

    #[test]
    fn test_value_from_json() {
        let json = serde_json::json!({"a": 1, "b": [true, 2.5, null], "c": "x"});
        let val = Value::from(json);
        let map = val.as_map().unwrap();
        assert_eq!(map["a"], Value::Int(1));
        assert_eq!(
            map["b"],
            Value::List(vec![Value::Bool(true), Value::Float(2.5), Value::Null])
        );
        assert_eq!(map["c"], Value::from("x"));
    }

    #[test]
    fn test_value_to_json_dates() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(Value::Date(d).to_json(), serde_json::json!("2024-03-09"));
        let dt = d.and_hms_opt(10, 0, 0).unwrap().and_utc();
        assert_eq!(
            Value::DateTime(dt).to_json(),
            serde_json::json!("2024-03-09T10:00:00Z")
        );
    }

    #[test]
    fn test_value_serialization() {
        let val = Value::map([("k", Value::List(vec![Value::Int(1), Value::from("v")]))]);
        let json = serde_json::to_string(&val).unwrap();
        assert_eq!(json, r#"{"k":[1,"v"]}"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(val, back);
    }
}
