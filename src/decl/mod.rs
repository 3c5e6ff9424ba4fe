//! Declared field types.
//!
//! A [`TypeDecl`] is the explicit descriptor that stands in for a field's
//! type annotation. It can be assembled programmatically or parsed from
//! annotation text such as `list[int]` or `Optional[date]`.

mod parse;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::coerce::Constructor;
use crate::error::SchemaError;
use crate::record::RecordSchema;
use crate::value::Value;

pub(crate) use parse::Parser;

/// A declared type.
///
/// # Examples
///
/// ```
/// use strictrecord::TypeDecl;
///
/// let decl: TypeDecl = "dict[str, list[int]]".parse().unwrap();
/// assert_eq!(decl, TypeDecl::map(TypeDecl::list(TypeDecl::Int)));
/// assert_eq!(decl.to_string(), "dict[str, list[int]]");
///
/// let maybe: TypeDecl = "int | None".parse().unwrap();
/// assert_eq!(maybe, TypeDecl::optional(TypeDecl::Int));
/// ```
#[derive(Debug, Clone)]
pub enum TypeDecl {
    /// Unconstrained: accepts any present value as is.
    Any,
    Bool,
    Int,
    Float,
    Str,
    Date,
    DateTime,
    /// `T` or the no-value sentinel.
    Optional(Box<TypeDecl>),
    /// Members tried in declared order.
    Union(Vec<TypeDecl>),
    List(Box<TypeDecl>),
    Set(Box<TypeDecl>),
    /// Fixed arity, one declared type per position.
    Tuple(Vec<TypeDecl>),
    /// String keys, declared value type.
    Map(Box<TypeDecl>),
    /// A nested record shape.
    Record(Arc<RecordSchema>),
    /// A user-defined constructor.
    Custom(Arc<dyn Constructor>),
    /// A type known only by name. Never constructible.
    Opaque(String),
    /// A parameterized shape the engine has no coercion for.
    Generic {
        /// Generic name as written.
        name: String,
        /// Type arguments as written.
        args: Vec<TypeDecl>,
    },
}

impl TypeDecl {
    /// `Optional[inner]`.
    #[must_use]
    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// `Union[members...]`.
    #[must_use]
    pub fn union(members: impl IntoIterator<Item = Self>) -> Self {
        Self::Union(members.into_iter().collect())
    }

    /// `list[elem]`.
    #[must_use]
    pub fn list(elem: Self) -> Self {
        Self::List(Box::new(elem))
    }

    /// `set[elem]`.
    #[must_use]
    pub fn set(elem: Self) -> Self {
        Self::Set(Box::new(elem))
    }

    /// `tuple[elems...]`.
    #[must_use]
    pub fn tuple(elems: impl IntoIterator<Item = Self>) -> Self {
        Self::Tuple(elems.into_iter().collect())
    }

    /// `dict[str, value]`.
    #[must_use]
    pub fn map(value: Self) -> Self {
        Self::Map(Box::new(value))
    }

    /// A nested record type.
    #[must_use]
    pub fn record(schema: &Arc<RecordSchema>) -> Self {
        Self::Record(Arc::clone(schema))
    }

    /// A user-defined constructor type.
    #[must_use]
    pub fn custom(ctor: impl Constructor + 'static) -> Self {
        Self::Custom(Arc::new(ctor))
    }

    /// Parses annotation text, leaving unknown names opaque.
    ///
    /// Use [`TypeRegistry::parse`](crate::TypeRegistry::parse) to resolve
    /// record and constructor names.
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        Parser::new(text, None).parse()
    }

    /// Returns true for declarations that carry type arguments.
    #[must_use]
    pub const fn is_parameterized(&self) -> bool {
        matches!(
            self,
            Self::Optional(_)
                | Self::Union(_)
                | Self::List(_)
                | Self::Set(_)
                | Self::Tuple(_)
                | Self::Map(_)
                | Self::Generic { .. }
        )
    }

    /// Runtime membership: does `value` already satisfy this declaration?
    ///
    /// Containers are checked element by element. The no-value sentinel is
    /// only a member of optional declarations.
    #[must_use]
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Optional(inner), v) => v.is_null() || inner.admits(v),
            (_, Value::Null) => false,
            (Self::Any, _) => true,
            (Self::Union(members), v) => members.iter().any(|m| m.admits(v)),
            (Self::Bool, Value::Bool(_))
            | (Self::Int, Value::Int(_))
            | (Self::Float, Value::Float(_))
            | (Self::Str, Value::String(_))
            | (Self::Date, Value::Date(_))
            | (Self::DateTime, Value::DateTime(_)) => true,
            (Self::List(elem), Value::List(items)) | (Self::Set(elem), Value::Set(items)) => {
                items.iter().all(|item| elem.admits(item))
            }
            (Self::Tuple(elems), Value::Tuple(items)) => {
                elems.len() == items.len()
                    && elems.iter().zip(items).all(|(elem, item)| elem.admits(item))
            }
            (Self::Map(elem), Value::Map(entries)) => entries.values().all(|v| elem.admits(v)),
            (Self::Record(schema), Value::Record(record)) => {
                Arc::ptr_eq(schema, record.schema()) || **schema == **record.schema()
            }
            (Self::Custom(ctor), v) => ctor.admits(v),
            _ => false,
        }
    }
}

impl PartialEq for TypeDecl {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Any, Self::Any)
            | (Self::Bool, Self::Bool)
            | (Self::Int, Self::Int)
            | (Self::Float, Self::Float)
            | (Self::Str, Self::Str)
            | (Self::Date, Self::Date)
            | (Self::DateTime, Self::DateTime) => true,
            (Self::Optional(a), Self::Optional(b))
            | (Self::List(a), Self::List(b))
            | (Self::Set(a), Self::Set(b))
            | (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Union(a), Self::Union(b)) | (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => Arc::ptr_eq(a, b) || a == b,
            (Self::Custom(a), Self::Custom(b)) => a.name() == b.name(),
            (Self::Opaque(a), Self::Opaque(b)) => a == b,
            (
                Self::Generic { name: a, args: a_args },
                Self::Generic { name: b, args: b_args },
            ) => a == b && a_args == b_args,
            _ => false,
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[TypeDecl]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    Ok(())
}

impl fmt::Display for TypeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Str => f.write_str("str"),
            Self::Date => f.write_str("date"),
            Self::DateTime => f.write_str("datetime"),
            Self::Optional(inner) => write!(f, "Optional[{inner}]"),
            Self::Union(members) => {
                f.write_str("Union[")?;
                write_args(f, members)?;
                f.write_str("]")
            }
            Self::List(elem) => write!(f, "list[{elem}]"),
            Self::Set(elem) => write!(f, "set[{elem}]"),
            Self::Tuple(elems) if elems.is_empty() => f.write_str("tuple[()]"),
            Self::Tuple(elems) => {
                f.write_str("tuple[")?;
                write_args(f, elems)?;
                f.write_str("]")
            }
            Self::Map(elem) => write!(f, "dict[str, {elem}]"),
            Self::Record(schema) => f.write_str(schema.name()),
            Self::Custom(ctor) => f.write_str(ctor.name()),
            Self::Opaque(name) => f.write_str(name),
            Self::Generic { name, args } => {
                write!(f, "{name}[")?;
                write_args(f, args)?;
                f.write_str("]")
            }
        }
    }
}

impl FromStr for TypeDecl {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TypeDecl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TypeDecl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_scalars() {
        assert!(TypeDecl::Int.admits(&Value::Int(1)));
        assert!(!TypeDecl::Int.admits(&Value::Bool(true)));
        assert!(!TypeDecl::Float.admits(&Value::Int(1)));
        assert!(TypeDecl::Any.admits(&Value::from("x")));
        assert!(!TypeDecl::Any.admits(&Value::Null));
    }

    #[test]
    fn test_admits_optional_and_union() {
        let opt = TypeDecl::optional(TypeDecl::Str);
        assert!(opt.admits(&Value::Null));
        assert!(opt.admits(&Value::from("a")));
        assert!(!opt.admits(&Value::Int(1)));

        let union = TypeDecl::union([TypeDecl::Int, TypeDecl::Str]);
        assert!(union.admits(&Value::from("5")));
        assert!(!union.admits(&Value::Float(5.0)));
    }

    #[test]
    fn test_admits_containers_deeply() {
        let decl = TypeDecl::list(TypeDecl::Int);
        assert!(decl.admits(&Value::List(vec![Value::Int(1), Value::Int(2)])));
        assert!(!decl.admits(&Value::List(vec![Value::Int(1), Value::from("2")])));
        assert!(!decl.admits(&Value::Tuple(vec![Value::Int(1)])));

        let tuple = TypeDecl::tuple([TypeDecl::Int, TypeDecl::Str]);
        assert!(tuple.admits(&Value::Tuple(vec![Value::Int(1), Value::from("a")])));
        assert!(!tuple.admits(&Value::Tuple(vec![Value::Int(1)])));
    }

    #[test]
    fn test_parameterized() {
        assert!(TypeDecl::list(TypeDecl::Int).is_parameterized());
        assert!(TypeDecl::optional(TypeDecl::Int).is_parameterized());
        assert!(!TypeDecl::Int.is_parameterized());
        assert!(!TypeDecl::Opaque("Foo".to_string()).is_parameterized());
    }

    #[test]
    fn test_display() {
        let decl = TypeDecl::union([
            TypeDecl::tuple([TypeDecl::Int, TypeDecl::Float]),
            TypeDecl::set(TypeDecl::Date),
        ]);
        assert_eq!(decl.to_string(), "Union[tuple[int, float], set[date]]");
        assert_eq!(TypeDecl::tuple([]).to_string(), "tuple[()]");
    }

    #[test]
    fn test_serde_as_text() {
        let decl = TypeDecl::optional(TypeDecl::list(TypeDecl::DateTime));
        let json = serde_json::to_string(&decl).unwrap();
        assert_eq!(json, "\"Optional[list[datetime]]\"");
        let back: TypeDecl = serde_json::from_str(&json).unwrap();
        assert_eq!(back, decl);
    }
}
