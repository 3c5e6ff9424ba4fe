//! Annotation text parser.
//!
//! Grammar (whitespace allowed between tokens):
//!
//! ```text
//! decl    := member ('|' member)*
//! member  := 'None' | name ('[' args ']')?
//! args    := '()' | decl (',' decl)*
//! name    := [A-Za-z_][A-Za-z0-9_.]*
//! ```

use crate::decl::TypeDecl;
use crate::error::SchemaError;
use crate::registry::TypeRegistry;

/// Deepest bracket nesting accepted, matching `serde_json`'s recursion limit.
const MAX_DEPTH: usize = 128;

/// A union member: `None` is only meaningful inside a union.
enum Member {
    Decl(TypeDecl),
    None,
}

pub(crate) struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
    registry: Option<&'a TypeRegistry>,
}

impl<'a> Parser<'a> {
    pub(crate) const fn new(input: &'a str, registry: Option<&'a TypeRegistry>) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
            registry,
        }
    }

    pub(crate) fn parse(mut self) -> Result<TypeDecl, SchemaError> {
        let decl = self.decl()?;
        self.skip_ws();
        if self.pos < self.input.len() {
            return Err(self.error_at(self.pos, "unexpected trailing input"));
        }
        Ok(decl)
    }

    fn error_at(&self, offset: usize, reason: impl Into<String>) -> SchemaError {
        SchemaError::InvalidDecl {
            input: self.input.to_string(),
            offset,
            reason: reason.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_ws(&mut self) -> usize {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
        self.pos
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), SchemaError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error_at(self.pos, format!("expected '{c}'")))
        }
    }

    fn decl(&mut self) -> Result<TypeDecl, SchemaError> {
        let start = self.skip_ws();
        let mut members = vec![self.member()?];
        while self.eat('|') {
            members.push(self.member()?);
        }
        if members.len() == 1 {
            return match members.pop() {
                Some(Member::Decl(decl)) => Ok(decl),
                _ => Err(self.error_at(start, "`None` is only valid inside a union")),
            };
        }
        self.union(members, start)
    }

    /// Builds a union; any `None` member makes the union optional.
    fn union(&self, members: Vec<Member>, start: usize) -> Result<TypeDecl, SchemaError> {
        let total = members.len();
        let mut decls: Vec<TypeDecl> = members
            .into_iter()
            .filter_map(|m| match m {
                Member::Decl(decl) => Some(decl),
                Member::None => None,
            })
            .collect();
        let optional = decls.len() < total;
        let inner = match decls.len() {
            0 => return Err(self.error_at(start, "a union needs at least one type besides `None`")),
            1 => decls.remove(0),
            _ => TypeDecl::Union(decls),
        };
        Ok(if optional {
            TypeDecl::optional(inner)
        } else {
            inner
        })
    }

    fn name(&mut self) -> Result<&'a str, SchemaError> {
        let start = self.skip_ws();
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|&(i, c)| {
                !(c == '_' || c.is_ascii_alphabetic() || (i > 0 && (c.is_ascii_digit() || c == '.')))
            })
            .map_or(rest.len(), |(i, _)| i);
        if len == 0 {
            let reason = if rest.starts_with("...") {
                "variadic tuples are not supported"
            } else {
                "expected a type name"
            };
            return Err(self.error_at(start, reason));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn member(&mut self) -> Result<Member, SchemaError> {
        let start = self.skip_ws();
        let raw = self.name()?;
        let name = normalize(raw);
        if name == "None" || name == "NoneType" {
            return Ok(Member::None);
        }
        let args = if self.eat('[') {
            if self.depth >= MAX_DEPTH {
                return Err(self.error_at(start, "declaration nested too deeply"));
            }
            self.depth += 1;
            let args = self.args();
            self.depth -= 1;
            let args = args?;
            self.expect(']')?;
            Some(args)
        } else {
            None
        };
        self.build(name, args, start).map(Member::Decl)
    }

    fn args(&mut self) -> Result<Vec<Member>, SchemaError> {
        if self.eat('(') {
            self.expect(')')?;
            return Ok(Vec::new());
        }
        let mut args = vec![self.arg()?];
        while self.eat(',') {
            args.push(self.arg()?);
        }
        Ok(args)
    }

    /// A type argument: a full declaration, or a bare `None`.
    fn arg(&mut self) -> Result<Member, SchemaError> {
        let checkpoint = self.pos;
        if let Ok(raw) = self.name() {
            let name = normalize(raw);
            let next = self.rest().trim_start();
            if (name == "None" || name == "NoneType") && !next.starts_with('|') {
                return Ok(Member::None);
            }
        }
        self.pos = checkpoint;
        self.decl().map(Member::Decl)
    }

    fn build(
        &self,
        name: &str,
        args: Option<Vec<Member>>,
        start: usize,
    ) -> Result<TypeDecl, SchemaError> {
        let Some(args) = args else {
            return self.bare(name, start);
        };

        match name {
            "Optional" => {
                let [arg] = self.arity::<1>(name, args, start)?;
                match arg {
                    Member::Decl(inner) => Ok(TypeDecl::optional(inner)),
                    Member::None => Err(self.error_at(start, "`Optional[None]` has no type")),
                }
            }
            "Union" => self.union(args, start),
            "list" | "List" => {
                let [elem] = self.arity::<1>(name, args, start)?;
                Ok(TypeDecl::list(self.decl_arg(elem, start)?))
            }
            "set" | "Set" => {
                let [elem] = self.arity::<1>(name, args, start)?;
                Ok(TypeDecl::set(self.decl_arg(elem, start)?))
            }
            "tuple" | "Tuple" => Ok(TypeDecl::Tuple(
                args.into_iter()
                    .map(|arg| self.decl_arg(arg, start))
                    .collect::<Result<_, _>>()?,
            )),
            "dict" | "Dict" => {
                let [key, value] = self.arity::<2>(name, args, start)?;
                match self.decl_arg(key, start)? {
                    TypeDecl::Str | TypeDecl::Any => {}
                    other => {
                        return Err(self.error_at(
                            start,
                            format!("mapping keys must be `str`, found `{other}`"),
                        ))
                    }
                }
                Ok(TypeDecl::map(self.decl_arg(value, start)?))
            }
            "Any" | "bool" | "int" | "float" | "str" | "date" | "datetime" => Err(self.error_at(
                start,
                format!("`{name}` does not take type arguments"),
            )),
            _ => Ok(TypeDecl::Generic {
                name: name.to_string(),
                args: args
                    .into_iter()
                    .map(|arg| self.decl_arg(arg, start))
                    .collect::<Result<_, _>>()?,
            }),
        }
    }

    fn bare(&self, name: &str, start: usize) -> Result<TypeDecl, SchemaError> {
        Ok(match name {
            "Any" => TypeDecl::Any,
            "bool" => TypeDecl::Bool,
            "int" => TypeDecl::Int,
            "float" => TypeDecl::Float,
            "str" => TypeDecl::Str,
            "date" => TypeDecl::Date,
            "datetime" => TypeDecl::DateTime,
            "list" | "List" => TypeDecl::list(TypeDecl::Any),
            "set" | "Set" => TypeDecl::set(TypeDecl::Any),
            "dict" | "Dict" => TypeDecl::map(TypeDecl::Any),
            "tuple" | "Tuple" | "Optional" | "Union" => {
                return Err(self.error_at(start, format!("`{name}` requires type arguments")))
            }
            other => self
                .registry
                .and_then(|registry| registry.resolve(other))
                .cloned()
                .unwrap_or_else(|| TypeDecl::Opaque(other.to_string())),
        })
    }

    fn arity<const N: usize>(
        &self,
        name: &str,
        args: Vec<Member>,
        start: usize,
    ) -> Result<[Member; N], SchemaError> {
        let found = args.len();
        args.try_into().map_err(|_| {
            self.error_at(
                start,
                format!("`{name}` takes {N} type argument(s), found {found}"),
            )
        })
    }

    fn decl_arg(&self, arg: Member, start: usize) -> Result<TypeDecl, SchemaError> {
        match arg {
            Member::Decl(decl) => Ok(decl),
            Member::None => Err(self.error_at(start, "`None` is only valid inside a union")),
        }
    }
}

/// Strips module qualifiers the annotation text may carry.
fn normalize(name: &str) -> &str {
    match name {
        "datetime.date" => "date",
        "datetime.datetime" => "datetime",
        _ => name
            .strip_prefix("typing.")
            .or_else(|| name.strip_prefix("builtins."))
            .unwrap_or(name),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::record::RecordSchema;

    fn parse(text: &str) -> Result<TypeDecl, SchemaError> {
        Parser::new(text, None).parse()
    }

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse("int").unwrap(), TypeDecl::Int);
        assert_eq!(parse("  typing.Any ").unwrap(), TypeDecl::Any);
        assert_eq!(parse("datetime.date").unwrap(), TypeDecl::Date);
        assert_eq!(parse("datetime").unwrap(), TypeDecl::DateTime);
    }

    #[test]
    fn test_parse_containers() {
        assert_eq!(
            parse("list[set[str]]").unwrap(),
            TypeDecl::list(TypeDecl::set(TypeDecl::Str))
        );
        assert_eq!(
            parse("Tuple[int, float]").unwrap(),
            TypeDecl::tuple([TypeDecl::Int, TypeDecl::Float])
        );
        assert_eq!(parse("tuple[()]").unwrap(), TypeDecl::tuple([]));
        assert_eq!(parse("Dict[str, bool]").unwrap(), TypeDecl::map(TypeDecl::Bool));
        assert_eq!(parse("list").unwrap(), TypeDecl::list(TypeDecl::Any));
    }

    #[test]
    fn test_parse_unions_and_none() {
        assert_eq!(
            parse("int | str").unwrap(),
            TypeDecl::union([TypeDecl::Int, TypeDecl::Str])
        );
        assert_eq!(parse("None | int").unwrap(), TypeDecl::optional(TypeDecl::Int));
        assert_eq!(
            parse("Union[int, str, None]").unwrap(),
            TypeDecl::optional(TypeDecl::union([TypeDecl::Int, TypeDecl::Str]))
        );
        assert_eq!(
            parse("Optional[Optional[int]]").unwrap(),
            TypeDecl::optional(TypeDecl::optional(TypeDecl::Int))
        );
        assert_eq!(
            parse("list[int | None]").unwrap(),
            TypeDecl::list(TypeDecl::optional(TypeDecl::Int))
        );
    }

    #[test]
    fn test_parse_unknown_names() {
        assert_eq!(parse("Widget").unwrap(), TypeDecl::Opaque("Widget".to_string()));
        assert_eq!(
            parse("frozenset[int]").unwrap(),
            TypeDecl::Generic {
                name: "frozenset".to_string(),
                args: vec![TypeDecl::Int],
            }
        );
    }

    #[test]
    fn test_parse_registry_names() {
        let schema = RecordSchema::builder("Point")
            .field("x", TypeDecl::Int)
            .build()
            .unwrap();
        let mut registry = TypeRegistry::new();
        registry.register_record(&schema);

        let decl = Parser::new("list[Point]", Some(&registry)).parse().unwrap();
        assert_eq!(decl, TypeDecl::list(TypeDecl::Record(Arc::clone(&schema))));
    }

    #[test]
    fn test_parse_errors() {
        for bad in [
            "",
            "list[int",
            "int[str]",
            "dict[int, str]",
            "Optional",
            "Optional[int, str]",
            "None",
            "tuple[int, ...]",
            "list[None]",
            "int str",
            "Union[None]",
        ] {
            let err = parse(bad).unwrap_err();
            assert!(
                matches!(err, SchemaError::InvalidDecl { .. }),
                "expected parse error for {bad:?}"
            );
        }
    }

    #[test]
    fn test_parse_error_offset() {
        let err = parse("list[int").unwrap_err();
        let SchemaError::InvalidDecl { offset, reason, .. } = err else {
            panic!("expected invalid declaration");
        };
        assert_eq!(offset, 8);
        assert!(reason.contains("']'"));
    }

    #[test]
    fn test_parse_depth_limit() {
        let nested = |depth: usize| format!("{}int{}", "list[".repeat(depth), "]".repeat(depth));

        let mut decl = parse(&nested(MAX_DEPTH)).unwrap();
        for _ in 0..MAX_DEPTH {
            let TypeDecl::List(elem) = decl else {
                panic!("expected a list declaration");
            };
            decl = *elem;
        }
        assert_eq!(decl, TypeDecl::Int);

        for depth in [MAX_DEPTH + 1, 20_000] {
            let err = parse(&nested(depth)).unwrap_err();
            let SchemaError::InvalidDecl { reason, .. } = err else {
                panic!("expected invalid declaration");
            };
            assert_eq!(reason, "declaration nested too deeply");
        }
    }
}
