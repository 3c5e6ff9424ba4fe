//! Textual and numeric boolean interpretation.

use crate::value::Value;

/// Upper-cased spellings that read as true. Every other string is false.
pub const TRUE_TOKENS: [&str; 3] = ["1", "TRUE", "T"];

/// Interprets `value` as a boolean.
///
/// Integers are stringified first, so only `1` is true. Strings are
/// matched case-insensitively against [`TRUE_TOKENS`]. Anything else falls
/// back to generic truthiness.
///
/// # Examples
///
/// ```
/// use strictrecord::coerce::interpret_bool;
/// use strictrecord::Value;
///
/// assert!(interpret_bool(&Value::from("t")));
/// assert!(!interpret_bool(&Value::from("yes")));
/// assert!(!interpret_bool(&Value::Int(2)));
/// ```
#[must_use]
pub fn interpret_bool(value: &Value) -> bool {
    match value {
        Value::Int(v) => is_true_token(&v.to_string()),
        Value::String(s) => is_true_token(s),
        other => other.is_truthy(),
    }
}

fn is_true_token(text: &str) -> bool {
    let upper = text.to_uppercase();
    TRUE_TOKENS.contains(&upper.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_go_through_text() {
        assert!(interpret_bool(&Value::Int(1)));
        assert!(!interpret_bool(&Value::Int(0)));
        assert!(!interpret_bool(&Value::Int(2)));
        assert!(!interpret_bool(&Value::Int(-1)));
    }

    #[test]
    fn test_strings_match_fixed_set() {
        for truthy in ["1", "true", "TRUE", "True", "t", "T"] {
            assert!(interpret_bool(&Value::from(truthy)), "{truthy}");
        }
        for falsy in ["0", "false", "yes", "y", "on", "", " true"] {
            assert!(!interpret_bool(&Value::from(falsy)), "{falsy}");
        }
    }

    #[test]
    fn test_other_values_use_truthiness() {
        assert!(interpret_bool(&Value::Float(0.1)));
        assert!(!interpret_bool(&Value::Float(0.0)));
        assert!(interpret_bool(&Value::List(vec![Value::Null])));
        assert!(!interpret_bool(&Value::map(Vec::<(String, Value)>::new())));
    }
}
