//! Dynamically typed argument values.
//!
//! Every entry in a scope store is an [`ArgValue`]. Values that arrive as raw
//! text (command-line tokens, environment variables, inline default markers)
//! go through [`parse_literal`], which never fails: anything that is not a
//! number or a boolean keyword stays a string.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Ordered key/value store used by scopes, config files and subsets.
pub type ArgMap = IndexMap<String, ArgValue>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    List(Vec<ArgValue>),
    Map(ArgMap),
}

/// Parse a raw literal: integer, then float, then `true`/`false`
/// (case-insensitive), else the string unchanged.
pub fn parse_literal(raw: &str) -> ArgValue {
    if let Ok(n) = raw.parse::<i64>() {
        return ArgValue::Int(n);
    }
    if let Ok(x) = raw.parse::<f64>() {
        return ArgValue::Float(x);
    }
    if raw.eq_ignore_ascii_case("true") {
        return ArgValue::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return ArgValue::Bool(false);
    }
    ArgValue::Str(raw.to_string())
}

/// Build an [`ArgMap`] from anything convertible into keys and values.
pub fn arg_map<K, V, I>(pairs: I) -> ArgMap
where
    K: Into<String>,
    V: Into<ArgValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

impl ArgValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ArgValue::Int(n) => Some(*n),
            ArgValue::Float(x) if x.fract() == 0.0 => Some(*x as i64),
            _ => None,
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        self.as_i64().and_then(|n| usize::try_from(n).ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgValue::Int(n) => Some(*n as f64),
            ArgValue::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ArgValue]> {
        match self {
            ArgValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Python-style truthiness: zero, empty and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            ArgValue::Int(n) => *n != 0,
            ArgValue::Float(x) => *x != 0.0,
            ArgValue::Bool(b) => *b,
            ArgValue::Str(s) => !s.is_empty(),
            ArgValue::List(items) => !items.is_empty(),
            ArgValue::Map(map) => !map.is_empty(),
        }
    }

    /// Render as JSON text, quoting strings. Used by diagnostics.
    pub fn repr(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.to_string())
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArgValue::Int(n) => write!(f, "{}", n),
            ArgValue::Float(x) => write!(f, "{}", x),
            ArgValue::Bool(b) => write!(f, "{}", b),
            ArgValue::Str(s) => write!(f, "{}", s),
            ArgValue::List(items) => {
                let parts: Vec<String> = items.iter().map(ArgValue::repr).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            ArgValue::Map(map) => {
                let parts: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{:?}: {}", k, v.repr()))
                    .collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl From<i64> for ArgValue {
    fn from(n: i64) -> Self {
        ArgValue::Int(n)
    }
}

impl From<i32> for ArgValue {
    fn from(n: i32) -> Self {
        ArgValue::Int(n as i64)
    }
}

impl From<usize> for ArgValue {
    fn from(n: usize) -> Self {
        ArgValue::Int(n as i64)
    }
}

impl From<f64> for ArgValue {
    fn from(x: f64) -> Self {
        ArgValue::Float(x)
    }
}

impl From<bool> for ArgValue {
    fn from(b: bool) -> Self {
        ArgValue::Bool(b)
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::Str(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::Str(s)
    }
}

impl From<Vec<ArgValue>> for ArgValue {
    fn from(items: Vec<ArgValue>) -> Self {
        ArgValue::List(items)
    }
}

impl From<ArgMap> for ArgValue {
    fn from(map: ArgMap) -> Self {
        ArgValue::Map(map)
    }
}

impl ArgValue {
    /// Convert a JSON value. `null` has no counterpart and yields `None`;
    /// nulls nested inside arrays and objects are dropped.
    pub fn from_json(value: serde_json::Value) -> Option<ArgValue> {
        use serde_json::Value;
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(ArgValue::Bool(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(ArgValue::Int(i)),
                None => n.as_f64().map(ArgValue::Float),
            },
            Value::String(s) => Some(ArgValue::Str(s)),
            Value::Array(items) => Some(ArgValue::List(
                items.into_iter().filter_map(ArgValue::from_json).collect(),
            )),
            Value::Object(map) => Some(ArgValue::Map(
                map.into_iter()
                    .filter_map(|(k, v)| ArgValue::from_json(v).map(|v| (k, v)))
                    .collect(),
            )),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_parse_literal_kinds() {
        assert_eq!(parse_literal("42"), ArgValue::Int(42));
        assert_eq!(parse_literal("-7"), ArgValue::Int(-7));
        assert_eq!(parse_literal("3.14"), ArgValue::Float(3.14));
        assert_eq!(parse_literal("True"), ArgValue::Bool(true));
        assert_eq!(parse_literal("false"), ArgValue::Bool(false));
        assert_eq!(parse_literal("FALSE"), ArgValue::Bool(false));
        assert_eq!(parse_literal("hello"), ArgValue::Str("hello".to_string()));
        assert_eq!(parse_literal(""), ArgValue::Str(String::new()));
    }

    #[test]
    fn test_parse_literal_keeps_paths_and_names() {
        assert_eq!(
            parse_literal("llm-jp/llm-jp-1.3b-v1.0"),
            ArgValue::Str("llm-jp/llm-jp-1.3b-v1.0".to_string())
        );
        assert_eq!(parse_literal("yes"), ArgValue::Str("yes".to_string()));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(ArgValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(ArgValue::Float(4.0).as_i64(), Some(4));
        assert_eq!(ArgValue::Float(4.5).as_i64(), None);
        assert_eq!(ArgValue::Int(-1).as_usize(), None);
        assert_eq!(ArgValue::from("x").as_str(), Some("x"));
        assert!(!ArgValue::from("").is_truthy());
        assert!(ArgValue::Int(2).is_truthy());
        let list = ArgValue::from(vec![ArgValue::Int(1), ArgValue::from("a")]);
        assert_eq!(list.as_list(), Some(&[ArgValue::Int(1), ArgValue::from("a")][..]));
        assert_eq!(ArgValue::Int(1).as_list(), None);
    }

    #[test]
    fn test_from_json_drops_nulls() {
        let json = serde_json::json!({"a": 1, "b": null, "c": [1, null, "x"], "d": 0.5});
        let value = ArgValue::from_json(json).unwrap();
        let expected = ArgValue::Map(arg_map([
            ("a", ArgValue::Int(1)),
            ("c", ArgValue::List(vec![ArgValue::Int(1), ArgValue::from("x")])),
            ("d", ArgValue::Float(0.5)),
        ]));
        assert_eq!(value, expected);
    }

    #[test]
    fn test_repr_quotes_strings() {
        assert_eq!(ArgValue::from("a").repr(), "\"a\"");
        assert_eq!(ArgValue::Int(5).repr(), "5");
        assert_eq!(
            ArgValue::List(vec![ArgValue::from("f.jsonl")]).to_string(),
            "[\"f.jsonl\"]"
        );
    }

    proptest! {
        #[test]
        fn prop_integers_parse_as_int(n in any::<i64>()) {
            prop_assert_eq!(parse_literal(&n.to_string()), ArgValue::Int(n));
        }

        #[test]
        fn prop_alphabetic_words_stay_strings(s in "[a-z]{1,12}") {
            prop_assume!(s != "true" && s != "false" && s != "inf" && s != "nan"
                && s != "infinity");
            prop_assert_eq!(parse_literal(&s), ArgValue::Str(s.clone()));
        }
    }
}
