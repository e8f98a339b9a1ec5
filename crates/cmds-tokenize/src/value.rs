//! Structured values substituted into commands.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A value that can be tokenized for the shell.
///
/// Maps keep insertion order; option maps are sorted by key at tokenization
/// time, but `hash_mode = join` emits entries in the order given.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<Value>),
    Map(Vec<(String, Value)>),
}

impl Value {
    /// Build a map value from key/value pairs, keeping their order.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build an array value.
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Array(items.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// `nil` and `false` are falsy, everything else (including `""` and `0`)
    /// is truthy.
    #[must_use]
    pub const fn is_truthy(&self) -> bool {
        !matches!(self, Self::Nil | Self::Bool(false))
    }

    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        !matches!(self, Self::Array(_) | Self::Map(_))
    }

    /// Stringify the value the way it appears inside a shell word, before
    /// escaping.
    ///
    /// Scalars render plainly (`nil` as the empty string), arrays join their
    /// elements with `,` and maps render as JSON.
    #[must_use]
    pub fn to_shell_string(&self) -> String {
        self.join(",")
    }

    /// Join the value with `separator`, recursing into nested arrays with
    /// the same separator. Scalars stringify as themselves.
    #[must_use]
    pub fn join(&self, separator: &str) -> String {
        match self {
            Self::Nil => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => float_string(*f),
            Self::Str(s) => s.clone(),
            Self::Array(items) => join_values(items, separator),
            Self::Map(_) => self.to_json_string(),
        }
    }

    /// Flatten nested arrays into a single level.
    #[must_use]
    pub fn flatten(items: &[Value]) -> Vec<Value> {
        let mut flat = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Self::Array(inner) => flat.extend(Self::flatten(inner)),
                other => flat.push(other.clone()),
            }
        }
        flat
    }

    /// Compact JSON encoding of the value, keeping map order.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "null".to_string())
    }

    /// Look up a key in a map value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

/// Join a slice of values with `separator`, recursing into nested arrays.
#[must_use]
pub fn join_values(items: &[Value], separator: &str) -> String {
    items
        .iter()
        .map(|item| item.join(separator))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Stringify a float with a fractional part always present: `1.0`,
/// `1.0e+21`, `2.5e-07`. Non-finite values are `NaN`, `Infinity` and
/// `-Infinity`.
#[must_use]
pub fn float_string(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let debug = format!("{f:?}");
    let Some((mantissa, exponent)) = debug.split_once('e') else {
        return debug;
    };
    let fraction = if mantissa.contains('.') { "" } else { ".0" };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}{fraction}e{sign}{digits:0>2}")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_shell_string())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Nil => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Str(s) => serializer.serialize_str(s),
            Self::Array(items) => {
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
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Nil => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Int(i) => Self::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Self::Null, Self::Number),
            Value::Str(s) => Self::String(s.clone()),
            Value::Array(items) => Self::Array(items.iter().map(Self::from).collect()),
            Value::Map(entries) => Self::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Nil,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Nil, Self::Float),
            },
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(entries) => {
                Self::Map(entries.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::Str(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(i: $t) -> Self {
                Self::Int(i64::from(i))
            }
        })*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        i64::try_from(i).map_or_else(|_| Self::Float(i as f64), Self::Int)
    }
}

impl From<u64> for Value {
    fn from(i: u64) -> Self {
        i64::try_from(i).map_or_else(|_| Self::Float(i as f64), Self::Int)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Self::Float(f64::from(f))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Nil, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::array(items)
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(items: [T; N]) -> Self {
        Self::array(items)
    }
}

impl<K: Into<String>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(map: BTreeMap<K, V>) -> Self {
        Self::map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_strings() {
        assert_eq!(Value::Nil.to_shell_string(), "");
        assert_eq!(Value::from(true).to_shell_string(), "true");
        assert_eq!(Value::from(42).to_shell_string(), "42");
        assert_eq!(Value::from(1.0).to_shell_string(), "1.0");
        assert_eq!(Value::from(0.5).to_shell_string(), "0.5");
        assert_eq!(Value::from("hey").to_shell_string(), "hey");
    }

    #[test]
    fn test_float_exponent_forms_keep_a_fraction() {
        assert_eq!(float_string(1e21), "1.0e+21");
        assert_eq!(float_string(1e-7), "1.0e-07");
        assert_eq!(float_string(-2.5e300), "-2.5e+300");
        assert_eq!(float_string(1e15), "1000000000000000.0");
        assert_eq!(float_string(0.0001), "0.0001");
        assert_eq!(float_string(f64::INFINITY), "Infinity");
        assert_eq!(float_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(float_string(f64::NAN), "NaN");
        assert_eq!(Value::from(1e21).to_shell_string(), "1.0e+21");
    }

    #[test]
    fn test_join_recurses_with_same_separator() {
        let v = Value::array([Value::from(1), Value::array(["a", "b"]), Value::Nil]);
        assert_eq!(v.join(":"), "1:a:b:");
    }

    #[test]
    fn test_flatten_is_deep() {
        let v = vec![
            Value::from(1),
            Value::array([Value::from("a"), Value::array([Value::from("b"), Value::from(3)])]),
        ];
        assert_eq!(
            Value::flatten(&v),
            vec![Value::from(1), Value::from("a"), Value::from("b"), Value::from(3)]
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::from(false).is_truthy());
        assert!(Value::from("").is_truthy());
        assert!(Value::from(0).is_truthy());
    }

    #[test]
    fn test_json_keeps_map_order() {
        let v = Value::map([("b", 2), ("a", 1)]);
        assert_eq!(v.to_json_string(), r#"{"b":2,"a":1}"#);
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"{"b":2,"a":1}"#);
    }

    #[test]
    fn test_from_json_value() {
        let json: serde_json::Value = serde_json::from_str(r#"{"x":[1,2.5,null,"s"]}"#).unwrap();
        let v = Value::from(json);
        assert_eq!(
            v.get("x"),
            Some(&Value::array([
                Value::from(1),
                Value::from(2.5),
                Value::Nil,
                Value::from("s")
            ]))
        );
    }
}
