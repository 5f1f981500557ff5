//! The tagged value tree produced by the Font Parser (spec section 4.6,
//! Design Notes "Tagged Value tree").

use crate::number::EngrNum;

/// One parsed value. `Object` preserves insertion order (font files are
/// read top-to-bottom and error messages reference the order things were
/// written), so it's a `Vec` of pairs rather than a `HashMap`.
#[derive(Debug, Clone)]
pub enum Value {
    QuotedString(String),
    UnquotedString(String),
    Number(EngrNum),
    True,
    False,
    Null,
    NameValue(String, Box<Value>),
    Object(Vec<(String, Value)>),
    Array(Vec<Value>),
}

impl Value {
    /// Either string variant, as a `&str` — the validator mostly doesn't
    /// care whether a name or path was quoted.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::QuotedString(s) | Value::UnquotedString(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Object(members) => Some(members),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&EngrNum> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Look up a member by name: an `Object`'s member, or an `Array`
    /// element that is a `NameValue` with a matching name (spec section
    /// 6's `velocities`/`robins` arrays are named this way).
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(members) => members.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            Value::Array(items) => items.iter().find_map(|v| match v {
                Value::NameValue(name, inner) if name == key => Some(inner.as_ref()),
                _ => None,
            }),
            _ => None,
        }
    }

    /// A short tag for error messages (`"a string"`, `"an object"`, ...).
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::QuotedString(_) | Value::UnquotedString(_) => "a string",
            Value::Number(_) => "a number",
            Value::True | Value::False => "a boolean",
            Value::Null => "null",
            Value::NameValue(..) => "a name-value pair",
            Value::Object(_) => "an object",
            Value::Array(_) => "an array",
        }
    }
}
