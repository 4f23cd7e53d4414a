//! Shape checks over loosely typed configuration values

use serde_json::Value;

/// JSON value kinds a guard can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Object,
    Array,
    Bool,
    Number,
}

impl ValueKind {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Bool => value.is_boolean(),
            Self::Number => value.is_number(),
        }
    }
}

/// Absent, `null`, `""`, `false` and `0` count as empty.
/// Empty arrays and objects do not.
pub fn is_empty(target: Option<&Value>) -> bool {
    match target {
        None | Some(Value::Null) => true,
        Some(Value::Bool(flag)) => !flag,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::Array(_) | Value::Object(_)) => false,
    }
}

/// Does `target` satisfy `kind`?
///
/// An empty target passes only when `allow_empty` is set.
pub fn type_check(allow_empty: bool, kind: ValueKind, target: Option<&Value>) -> bool {
    if is_empty(target) {
        return allow_empty;
    }

    target.is_some_and(|value| kind.matches(value))
}
