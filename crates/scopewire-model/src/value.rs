//! Named, typed values
//!
//! Provides [`Value`], the unit of data flowing from a supplying scope to a
//! requiring one.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// A named, typed value
///
/// Two values are the same dependency iff both the name and the verbatim
/// type string are equal. No coercion or normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Value {
    /// Property name, e.g. `scoreStream`
    pub name: String,

    /// Type string exactly as declared, e.g. `ScoreStream`
    #[serde(rename = "type")]
    pub type_name: String,
}

impl Value {
    /// Create new value
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }

    /// Check whether `other` is the same dependency
    #[inline]
    #[must_use]
    pub fn matches(&self, other: &Value) -> bool {
        self == other
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_equality_is_verbatim() {
        let a = Value::new("stream", "Observable<Int>");
        let b = Value::new("stream", "Observable<Int>");
        let c = Value::new("stream", "Observable< Int >");

        assert!(a.matches(&b));
        assert!(!a.matches(&c));
    }

    #[test]
    fn value_name_mismatch() {
        let a = Value::new("scoreStream", "ScoreStream");
        let b = Value::new("scoresStream", "ScoreStream");
        assert_ne!(a, b);
    }

    #[test]
    fn value_display() {
        let v = Value::new("scoreStream", "ScoreStream");
        assert_eq!(v.to_string(), "scoreStream: ScoreStream");
    }

    #[test]
    fn value_serde_uses_type_key() {
        let v: Value = serde_json::from_str(r#"{"name":"a","type":"B"}"#).unwrap();
        assert_eq!(v, Value::new("a", "B"));

        let json = serde_json::to_string(&v).unwrap();
        assert!(json.contains("\"type\":\"B\""));
    }
}
