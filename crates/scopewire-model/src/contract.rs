//! Dependency contracts
//!
//! Provides [`Contract`], the named set of values a scope requires from its
//! ancestors.

use crate::error::ModelError;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Name given to the implicit "no requirements" contract
pub const EMPTY_CONTRACT_NAME: &str = "EmptyDependency";

/// Named set of required values
///
/// Value names are unique within one contract; construction enforces it.
/// The sentinel returned by [`Contract::empty`] is what a scope gets when it
/// declares no contract at all, and always resolves without lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawContract")]
pub struct Contract {
    name: String,
    values: Vec<Value>,
    #[serde(skip)]
    empty: bool,
}

#[derive(Deserialize)]
struct RawContract {
    name: String,
    #[serde(default)]
    values: Vec<Value>,
}

impl TryFrom<RawContract> for Contract {
    type Error = ModelError;

    fn try_from(raw: RawContract) -> Result<Self, Self::Error> {
        Contract::new(raw.name, raw.values)
    }
}

impl Contract {
    /// Create new contract
    ///
    /// # Errors
    /// - `ModelError::EmptyName` if `name` is empty
    /// - `ModelError::DuplicateValue` if two values share a name
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Result<Self, ModelError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::EmptyName { kind: "contract" });
        }

        let mut seen = HashSet::with_capacity(values.len());
        for value in &values {
            if !seen.insert(value.name.as_str()) {
                return Err(ModelError::DuplicateValue {
                    contract: name,
                    value: value.name.clone(),
                });
            }
        }

        Ok(Self {
            name,
            values,
            empty: false,
        })
    }

    /// The "no requirements" sentinel
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self {
            name: EMPTY_CONTRACT_NAME.to_string(),
            values: Vec::new(),
            empty: true,
        }
    }

    /// Contract name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Required values, in declaration order
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Whether this is the empty sentinel
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Whether resolution can be skipped entirely
    ///
    /// True for the sentinel and for declared contracts without values.
    #[inline]
    #[must_use]
    pub fn requires_nothing(&self) -> bool {
        self.empty || self.values.is_empty()
    }

    /// Look up a required value by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|v| v.name == name)
    }

    /// Check whether the contract requires exactly this value
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.values.iter().any(|v| v.matches(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_rejects_duplicate_names() {
        let result = Contract::new(
            "GameDependency",
            vec![Value::new("a", "A"), Value::new("a", "B")],
        );

        assert_eq!(
            result,
            Err(ModelError::DuplicateValue {
                contract: "GameDependency".to_string(),
                value: "a".to_string(),
            })
        );
    }

    #[test]
    fn contract_rejects_empty_name() {
        assert!(matches!(
            Contract::new("", vec![]),
            Err(ModelError::EmptyName { .. })
        ));
    }

    #[test]
    fn empty_sentinel() {
        let empty = Contract::empty();
        assert!(empty.is_empty());
        assert!(empty.requires_nothing());
        assert_eq!(empty.name(), EMPTY_CONTRACT_NAME);
    }

    #[test]
    fn declared_contract_without_values_is_not_sentinel() {
        let c = Contract::new("Nothing", vec![]).unwrap();
        assert!(!c.is_empty());
        assert!(c.requires_nothing());
    }

    #[test]
    fn contract_lookup() {
        let c = Contract::new("D", vec![Value::new("x", "X")]).unwrap();
        assert_eq!(c.get("x"), Some(&Value::new("x", "X")));
        assert!(c.contains(&Value::new("x", "X")));
        assert!(!c.contains(&Value::new("x", "Y")));
    }

    #[test]
    fn contract_deserialize_validates() {
        let ok: Result<Contract, _> =
            serde_json::from_str(r#"{"name":"D","values":[{"name":"x","type":"X"}]}"#);
        assert!(ok.is_ok());

        let dup: Result<Contract, _> = serde_json::from_str(
            r#"{"name":"D","values":[{"name":"x","type":"X"},{"name":"x","type":"X"}]}"#,
        );
        assert!(dup.is_err());
    }
}
