use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use firefly_core::CoreError;

/// Claim checked against protected routes.
pub const ADMIN_CLAIM: &str = "isAdmin";

/// A single claim value as carried in an identity token.
///
/// Custom claims are usually flags, strings or numbers, but providers also
/// embed nested objects (sign-in metadata etc.), so lists and maps are kept
/// rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<ClaimValue>),
    Map(BTreeMap<String, ClaimValue>),
}

impl ClaimValue {
    /// Truthiness used for authorization flags.
    ///
    /// `null`, `false`, `0`, NaN and `""` are falsy; everything else,
    /// including empty lists and maps, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            ClaimValue::Null => false,
            ClaimValue::Bool(b) => *b,
            ClaimValue::Number(n) => n.as_f64().is_none_or(|f| f != 0.0 && !f.is_nan()),
            ClaimValue::String(s) => !s.is_empty(),
            ClaimValue::List(_) | ClaimValue::Map(_) => true,
        }
    }
}

impl From<bool> for ClaimValue {
    fn from(value: bool) -> Self {
        ClaimValue::Bool(value)
    }
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        ClaimValue::String(value.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(value: String) -> Self {
        ClaimValue::String(value)
    }
}

impl From<i64> for ClaimValue {
    fn from(value: i64) -> Self {
        ClaimValue::Number(value.into())
    }
}

/// Custom claims extracted from a token result.
///
/// Claims are only ever replaced as a whole; there is no
/// merge/patch operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(BTreeMap<String, ClaimValue>);

impl Claims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and fixtures.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ClaimValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&ClaimValue> {
        self.0.get(name)
    }

    /// Whether `name` is present and truthy.
    pub fn is_truthy(&self, name: &str) -> bool {
        self.get(name).is_some_and(ClaimValue::is_truthy)
    }

    pub fn is_admin(&self) -> bool {
        self.is_truthy(ADMIN_CLAIM)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClaimValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build claims from a decoded JSON payload. Only objects are accepted.
    pub fn from_json(value: JsonValue) -> Result<Self, CoreError> {
        match value {
            JsonValue::Object(_) => serde_json::from_value(value)
                .map_err(|e| CoreError::validation(format!("claims: {e}"))),
            other => Err(CoreError::validation(format!(
                "claims must be a JSON object, got {other}"
            ))),
        }
    }
}

impl From<BTreeMap<String, ClaimValue>> for Claims {
    fn from(value: BTreeMap<String, ClaimValue>) -> Self {
        Self(value)
    }
}

impl<K: Into<String>, V: Into<ClaimValue>> FromIterator<(K, V)> for Claims {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn admin_flag_requires_truthy_value() {
        assert!(Claims::new().with(ADMIN_CLAIM, true).is_admin());
        assert!(!Claims::new().with(ADMIN_CLAIM, false).is_admin());
        assert!(!Claims::new().is_admin());
        assert!(!Claims::new().with(ADMIN_CLAIM, "").is_admin());
        assert!(!Claims::new().with(ADMIN_CLAIM, 0i64).is_admin());
        assert!(Claims::new().with(ADMIN_CLAIM, "yes").is_admin());
        assert!(Claims::new().with(ADMIN_CLAIM, 1i64).is_admin());
    }

    #[test]
    fn null_is_falsy() {
        assert!(!ClaimValue::Null.is_truthy());

        let claims = Claims::from_json(json!({ "isAdmin": null })).unwrap();
        assert!(!claims.is_admin());
    }

    #[test]
    fn nested_values_are_preserved_verbatim() {
        let payload = json!({
            "isAdmin": true,
            "level": 3,
            "firebase": { "sign_in_provider": "password", "identities": {} },
            "groups": ["a", "b"]
        });

        let claims = Claims::from_json(payload.clone()).unwrap();
        assert_eq!(claims.len(), 4);
        assert_eq!(serde_json::to_value(&claims).unwrap(), payload);
        assert!(claims.is_truthy("firebase"));
        assert!(claims.is_truthy("groups"));
    }

    #[test]
    fn from_json_rejects_non_objects() {
        let err = Claims::from_json(json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("JSON object"));
    }

    proptest! {
        #[test]
        fn bool_admin_flag_matches_truthiness(flag in any::<bool>()) {
            let claims = Claims::new().with(ADMIN_CLAIM, flag);
            prop_assert_eq!(claims.is_admin(), flag);
        }

        #[test]
        fn integer_truthiness_is_nonzero(n in any::<i64>()) {
            prop_assert_eq!(ClaimValue::from(n).is_truthy(), n != 0);
        }
    }
}
