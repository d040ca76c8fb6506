use serde::{Deserialize, Serialize};

use firefly_core::Uid;

/// Handle to the currently signed-in identity.
///
/// Supplied by the authentication widget; the gate never constructs one
/// itself, it only forwards it to the [`crate::TokenSource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserHandle {
    pub uid: Uid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
}

impl UserHandle {
    pub fn new(uid: Uid) -> Self {
        Self {
            uid,
            email: None,
            display_name: None,
            provider_id: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}
