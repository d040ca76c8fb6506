//! The authentication widget's user-change notification.

use serde::{Deserialize, Serialize};

use firefly_auth::UserHandle;

/// Event name emitted by the authentication widget.
pub const USER_CHANGED: &str = "user-changed";

/// Payload of a `user-changed` event.
///
/// Mirrors the widget's wire shape: the new user (or `null` on sign-out)
/// lives at `detail.value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserChanged {
    pub detail: UserChangedDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserChangedDetail {
    pub value: Option<UserHandle>,
}

impl UserChanged {
    pub fn signed_in(user: UserHandle) -> Self {
        Self {
            detail: UserChangedDetail { value: Some(user) },
        }
    }

    pub fn signed_out() -> Self {
        Self {
            detail: UserChangedDetail { value: None },
        }
    }

    pub fn user(&self) -> Option<&UserHandle> {
        self.detail.value.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firefly_core::Uid;

    #[test]
    fn parses_widget_payload() {
        let event: UserChanged =
            serde_json::from_str(r#"{"detail":{"value":{"uid":"u1"}}}"#).unwrap();
        assert_eq!(event.user().map(|u| u.uid.as_str()), Some("u1"));

        let signed_out: UserChanged = serde_json::from_str(r#"{"detail":{"value":null}}"#).unwrap();
        assert_eq!(signed_out, UserChanged::signed_out());
    }

    #[test]
    fn signed_in_carries_the_handle() {
        let user = UserHandle::new(Uid::parse("u2").unwrap());
        let event = UserChanged::signed_in(user.clone());
        assert_eq!(event.user(), Some(&user));
    }
}
