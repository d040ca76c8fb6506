use serde::Serialize;

use crate::route::{REDIRECT_TARGET, is_protected, path_of};
use crate::{ADMIN_CLAIM, Claims};

/// Outcome of checking a location against the current claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RouteDecision {
    /// Route is public, or the claims carry a truthy admin flag.
    Allow,

    /// Route is protected and the claims do not authorize it.
    Redirect { to: &'static str },
}

impl RouteDecision {
    pub fn is_redirect(&self) -> bool {
        matches!(self, RouteDecision::Redirect { .. })
    }
}

/// Decide whether `location` may be shown for `claims`.
///
/// - No IO
/// - No panics
/// - Absent claims are treated like a falsy admin flag (fail closed)
pub fn decide_route(claims: Option<&Claims>, location: &str) -> RouteDecision {
    if !is_protected(location) {
        return RouteDecision::Allow;
    }

    if claims.is_some_and(Claims::is_admin) {
        RouteDecision::Allow
    } else {
        RouteDecision::Redirect {
            to: REDIRECT_TARGET,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Decision Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of a route decision, for logs and debugging.
#[derive(Debug, Clone, Serialize)]
pub struct RouteDecisionExplanation {
    /// Path component the decision was made on.
    pub path: String,

    pub protected: bool,

    /// Whether the admin claim was present and truthy.
    pub admin: bool,

    pub decision: RouteDecision,

    /// Human-readable reason for the decision.
    pub reason: String,

    /// If redirected, what was missing.
    pub denial: Option<DenialKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// No claims have been fetched yet (or they were cleared).
    ClaimsAbsent,
    AdminClaimMissing,
    AdminClaimFalsy,
}

/// Explain why [`decide_route`] returns what it returns.
pub fn explain_route_decision(claims: Option<&Claims>, location: &str) -> RouteDecisionExplanation {
    let path = path_of(location);
    let protected = is_protected(location);
    let admin = claims.is_some_and(Claims::is_admin);
    let decision = decide_route(claims, location);

    let (reason, denial) = match (protected, admin) {
        (false, _) => (format!("route '{path}' is not protected"), None),
        (true, true) => (
            format!("route '{path}' is protected; '{ADMIN_CLAIM}' claim is truthy"),
            None,
        ),
        (true, false) => {
            let kind = match claims {
                None => DenialKind::ClaimsAbsent,
                Some(c) if c.get(ADMIN_CLAIM).is_none() => DenialKind::AdminClaimMissing,
                Some(_) => DenialKind::AdminClaimFalsy,
            };
            (
                format!("route '{path}' is protected; redirecting to '{REDIRECT_TARGET}' ({kind:?})"),
                Some(kind),
            )
        }
    };

    RouteDecisionExplanation {
        path,
        protected,
        admin,
        decision,
        reason,
        denial,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn admin(flag: bool) -> Claims {
        Claims::new().with(ADMIN_CLAIM, flag)
    }

    #[test]
    fn admin_may_visit_protected_route() {
        assert_eq!(decide_route(Some(&admin(true)), "/settings"), RouteDecision::Allow);
    }

    #[test]
    fn non_admin_is_redirected_to_root() {
        let decision = decide_route(Some(&admin(false)), "/settings-profile");
        assert_eq!(decision, RouteDecision::Redirect { to: "/" });
        assert!(decision.is_redirect());
    }

    #[test]
    fn public_route_ignores_claims() {
        assert_eq!(decide_route(Some(&admin(false)), "/about"), RouteDecision::Allow);
        assert_eq!(decide_route(None, "/about"), RouteDecision::Allow);
    }

    #[test]
    fn absent_claims_fail_closed() {
        assert!(decide_route(None, "/settings").is_redirect());
        assert!(decide_route(Some(&Claims::new()), "/settings").is_redirect());
    }

    #[test]
    fn explanation_names_denial_kind() {
        let none = explain_route_decision(None, "/settings");
        assert_eq!(none.denial, Some(DenialKind::ClaimsAbsent));

        let missing = explain_route_decision(Some(&Claims::new()), "/settings");
        assert_eq!(missing.denial, Some(DenialKind::AdminClaimMissing));

        let falsy = explain_route_decision(Some(&admin(false)), "/settings-x?y=1");
        assert_eq!(falsy.denial, Some(DenialKind::AdminClaimFalsy));
        assert_eq!(falsy.path, "/settings-x");
        assert!(falsy.reason.contains("redirecting"));

        let allowed = explain_route_decision(Some(&admin(true)), "/settings");
        assert_eq!(allowed.decision, RouteDecision::Allow);
        assert!(allowed.denial.is_none());
    }

    #[test]
    fn explanation_serializes_for_logs() {
        let json = serde_json::to_value(explain_route_decision(None, "/settings")).unwrap();
        assert_eq!(json["decision"]["action"], "redirect");
        assert_eq!(json["decision"]["to"], "/");
        assert_eq!(json["denial"], "claims_absent");
    }

    proptest! {
        #[test]
        fn decision_is_idempotent(flag in any::<bool>(), suffix in "[a-z]{0,8}") {
            let claims = admin(flag);
            let path = format!("/settings-{suffix}");
            let first = decide_route(Some(&claims), &path);
            let second = decide_route(Some(&claims), &path);
            prop_assert_eq!(first, second);
            prop_assert_eq!(first.is_redirect(), !flag);
        }
    }
}
