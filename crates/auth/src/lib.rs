//! `firefly-auth` — pure claims/authorization boundary.
//!
//! This crate is intentionally decoupled from the UI host and from any
//! concrete identity provider: providers plug in through [`TokenSource`].

pub mod authorize;
pub mod claims;
pub mod route;
pub mod token;
pub mod user;

pub use authorize::{
    DenialKind, RouteDecision, RouteDecisionExplanation, decide_route, explain_route_decision,
};
pub use claims::{ADMIN_CLAIM, ClaimValue, Claims};
pub use route::{REDIRECT_TARGET, is_protected, path_of};
pub use token::{StaticTokenSource, TokenFetchError, TokenResult, TokenSource};
pub use user::UserHandle;
