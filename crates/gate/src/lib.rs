//! `firefly-gate`
//!
//! **Responsibility:** keep a host component's view of the signed-in user's
//! custom claims current, and bounce non-admins off protected routes.
//!
//! The gate is a thin composition layer over three seams:
//! - [`HostComponent`]: the page/component the gate is mounted into
//! - [`firefly_auth::TokenSource`]: the identity provider
//! - [`Navigator`]: the current location and full-page redirects

pub mod config;
pub mod gate;
pub mod host;
pub mod navigator;

pub use config::{ClaimsRetention, ConfigError, GateConfig, OverlapPolicy};
pub use gate::{ClaimsGate, GateState, RefreshOutcome};
pub use host::{HostComponent, MountError, MountableAuthConsumer, StaticHost};
pub use navigator::{InMemoryNavigator, Navigator};
