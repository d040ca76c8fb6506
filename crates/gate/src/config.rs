//! Gate configuration.
//!
//! Settings are read from the environment:
//!
//! | variable | values | default |
//! |---|---|---|
//! | `FIREFLY_SIGN_OUT_POLICY` | `retain` \| `clear` | `retain` |
//! | `FIREFLY_FETCH_FAILURE_POLICY` | `retain` \| `clear` | `retain` |
//! | `FIREFLY_OVERLAP_POLICY` | `last-resolved` \| `latest-event` | `last-resolved` |
//!
//! The protected-route pattern and redirect target are fixed and not
//! configurable.

use core::str::FromStr;

use serde::Serialize;
use thiserror::Error;

pub const SIGN_OUT_POLICY_VAR: &str = "FIREFLY_SIGN_OUT_POLICY";
pub const FETCH_FAILURE_POLICY_VAR: &str = "FIREFLY_FETCH_FAILURE_POLICY";
pub const OVERLAP_POLICY_VAR: &str = "FIREFLY_OVERLAP_POLICY";

/// What happens to stored claims in a given situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimsRetention {
    /// Keep whatever claims are stored.
    #[default]
    Retain,
    /// Drop stored claims (observers see `None`).
    Clear,
}

impl FromStr for ClaimsRetention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retain" => Ok(Self::Retain),
            "clear" => Ok(Self::Clear),
            other => Err(other.to_string()),
        }
    }
}

/// How overlapping token fetches are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapPolicy {
    /// Every resolution is applied; whichever fetch resolves last wins.
    #[default]
    LastResolved,
    /// Only the fetch started by the newest user-change event is applied;
    /// older resolutions are discarded.
    LatestEvent,
}

impl FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-resolved" => Ok(Self::LastResolved),
            "latest-event" => Ok(Self::LatestEvent),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {var}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GateConfig {
    /// Applied when a user-change event carries no user.
    pub sign_out: ClaimsRetention,

    /// Applied when the token fetch fails, before the protection check runs.
    pub fetch_failure: ClaimsRetention,

    pub overlap: OverlapPolicy,
}

impl GateConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup; unset variables take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            sign_out: parse_var(&lookup, SIGN_OUT_POLICY_VAR)?,
            fetch_failure: parse_var(&lookup, FETCH_FAILURE_POLICY_VAR)?,
            overlap: parse_var(&lookup, OVERLAP_POLICY_VAR)?,
        })
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr<Err = String> + Default,
{
    match lookup(var) {
        None => Ok(T::default()),
        Some(raw) if raw.trim().is_empty() => Ok(T::default()),
        Some(raw) => raw
            .parse()
            .map_err(|value| ConfigError::InvalidValue { var, value }),
    }
}
