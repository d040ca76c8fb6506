//! `firefly-core` — shared primitives for the claims gate crates.
//!
//! This crate contains **pure** building blocks (no IO, no async).

pub mod error;
pub mod id;

pub use error::{CoreError, CoreResult};
pub use id::Uid;
