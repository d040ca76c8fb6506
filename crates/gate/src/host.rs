//! Host component seam.
//!
//! The gate does not extend the host; it is composed next to it. The host
//! exposes its own lifecycle hooks and a way to find the authentication
//! widget in its rendered tree, and the gate drives them in order.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use firefly_auth::Claims;
use firefly_events::{EventTarget, EventTargetError, UserChanged};

/// The component the gate is mounted into.
pub trait HostComponent: Send + Sync {
    /// The host's own mount logic. Runs before the gate registers anything.
    fn on_mount(&self) {}

    /// The host's own unmount logic. Runs before the gate deregisters.
    fn on_unmount(&self) {}

    /// Locate the authentication widget in the host's rendered tree.
    fn query_auth_widget(&self) -> Option<Arc<dyn EventTarget<UserChanged>>>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MountError {
    #[error("authentication widget not found in host")]
    WidgetMissing,

    #[error("no async runtime available to run token fetches")]
    NoRuntime,

    #[error("already mounted")]
    AlreadyMounted,

    #[error("not mounted")]
    NotMounted,

    #[error("listener registration failed: {0}")]
    Registration(#[from] EventTargetError),
}

/// A component that consumes auth state while mounted in a host.
pub trait MountableAuthConsumer {
    fn on_mount(&self, host: &dyn HostComponent) -> Result<(), MountError>;

    fn on_unmount(&self, host: &dyn HostComponent) -> Result<(), MountError>;

    /// Most recently stored claims, if any.
    fn claims(&self) -> Option<Claims>;
}

/// Host with a fixed (possibly absent) widget, for tests/dev.
///
/// Records its lifecycle hook invocations so ordering can be asserted.
pub struct StaticHost {
    widget: Option<Arc<dyn EventTarget<UserChanged>>>,
    lifecycle: Mutex<Vec<&'static str>>,
}

impl StaticHost {
    pub fn new(widget: Arc<dyn EventTarget<UserChanged>>) -> Self {
        Self {
            widget: Some(widget),
            lifecycle: Mutex::new(Vec::new()),
        }
    }

    pub fn without_widget() -> Self {
        Self {
            widget: None,
            lifecycle: Mutex::new(Vec::new()),
        }
    }

    pub fn lifecycle(&self) -> Vec<&'static str> {
        self.lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, hook: &'static str) {
        self.lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hook);
    }
}

impl HostComponent for StaticHost {
    fn on_mount(&self) {
        self.record("host.on_mount");
    }

    fn on_unmount(&self) {
        self.record("host.on_unmount");
    }

    fn query_auth_widget(&self) -> Option<Arc<dyn EventTarget<UserChanged>>> {
        self.record("host.query_auth_widget");
        self.widget.clone()
    }
}
