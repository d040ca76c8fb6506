//! Current location and page navigation.

use std::sync::{Mutex, PoisonError};

/// Access to the host's location.
///
/// `redirect` is a *full* navigation (the current page state is discarded),
/// not an in-app route transition.
pub trait Navigator: Send + Sync {
    /// Current location; a path or a full URL.
    fn current_path(&self) -> String;

    fn redirect(&self, path: &str);
}

/// In-memory navigator for tests/dev.
///
/// A redirect updates the current path and is recorded.
#[derive(Debug)]
pub struct InMemoryNavigator {
    path: Mutex<String>,
    redirects: Mutex<Vec<String>>,
}

impl InMemoryNavigator {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Mutex::new(path.into()),
            redirects: Mutex::new(Vec::new()),
        }
    }

    /// Simulate the user navigating somewhere without a redirect.
    pub fn set_path(&self, path: impl Into<String>) {
        *self.path.lock().unwrap_or_else(PoisonError::into_inner) = path.into();
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for InMemoryNavigator {
    fn current_path(&self) -> String {
        self.path.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn redirect(&self, path: &str) {
        self.redirects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_string());
        self.set_path(path);
    }
}
