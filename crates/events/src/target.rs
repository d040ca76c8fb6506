//! Listener registration abstraction.
//!
//! An [`EventTarget`] is anything that emits named events to registered
//! listeners; in the gate's case, the embedded authentication widget.
//!
//! ## Listener identity
//!
//! Removal is by *identity*, not by behaviour: a [`Listener`] gets a fresh
//! [`ListenerId`] when it is created, and clones share that id. Wrapping the
//! same closure body in a second `Listener::new` produces a different
//! listener, so removing it is a no-op and the original stays attached.
//! Owners must therefore keep the exact `Listener` they registered and hand
//! that same value back on removal.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

/// Identity of a registered listener.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl core::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A callback registered on an [`EventTarget`].
pub struct Listener<E> {
    id: ListenerId,
    callback: Arc<dyn Fn(&E) + Send + Sync>,
}

impl<E> Listener<E> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        Self {
            id: ListenerId::new(),
            callback: Arc::new(callback),
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn call(&self, event: &E) {
        (self.callback)(event)
    }
}

impl<E> Clone for Listener<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<E> PartialEq for Listener<E> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<E> Eq for Listener<E> {}

impl<E> core::fmt::Debug for Listener<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Listener").field("id", &self.id).finish()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventTargetError {
    /// The listener table lock was poisoned by a panicking listener.
    #[error("listener table poisoned")]
    Poisoned,
}

/// Something that listeners can be attached to (DOM `EventTarget` semantics).
///
/// - Registering a listener that is already registered for the same event
///   name is a no-op.
/// - `dispatch` invokes listeners synchronously, in registration order, and
///   returns how many were invoked.
pub trait EventTarget<E>: Send + Sync {
    fn add_listener(&self, event_name: &str, listener: Listener<E>) -> Result<(), EventTargetError>;

    /// Returns `true` if `listener` was registered and has been removed.
    fn remove_listener(
        &self,
        event_name: &str,
        listener: &Listener<E>,
    ) -> Result<bool, EventTargetError>;

    fn dispatch(&self, event_name: &str, event: &E) -> Result<usize, EventTargetError>;
}

impl<E, T> EventTarget<E> for Arc<T>
where
    T: EventTarget<E> + ?Sized,
{
    fn add_listener(&self, event_name: &str, listener: Listener<E>) -> Result<(), EventTargetError> {
        (**self).add_listener(event_name, listener)
    }

    fn remove_listener(
        &self,
        event_name: &str,
        listener: &Listener<E>,
    ) -> Result<bool, EventTargetError> {
        (**self).remove_listener(event_name, listener)
    }

    fn dispatch(&self, event_name: &str, event: &E) -> Result<usize, EventTargetError> {
        (**self).dispatch(event_name, event)
    }
}
