//! In-memory event target for tests/dev.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::target::{EventTarget, EventTargetError, Listener};

/// In-memory listener table.
///
/// - No IO / no async
/// - Listeners are snapshotted before dispatch, so a listener may add or
///   remove listeners while it runs
#[derive(Debug)]
pub struct InMemoryEventTarget<E> {
    listeners: Mutex<HashMap<String, Vec<Listener<E>>>>,
}

impl<E> InMemoryEventTarget<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of listeners currently registered for `event_name`.
    pub fn listener_count(&self, event_name: &str) -> usize {
        self.listeners
            .lock()
            .map(|l| l.get(event_name).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

impl<E> Default for InMemoryEventTarget<E> {
    fn default() -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
        }
    }
}

impl<E> EventTarget<E> for InMemoryEventTarget<E>
where
    E: Send + 'static,
{
    fn add_listener(&self, event_name: &str, listener: Listener<E>) -> Result<(), EventTargetError> {
        let mut table = self.listeners.lock().map_err(|_| EventTargetError::Poisoned)?;
        let entry = table.entry(event_name.to_string()).or_default();

        if entry.contains(&listener) {
            tracing::debug!(event = event_name, listener = %listener.id(), "listener already registered");
            return Ok(());
        }

        entry.push(listener);
        Ok(())
    }

    fn remove_listener(
        &self,
        event_name: &str,
        listener: &Listener<E>,
    ) -> Result<bool, EventTargetError> {
        let mut table = self.listeners.lock().map_err(|_| EventTargetError::Poisoned)?;

        let Some(entry) = table.get_mut(event_name) else {
            return Ok(false);
        };

        let before = entry.len();
        entry.retain(|l| l != listener);
        let removed = entry.len() != before;

        if entry.is_empty() {
            table.remove(event_name);
        }

        Ok(removed)
    }

    fn dispatch(&self, event_name: &str, event: &E) -> Result<usize, EventTargetError> {
        let snapshot: Vec<Listener<E>> = {
            let table = self.listeners.lock().map_err(|_| EventTargetError::Poisoned)?;
            table.get(event_name).cloned().unwrap_or_default()
        };

        for listener in &snapshot {
            listener.call(event);
        }

        Ok(snapshot.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_listener(counter: &Arc<AtomicUsize>) -> Listener<u32> {
        let counter = Arc::clone(counter);
        Listener::new(move |n: &u32| {
            counter.fetch_add(*n as usize, Ordering::SeqCst);
        })
    }

    #[test]
    fn dispatch_reaches_listeners_for_that_event_only() {
        let target = InMemoryEventTarget::new();
        let counter = Arc::new(AtomicUsize::new(0));
        target.add_listener("a", counting_listener(&counter)).unwrap();

        assert_eq!(target.dispatch("a", &2).unwrap(), 1);
        assert_eq!(target.dispatch("b", &5).unwrap(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let target = InMemoryEventTarget::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let listener = counting_listener(&counter);

        target.add_listener("a", listener.clone()).unwrap();
        target.add_listener("a", listener).unwrap();

        assert_eq!(target.listener_count("a"), 1);
        target.dispatch("a", &1).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn removal_requires_the_registered_listener() {
        let target = InMemoryEventTarget::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let registered = counting_listener(&counter);
        target.add_listener("a", registered.clone()).unwrap();

        // A freshly built listener with identical behaviour does not match.
        let lookalike = counting_listener(&counter);
        assert!(!target.remove_listener("a", &lookalike).unwrap());
        assert_eq!(target.listener_count("a"), 1);

        assert!(target.remove_listener("a", &registered).unwrap());
        assert_eq!(target.listener_count("a"), 0);

        target.dispatch("a", &1).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listener_may_deregister_itself_during_dispatch() {
        let target: Arc<InMemoryEventTarget<u32>> = Arc::new(InMemoryEventTarget::new());
        let slot: Arc<Mutex<Option<Listener<u32>>>> = Arc::new(Mutex::new(None));

        let listener = {
            let target = Arc::clone(&target);
            let slot = Arc::clone(&slot);
            Listener::new(move |_: &u32| {
                if let Some(me) = slot.lock().unwrap().take() {
                    target.remove_listener("a", &me).unwrap();
                }
            })
        };
        *slot.lock().unwrap() = Some(listener.clone());
        target.add_listener("a", listener).unwrap();

        assert_eq!(target.dispatch("a", &0).unwrap(), 1);
        assert_eq!(target.listener_count("a"), 0);
    }
}
