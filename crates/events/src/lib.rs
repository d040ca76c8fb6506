//! Widget events and listener registration (mechanics only).

pub mod in_memory_target;
pub mod target;
pub mod user_changed;

pub use in_memory_target::InMemoryEventTarget;
pub use target::{EventTarget, EventTargetError, Listener, ListenerId};
pub use user_changed::{USER_CHANGED, UserChanged, UserChangedDetail};
