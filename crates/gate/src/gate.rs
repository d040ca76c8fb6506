//! The claims gate component.
//!
//! Lifecycle of one cycle:
//!
//! ```text
//! Unknown ──user-change(Some)──▶ ClaimsPending ──fetch resolves──▶ ClaimsReady
//!                                                                      │
//!                                                   protection check ──┤
//!                                                                      ├─▶ Redirecting
//!                                                                      └─▶ Idle
//! ```
//!
//! A later user-change event restarts from `ClaimsPending`. A user-change
//! event without a user does nothing unless the sign-out policy is `clear`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use firefly_auth::{
    Claims, RouteDecision, TokenFetchError, TokenSource, UserHandle, decide_route,
    explain_route_decision,
};
use firefly_core::Uid;
use firefly_events::{EventTarget, Listener, USER_CHANGED, UserChanged};

use crate::config::{ClaimsRetention, GateConfig, OverlapPolicy};
use crate::host::{HostComponent, MountError, MountableAuthConsumer};
use crate::navigator::Navigator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    #[default]
    Unknown,
    ClaimsPending,
    ClaimsReady,
    Redirecting,
    Idle,
}

/// What became of one token fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Claims were replaced and the protection check ran.
    Applied(RouteDecision),

    /// The fetch failed; the failure retention policy was applied and the
    /// protection check ran against whatever claims remained.
    Failed {
        error: TokenFetchError,
        decision: RouteDecision,
    },

    /// A newer user-change event started another fetch (latest-event policy).
    Superseded,

    /// The gate was unmounted while the fetch was in flight.
    Detached,
}

/// Registered listener plus everything needed to undo the registration.
struct Registration {
    widget: Arc<dyn EventTarget<UserChanged>>,
    listener: Listener<UserChanged>,
    runtime: Handle,
}

struct Inner {
    config: GateConfig,
    tokens: Arc<dyn TokenSource>,
    navigator: Arc<dyn Navigator>,

    user: watch::Sender<Option<UserHandle>>,
    claims: watch::Sender<Option<Claims>>,
    /// Uid whose token the stored claims came from.
    claims_owner: Mutex<Option<Uid>>,
    state: Mutex<GateState>,

    /// Bumped on every user-change event.
    generation: AtomicU64,
    /// Bumped on every unmount; fetches started before it are detached.
    detach_epoch: AtomicU64,

    registration: Mutex<Option<Registration>>,
}

/// Keeps a host's custom claims current and enforces the protected-route
/// policy. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ClaimsGate {
    inner: Arc<Inner>,
}

impl ClaimsGate {
    pub fn new(
        tokens: Arc<dyn TokenSource>,
        navigator: Arc<dyn Navigator>,
        config: GateConfig,
    ) -> Self {
        let (user, _) = watch::channel(None);
        let (claims, _) = watch::channel(None);

        Self {
            inner: Arc::new(Inner {
                config,
                tokens,
                navigator,
                user,
                claims,
                claims_owner: Mutex::new(None),
                state: Mutex::new(GateState::Unknown),
                generation: AtomicU64::new(0),
                detach_epoch: AtomicU64::new(0),
                registration: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.inner.config
    }

    pub fn user(&self) -> Option<UserHandle> {
        self.inner.user.borrow().clone()
    }

    /// Set the observable user directly. Does not fetch claims.
    pub fn set_user(&self, user: Option<UserHandle>) {
        self.inner.user.send_replace(user);
    }

    pub fn subscribe_user(&self) -> watch::Receiver<Option<UserHandle>> {
        self.inner.user.subscribe()
    }

    /// Observe claims; every replacement (or clear) notifies receivers.
    pub fn subscribe_claims(&self) -> watch::Receiver<Option<Claims>> {
        self.inner.claims.subscribe()
    }

    pub fn state(&self) -> GateState {
        *self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_mounted(&self) -> bool {
        self.inner
            .registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// React to a `user-changed` notification.
    ///
    /// With a user present, spawns a forced-refresh token fetch and returns
    /// its handle; the stored claims are replaced when it resolves. Without
    /// a user, applies the sign-out policy and returns `None`.
    ///
    /// A sign-in event that arrives with no async runtime available is
    /// dropped whole: neither the observable user nor the event generation
    /// changes.
    pub fn handle_user_change(&self, event: &UserChanged) -> Option<JoinHandle<RefreshOutcome>> {
        let Some(user) = event.user().cloned() else {
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            self.inner.user.send_replace(None);
            self.handle_sign_out();
            return None;
        };

        let Some(runtime) = self.runtime() else {
            tracing::error!(uid = %user.uid, "no async runtime; cannot fetch claims");
            return None;
        };

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.user.send_replace(Some(user.clone()));

        tracing::debug!(uid = %user.uid, generation, "user changed; refreshing claims");
        self.set_state(GateState::ClaimsPending);

        let epoch = self.inner.detach_epoch.load(Ordering::SeqCst);
        let gate = self.clone();
        Some(runtime.spawn(async move { gate.refresh(user, generation, epoch).await }))
    }

    /// Run the protection check against the navigator's current location.
    pub fn protection_check(&self) -> RouteDecision {
        let location = self.inner.navigator.current_path();
        self.protection_check_at(&location)
    }

    /// Run the protection check against an explicit location, redirecting
    /// through the navigator if the stored claims do not authorize it.
    pub fn protection_check_at(&self, location: &str) -> RouteDecision {
        let claims = self.inner.claims.borrow().clone();
        let decision = decide_route(claims.as_ref(), location);

        match decision {
            RouteDecision::Redirect { to } => {
                let explanation = explain_route_decision(claims.as_ref(), location);
                tracing::info!(
                    path = %explanation.path,
                    to,
                    reason = %explanation.reason,
                    "protected route denied; redirecting"
                );
                self.set_state(GateState::Redirecting);
                self.inner.navigator.redirect(to);
            }
            RouteDecision::Allow => {
                self.set_state(GateState::Idle);
            }
        }

        decision
    }

    async fn refresh(&self, user: UserHandle, generation: u64, epoch: u64) -> RefreshOutcome {
        let result = self.inner.tokens.get_id_token_result(&user, true).await;

        if self.inner.detach_epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!(uid = %user.uid, "gate unmounted during fetch; dropping result");
            return RefreshOutcome::Detached;
        }

        if self.inner.config.overlap == OverlapPolicy::LatestEvent
            && self.inner.generation.load(Ordering::SeqCst) != generation
        {
            tracing::debug!(uid = %user.uid, generation, "stale fetch superseded; dropping result");
            return RefreshOutcome::Superseded;
        }

        match result {
            Ok(token) => {
                tracing::debug!(uid = %user.uid, claims = token.claims.len(), "claims refreshed");
                *self.lock_owner() = Some(user.uid.clone());
                self.inner.claims.send_replace(Some(token.into_claims()));
                self.set_state(GateState::ClaimsReady);
                RefreshOutcome::Applied(self.protection_check())
            }
            Err(error) => {
                tracing::warn!(uid = %user.uid, error = %error, "claims refresh failed");
                let owned = self.lock_owner().as_ref() == Some(&user.uid);
                if !owned {
                    tracing::debug!(uid = %user.uid, "stored claims belong to another user; clearing");
                    self.clear_claims();
                } else if self.inner.config.fetch_failure == ClaimsRetention::Clear {
                    self.clear_claims();
                }
                let decision = self.protection_check();
                RefreshOutcome::Failed { error, decision }
            }
        }
    }

    fn handle_sign_out(&self) {
        match self.inner.config.sign_out {
            ClaimsRetention::Retain => {
                tracing::debug!("user signed out; claims retained");
            }
            ClaimsRetention::Clear => {
                tracing::debug!("user signed out; clearing claims");
                self.clear_claims();
                self.set_state(GateState::Unknown);
            }
        }
    }

    fn clear_claims(&self) {
        *self.lock_owner() = None;
        self.inner.claims.send_if_modified(|claims| claims.take().is_some());
    }

    fn lock_owner(&self) -> MutexGuard<'_, Option<Uid>> {
        self.inner
            .claims_owner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: GateState) {
        *self.inner.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn runtime(&self) -> Option<Handle> {
        let registered = self
            .inner
            .registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|r| r.runtime.clone());

        registered.or_else(|| Handle::try_current().ok())
    }

    /// Build the listener registered on the widget. Holds only a weak
    /// reference so the widget does not keep the gate alive.
    fn make_listener(&self) -> Listener<UserChanged> {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        Listener::new(move |event: &UserChanged| {
            if let Some(inner) = weak.upgrade() {
                let gate = ClaimsGate { inner };
                // Detached: resolution is observed through the claims channel.
                let _ = gate.handle_user_change(event);
            }
        })
    }
}

impl MountableAuthConsumer for ClaimsGate {
    fn on_mount(&self, host: &dyn HostComponent) -> Result<(), MountError> {
        if self.is_mounted() {
            return Err(MountError::AlreadyMounted);
        }

        host.on_mount();

        let runtime = Handle::try_current().map_err(|_| MountError::NoRuntime)?;
        let widget = host.query_auth_widget().ok_or(MountError::WidgetMissing)?;

        let listener = self.make_listener();
        widget.add_listener(USER_CHANGED, listener.clone())?;
        tracing::info!(listener = %listener.id(), "claims gate mounted");

        *self
            .inner
            .registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Registration {
            widget,
            listener,
            runtime,
        });

        Ok(())
    }

    fn on_unmount(&self, host: &dyn HostComponent) -> Result<(), MountError> {
        let registration = self
            .inner
            .registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(MountError::NotMounted)?;

        host.on_unmount();

        self.inner.detach_epoch.fetch_add(1, Ordering::SeqCst);

        let removed = registration
            .widget
            .remove_listener(USER_CHANGED, &registration.listener)?;
        if removed {
            tracing::info!(listener = %registration.listener.id(), "claims gate unmounted");
        } else {
            tracing::warn!(listener = %registration.listener.id(), "listener was already detached from widget");
        }

        Ok(())
    }

    fn claims(&self) -> Option<Claims> {
        self.inner.claims.borrow().clone()
    }
}

impl core::fmt::Debug for ClaimsGate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClaimsGate")
            .field("config", &self.inner.config)
            .field("state", &self.state())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}
