//! Demo: run one user-change cycle against in-memory collaborators.
//!
//! ```text
//! FIREFLY_PATH=/settings-profile FIREFLY_UID=u2 FIREFLY_CLAIMS='{"isAdmin":false}' \
//!     cargo run -p firefly-gate --bin firefly-gate-demo
//! ```

use std::sync::Arc;

use anyhow::Context;

use firefly_auth::{Claims, StaticTokenSource, UserHandle, explain_route_decision};
use firefly_core::Uid;
use firefly_events::{EventTarget, InMemoryEventTarget, USER_CHANGED, UserChanged};
use firefly_gate::{
    ClaimsGate, GateConfig, InMemoryNavigator, MountableAuthConsumer, Navigator, StaticHost,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    firefly_observability::init();

    let path = std::env::var("FIREFLY_PATH").unwrap_or_else(|_| "/settings".to_string());
    let uid = std::env::var("FIREFLY_UID").unwrap_or_else(|_| "demo".to_string());
    let raw_claims = std::env::var("FIREFLY_CLAIMS").unwrap_or_else(|_| "{}".to_string());

    let uid = Uid::parse(uid).context("FIREFLY_UID")?;
    let claims = Claims::from_json(serde_json::from_str(&raw_claims).context("FIREFLY_CLAIMS")?)
        .context("FIREFLY_CLAIMS")?;
    let config = GateConfig::from_env()?;

    let widget: Arc<InMemoryEventTarget<UserChanged>> = Arc::new(InMemoryEventTarget::new());
    let host = StaticHost::new(widget.clone());
    let navigator = Arc::new(InMemoryNavigator::new(path.clone()));
    let tokens = Arc::new(StaticTokenSource::new().with_claims(uid.clone(), claims));

    let gate = ClaimsGate::new(tokens, navigator.clone(), config);
    gate.on_mount(&host)?;

    let mut claims_rx = gate.subscribe_claims();
    let delivered = widget.dispatch(USER_CHANGED, &UserChanged::signed_in(UserHandle::new(uid)))?;
    tracing::info!(delivered, "user-changed dispatched");

    claims_rx
        .changed()
        .await
        .context("claims channel closed before refresh completed")?;

    let stored = gate.claims();
    let report = serde_json::json!({
        "config": gate.config(),
        "requested_path": path,
        "claims": stored,
        "decision": explain_route_decision(stored.as_ref(), &path),
        "state": gate.state(),
        "final_path": navigator.current_path(),
        "redirects": navigator.redirects(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    gate.on_unmount(&host)?;
    Ok(())
}
