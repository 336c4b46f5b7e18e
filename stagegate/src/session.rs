//! Session lifecycle: start, read and clear the absolute expiry.
//!
//! The expiry is only ever set by [`start_session`] and cleared by
//! [`clear_expiry`]. It is never edited in place.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::clock::{Clock, duration_ms};
use crate::core::types::Navigation;
use crate::io::config::StageConfig;
use crate::io::store::SessionStore;
use crate::ledger::StepLedger;

/// Store key holding the session expiry (epoch milliseconds).
pub const EXPIRY_KEY: &str = "sessionExpiry";

/// Parse a stored expiry. Empty, non-numeric or zero values are "no session".
///
/// A negative expiry is still a session: it lies in the past and expires on
/// the first countdown firing.
pub fn parse_expiry(raw: &str) -> Option<i64> {
    match raw.trim().parse::<i64>() {
        Ok(ms) if ms != 0 => Some(ms),
        _ => None,
    }
}

/// Read the stored expiry, if a valid one exists.
pub fn read_expiry<S: SessionStore + ?Sized>(store: &S) -> Result<Option<i64>> {
    let Some(raw) = store.get(EXPIRY_KEY)? else {
        return Ok(None);
    };
    let parsed = parse_expiry(&raw);
    if parsed.is_none() {
        warn!(value = %raw, "ignoring unparseable session expiry");
    }
    Ok(parsed)
}

pub fn clear_expiry<S: SessionStore + ?Sized>(store: &S) -> Result<()> {
    store.remove(EXPIRY_KEY).context("clear session expiry")?;
    debug!("session expiry cleared");
    Ok(())
}

/// Start a fresh session, replacing any previous run.
///
/// Sets the expiry to `now + session_duration`, clears every step flag and
/// navigates to the hub.
pub fn start_session<S: SessionStore + ?Sized>(
    store: &S,
    clock: &Clock,
    config: &StageConfig,
) -> Result<Navigation> {
    let expiry_ms = clock
        .now_ms()
        .saturating_add(duration_ms(config.session_duration()));
    store
        .set(EXPIRY_KEY, &expiry_ms.to_string())
        .context("store session expiry")?;
    StepLedger::new(store, config.max_steps)
        .reset_all(config.max_steps)
        .context("reset step flags")?;
    info!(expiry_ms, "session started");
    Ok(Navigation::Redirect(config.hub_page()))
}
