//! Stable exit codes for stagegate CLI commands.

/// Command succeeded, the page was admitted, or the answer matched.
pub const OK: i32 = 0;
/// Command failed due to invalid config, unreadable store, bad step id or other errors.
pub const INVALID: i32 = 1;
/// `stagegate visit`/`watch` was refused and redirected elsewhere.
pub const REDIRECTED: i32 = 4;
/// `stagegate watch` (or `visit`) saw the session expire.
pub const EXPIRED: i32 = 5;
/// `stagegate check` rejected the answer.
pub const REJECTED: i32 = 6;
