//! Session lifecycle and access control for a timed, multi-stage challenge.
//!
//! A countdown session must be active, and each page may only be entered
//! once a configured subset of steps is complete. The architecture keeps a
//! strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (admission, countdown arithmetic,
//!   hub affordances, answer normalization, reveal schedules). No I/O.
//! - **[`io`]**: Side-effecting operations (session store, configuration,
//!   on-disk layout). Injected so tests can use an in-memory store.
//!
//! Stateful components ([`ledger`], [`session`], [`timer`], [`guard`],
//! [`scheduler`]) combine into [`page::PageContext`], the per-page state
//! machine driven by the CLI.

pub mod clock;
pub mod core;
pub mod exit_codes;
pub mod guard;
pub mod io;
pub mod ledger;
pub mod logging;
pub mod page;
pub mod scheduler;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod timer;
