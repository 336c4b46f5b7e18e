//! Deterministic, pure logic shared by the gate.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and explicit timestamps and return deterministic outputs suitable for
//! tests.

pub mod admission;
pub mod affordance;
pub mod answer;
pub mod countdown;
pub mod progress;
pub mod reveal;
pub mod types;
