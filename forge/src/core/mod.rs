//! Deterministic, pure logic for composing deployment commands.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! values and return deterministic outputs suitable for tests.

pub mod catalog;
pub mod composer;
pub mod explain;
pub mod input;
pub mod phase;
pub mod store;
pub mod types;
