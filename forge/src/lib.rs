//! Composer for MOGEND/Datafari `ansible-playbook` deployment commands.
//!
//! An operator picks an environment, host groups, a phase or individual tags
//! and a handful of execution options; the crate turns that selection into a
//! single copy-pasteable shell command. The architecture keeps a strict split:
//!
//! - **[`core`]**: Pure, deterministic logic (configuration transitions,
//!   command composition, explanation). No I/O.
//! - **[`io`]**: Settings files, prompt rendering and child processes.
//! - **[`agents`]**: The natural-language interpreter built on top of `io`.
//!
//! [`session`] ties the three together for the CLI and the session server.

pub mod agents;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
