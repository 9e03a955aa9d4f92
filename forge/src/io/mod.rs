//! I/O boundary: settings, scaffolding, prompt rendering and agent processes.
//!
//! Everything that touches the filesystem or spawns a child lives here so the
//! `core` modules stay pure.

pub mod executor;
pub mod init;
pub mod process;
pub mod prompt;
pub mod settings;
