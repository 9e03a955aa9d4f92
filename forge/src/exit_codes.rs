//! Stable exit codes for forge CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid usage, unreadable settings or other I/O errors.
pub const INVALID: i32 = 1;
/// `forge interpret` could not get a usable answer from the interpreter.
pub const ASSIST_FAILED: i32 = 2;
