//! Standard exit codes for CLI operations

#![allow(dead_code)]

/// Success - operation completed without findings
pub const SUCCESS: i32 = 0;

/// Partial - doctor findings present, drift detected, or the invocation
/// deadline was exceeded
pub const PARTIAL: i32 = 1;

/// Invocation error - invalid arguments, filters, or context
pub const INVOCATION_ERROR: i32 = 2;

/// Access denied or cluster unreachable
pub const ACCESS_DENIED: i32 = 3;
