//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - a resource configuration was rejected
pub const VALIDATION_ERROR: i32 = 2;

/// Configuration error - unreadable workspace file or provider settings
pub const CONFIG_ERROR: i32 = 3;

/// State error - unreadable or inconsistent state file
pub const STATE_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Provider error - a service call or status wait failed
pub const PROVIDER_ERROR: i32 = 6;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
