//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Incompatible repository - the tool version is outside a repository's declared range
pub const INCOMPATIBLE: i32 = 2;

/// Repository error - malformed metadata, unusable master repository
pub const REPOSITORY_ERROR: i32 = 3;

/// Not found - unknown repository or package
pub const NOT_FOUND: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Configuration error (following sysexits.h EX_CONFIG)
pub const CONFIG_ERROR: i32 = 78;
