//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.
//! Argument errors are reported by clap with its own exit code (2).

/// Config error - the config file is malformed or has invalid values
pub const CONFIG_ERROR: i32 = 2;

/// Build error - the resource tree could not be built or synthesized
pub const BUILD_ERROR: i32 = 3;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;
