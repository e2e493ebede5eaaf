//! Exit codes for the CLI.
//!
//! These follow common Unix conventions and provide meaningful
//! status information for scripting and automation.

/// Successful execution
pub const SUCCESS: u8 = 0;

/// General/unspecified error
pub const GENERAL_ERROR: u8 = 1;

/// Command-line usage error (bad arguments, unusable share configuration)
pub const USAGE_ERROR: u8 = 2;

/// The mount daemon refused our credential for the export
pub const AUTH_FAILED: u8 = 3;

/// Permission denied by the NFS server or the local filesystem
pub const PERMISSION_DENIED: u8 = 5;

/// Server unreachable, or the mount handshake failed
pub const MOUNT_FAILED: u8 = 6;

/// File, directory or export not found
pub const NOT_FOUND: u8 = 7;

/// Operation cancelled or interrupted
pub const CANCELLED: u8 = 8;
