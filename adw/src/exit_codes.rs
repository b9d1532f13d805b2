//! Stable exit codes for `adw` commands.

/// Every stage of the workflow succeeded.
pub const OK: i32 = 0;
/// A stage failed, a required artifact was missing, the branch was refused,
/// an external tool could not be launched, or setup (config, workdir) failed.
pub const FAILED: i32 = 1;
