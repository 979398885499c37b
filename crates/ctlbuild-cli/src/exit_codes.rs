//! Exit codes for the build pipeline
//!
//! The pipeline distinguishes where a run died so callers (CI, make
//! targets) can react without parsing stderr.

/// Success - the controller tree was fully regenerated
pub const SUCCESS: i32 = 0;

/// Usage, environment, or configuration error - bad arguments, missing
/// source tree, missing or mismatched external tool, malformed config
pub const CONFIG_ERROR: i32 = 1;

/// The external code generator exited nonzero
pub const GENERATOR_ERROR: i32 = 2;

/// The external manifest tool exited nonzero
pub const MANIFEST_ERROR: i32 = 3;
