//! Dependency queries against a Go module manifest
//!
//! The controller source tree pins its cloud SDK in `go.mod`; the
//! generator needs that version string on its command line. Reading the
//! file directly keeps the Go toolchain out of the loop.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::{BuildError, Result};

/// Version of `module` required by the `go.mod` at `path`.
pub fn sdk_version(path: &Path, module: &str) -> Result<String> {
    let text = fs::read_to_string(path).map_err(|_| BuildError::SdkVersionNotFound {
        path: path.to_path_buf(),
    })?;

    parse_require_version(&text, module).ok_or_else(|| BuildError::SdkVersionNotFound {
        path: path.to_path_buf(),
    })
}

/// Pull the version out of a require directive, in either form:
///
/// ```text
/// require github.com/aws/aws-sdk-go v1.44.93
/// require (
///     github.com/aws/aws-sdk-go v1.44.93
/// )
/// ```
pub(crate) fn parse_require_version(text: &str, module: &str) -> Option<String> {
    let pattern = format!(r"(?m)^\s*(?:require\s+)?{}\s+(v[0-9]\S*)", regex::escape(module));
    let re = Regex::new(&pattern).ok()?;
    re.captures(text).map(|caps| caps[1].to_string())
}
