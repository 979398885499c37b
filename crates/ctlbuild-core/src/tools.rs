//! External tool discovery and version gating

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{BuildError, Result};

/// Name of the Kubernetes manifest/deepcopy generator.
pub const MANIFEST_TOOL: &str = "controller-gen";

/// The exact manifest-tool release the generated code is tested against.
pub const MANIFEST_TOOL_VERSION: &str = "v0.16.2";

/// Name of the Go source formatter.
pub const FORMATTER: &str = "gofmt";

/// Search the process PATH for an executable named `name`.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    find_in_dirs(name, env::split_paths(&path))
}

/// PATH-order search across an explicit list of directories.
pub fn find_in_dirs(name: &str, dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    dirs.into_iter()
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.is_file()
        && path
            .metadata()
            .map(|meta| meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Locate the manifest tool and verify it reports the pinned version.
///
/// Generated deepcopy/CRD output differs across controller-gen releases,
/// so anything but the pinned version is fatal.
pub fn require_manifest_tool() -> Result<PathBuf> {
    let tool = find_in_path(MANIFEST_TOOL).ok_or_else(|| BuildError::ManifestToolNotFound {
        name: MANIFEST_TOOL.to_string(),
    })?;

    let output = Command::new(&tool)
        .arg("--version")
        .output()
        .map_err(|err| BuildError::Spawn {
            tool: MANIFEST_TOOL.to_string(),
            source: err,
        })?;

    let text = String::from_utf8_lossy(&output.stdout);
    let found = parse_reported_version(&text).ok_or_else(|| {
        BuildError::ManifestToolVersionUnreadable {
            tool: MANIFEST_TOOL.to_string(),
        }
    })?;

    let required = MANIFEST_TOOL_VERSION.trim_start_matches('v');
    if found.to_string() != required {
        return Err(BuildError::ManifestToolVersion {
            found: format!("v{found}"),
            required: MANIFEST_TOOL_VERSION.to_string(),
        });
    }

    Ok(tool)
}

/// Locate the Go formatter on PATH.
pub fn require_formatter() -> Result<PathBuf> {
    find_in_path(FORMATTER).ok_or_else(|| BuildError::FormatterNotFound {
        name: FORMATTER.to_string(),
    })
}

/// Pull a semantic version out of `controller-gen --version` output
/// ("Version: v0.16.2").
pub(crate) fn parse_reported_version(output: &str) -> Option<semver::Version> {
    output
        .split_whitespace()
        .filter_map(|token| {
            let stripped = token.strip_prefix('v')?;
            semver::Version::parse(stripped).ok()
        })
        .next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn make_executable(path: &Path) {
        use std::os::unix::fs::PermissionsExt;
        std::fs::write(path, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn test_find_in_dirs_honors_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        make_executable(&first.path().join("controller-gen"));
        make_executable(&second.path().join("controller-gen"));

        let found = find_in_dirs(
            "controller-gen",
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
        )
        .unwrap();
        assert_eq!(found, first.path().join("controller-gen"));
    }

    #[test]
    #[cfg(unix)]
    fn test_find_in_dirs_skips_non_executable() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("controller-gen"), "not a program").unwrap();

        assert_eq!(
            find_in_dirs("controller-gen", vec![dir.path().to_path_buf()]),
            None
        );
    }

    #[test]
    fn test_find_in_dirs_missing() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            find_in_dirs("controller-gen", vec![dir.path().to_path_buf()]),
            None
        );
    }

    #[test]
    fn test_parse_reported_version() {
        let version = parse_reported_version("Version: v0.16.2\n").unwrap();
        assert_eq!(version, semver::Version::new(0, 16, 2));
    }

    #[test]
    fn test_parse_reported_version_bare_line() {
        let version = parse_reported_version("v0.14.0").unwrap();
        assert_eq!(version, semver::Version::new(0, 14, 0));
    }

    #[test]
    fn test_parse_reported_version_garbage() {
        assert_eq!(parse_reported_version("no version here"), None);
        assert_eq!(parse_reported_version(""), None);
    }
}
