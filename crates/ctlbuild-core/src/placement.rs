//! Artifact placement into the controller source tree
//!
//! Every operation here is idempotent: rerunning a build on an already
//! populated tree overwrites copies in place and skips renames that
//! have already happened.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

use crate::config::BuildConfig;
use crate::error::Result;

/// Repository governance files copied verbatim into the controller tree.
pub const GOVERNANCE_FILES: &[&str] = &[
    "CODE_OF_CONDUCT.md",
    "CONTRIBUTING.md",
    "GOVERNANCE.md",
    "LICENSE",
    "NOTICE",
];

/// Final name of the manifest tool's `role.yaml` output.
pub const CLUSTER_ROLE_FILE: &str = "cluster-role-controller.yaml";

/// Copy the shared CRD manifests from the runtime checkout into
/// `config/crd/common/`. A missing runtime checkout is not an error;
/// the common CRDs are simply not staged.
pub fn copy_common_crds(config: &BuildConfig) -> Result<()> {
    let source = &config.runtime_crd_dir;
    if !source.is_dir() {
        return Ok(());
    }

    let dest = config.crd_common_dir();
    fs::create_dir_all(&dest)?;

    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "yaml") {
            fs::copy(&path, dest.join(entry.file_name()))?;
        }
    }

    Ok(())
}

/// Give the manifest tool's cluster-role output a descriptive name.
/// Skips silently when the rename already happened on a previous run.
pub fn rename_cluster_role(config: &BuildConfig) -> Result<()> {
    let role = config.rbac_dir().join("role.yaml");
    if role.is_file() {
        fs::rename(&role, config.rbac_dir().join(CLUSTER_ROLE_FILE))?;
    }
    Ok(())
}

/// Copy the static namespaced-overlay patch files into the controller
/// tree. The first template directory carrying the overlay wins.
pub fn copy_namespaced_overlays(config: &BuildConfig) -> Result<()> {
    for dir in &config.template_dirs {
        let source = dir.join("config/overlays/namespaced");
        if source.is_dir() {
            return copy_tree(&source, &config.namespaced_overlay_dir());
        }
    }
    Ok(())
}

/// Copy the repository governance files into the controller tree,
/// overwriting existing copies. Files absent from the tooling root are
/// skipped.
pub fn copy_governance_files(config: &BuildConfig) -> Result<()> {
    for name in GOVERNANCE_FILES {
        let source = config.tooling_dir.join(name);
        if source.is_file() {
            fs::copy(&source, config.source_dir.join(name))?;
        }
    }
    Ok(())
}

fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(io::Error::from)?;
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
