//! Synchronous external-tool invocation
//!
//! Every delegated tool runs to completion with inherited stdio, so its
//! diagnostics stream straight to the user. Scoped working directories
//! are handled with `Command::current_dir`: the child gets the
//! directory, the calling process never changes its own, so restoration
//! holds on every exit path by construction.

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use crate::error::ToolExit;

/// Why a tool invocation did not succeed. The caller decides how the
/// failure is classified (generator vs. manifest vs. environment).
#[derive(Debug)]
pub enum ToolFailure {
    /// The process could not be started at all.
    Spawn(std::io::Error),
    /// The process ran and exited nonzero (or died to a signal).
    Exit(ToolExit),
}

/// Run `program args...` to completion, optionally in `cwd`.
pub fn run_tool(
    program: &Path,
    args: &[OsString],
    cwd: Option<&Path>,
) -> std::result::Result<(), ToolFailure> {
    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let status = command.status().map_err(ToolFailure::Spawn)?;
    if status.success() {
        Ok(())
    } else {
        Err(ToolFailure::Exit(ToolExit(status.code())))
    }
}
