//! Build error types

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::{GeneratorMode, ManifestStage};

/// How a finished external tool ended: an exit code, or death by signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolExit(pub Option<i32>);

impl fmt::Display for ToolExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(code) => write!(f, "exit code {}", code),
            None => write!(f, "terminated by signal"),
        }
    }
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Controller source tree not found: {}", path.display())]
    SourceTreeMissing { path: PathBuf },

    #[error("Code generator not found: {name}")]
    GeneratorNotFound { name: String },

    #[error("Manifest tool not found: {name}")]
    ManifestToolNotFound { name: String },

    #[error("Manifest tool version mismatch: found {found}, need {required}")]
    ManifestToolVersion { found: String, required: String },

    #[error("Could not read a version from `{tool} --version` output")]
    ManifestToolVersionUnreadable { tool: String },

    #[error("Formatter not found: {name}")]
    FormatterNotFound { name: String },

    #[error("Invalid {kind} config {}: {message}", path.display())]
    InvalidConfigFile {
        kind: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error("SDK version not found in {}", path.display())]
    SdkVersionNotFound { path: PathBuf },

    #[error("No boilerplate.txt found in any template directory")]
    BoilerplateMissing,

    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Code generator failed in {mode} mode ({status})")]
    GeneratorFailed { mode: GeneratorMode, status: ToolExit },

    #[error("Manifest generation failed in the {stage} step ({status})")]
    ManifestFailed { stage: ManifestStage, status: ToolExit },

    #[error("Source formatting failed ({status})")]
    FormatFailed { status: ToolExit },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse failure classification the CLI turns into process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Usage, environment, or configuration problem.
    Environment,
    /// The external code generator exited nonzero.
    Generator,
    /// The external manifest tool exited nonzero.
    Manifest,
}

impl BuildError {
    pub fn class(&self) -> FailureClass {
        match self {
            BuildError::GeneratorFailed { .. } => FailureClass::Generator,
            BuildError::ManifestFailed { .. } => FailureClass::Manifest,
            _ => FailureClass::Environment,
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
