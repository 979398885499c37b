//! CLI error types with exit code handling
//!
//! Core errors are classified into the three exit-code buckets here,
//! and environment errors pick up remediation hints shown as miette
//! help text.

use ctlbuild_core::error::{BuildError, FailureClass};
use ctlbuild_core::tools;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Usage, environment, or configuration problem
    #[error("{message}")]
    #[diagnostic(code(ctlbuild::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The external code generator failed
    #[error("{message}")]
    #[diagnostic(code(ctlbuild::generator))]
    Generator { message: String },

    /// The external manifest tool failed
    #[error("{message}")]
    #[diagnostic(code(ctlbuild::manifest))]
    Manifest { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Generator { .. } => exit_codes::GENERATOR_ERROR,
            CliError::Manifest { .. } => exit_codes::MANIFEST_ERROR,
        }
    }

    /// Create a configuration error without help text
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }
}

impl From<BuildError> for CliError {
    fn from(err: BuildError) -> Self {
        let message = err.to_string();
        match err.class() {
            FailureClass::Generator => CliError::Generator { message },
            FailureClass::Manifest => CliError::Manifest { message },
            FailureClass::Environment => CliError::Config {
                message,
                help: remediation(&err),
            },
        }
    }
}

fn remediation(err: &BuildError) -> Option<String> {
    match err {
        BuildError::SourceTreeMissing { .. } => Some(
            "check the service alias, or clone the controller repository next to this one"
                .to_string(),
        ),
        BuildError::GeneratorNotFound { .. } => Some(format!(
            "install {} or point CTLBUILD_GENERATOR_BIN at it",
            ctlbuild_core::config::GENERATOR_BIN_NAME
        )),
        BuildError::ManifestToolNotFound { .. }
        | BuildError::ManifestToolVersion { .. }
        | BuildError::ManifestToolVersionUnreadable { .. } => Some(format!(
            "install the pinned version with: go install sigs.k8s.io/controller-tools/cmd/controller-gen@{}",
            tools::MANIFEST_TOOL_VERSION
        )),
        BuildError::FormatterNotFound { .. } => {
            Some("gofmt ships with the Go toolchain; make sure it is on PATH".to_string())
        }
        BuildError::SdkVersionNotFound { .. } => {
            Some("set CTLBUILD_SDK_VERSION to pin the SDK release".to_string())
        }
        _ => None,
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
