//! ctlbuild core - controller code generation orchestration
//!
//! This crate provides the building blocks for the `ctlbuild` CLI:
//! - `BuildConfig`: the resolved parameter set (env override → discovered file → default)
//! - `Pipeline`: the fail-fast sequence of external tool invocations
//! - `placement`: idempotent artifact placement into the controller source tree
//! - `tools`: external tool discovery and the manifest-tool version gate

pub mod config;
pub mod error;
pub mod exec;
pub mod gomod;
pub mod pipeline;
pub mod placement;
pub mod tools;

pub use config::{BuildConfig, Overrides, Roots, ServiceAlias};
pub use error::{BuildError, FailureClass, Result, ToolExit};
pub use pipeline::{GeneratorMode, ManifestStage, Pipeline};
