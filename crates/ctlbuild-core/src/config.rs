//! Build configuration resolution
//!
//! Every tunable resolves through the same precedence chain:
//! explicit override → discovered file → computed default. The result
//! is a single `BuildConfig` built once at startup and passed by
//! reference to every pipeline step, so no step reads the environment
//! on its own.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BuildError, Result};
use crate::gomod;
use crate::tools;

/// Default version of the generated Kubernetes API group.
pub const DEFAULT_API_VERSION: &str = "v1alpha1";

/// Name of the code generator binary searched for on PATH.
pub const GENERATOR_BIN_NAME: &str = "controller-codegen";

/// Go module whose version in the controller tree's go.mod pins the cloud SDK.
pub const SDK_MODULE: &str = "github.com/aws/aws-sdk-go";

/// Lowercased short identifier for the targeted cloud service ("s3", "sqs", ...).
///
/// All derived paths and arguments use the lowercased form, whatever
/// casing the user typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAlias(String);

impl ServiceAlias {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Directory (and default role/service-account) name for the controller.
    pub fn controller_name(&self) -> String {
        format!("{}-controller", self.0)
    }
}

impl fmt::Display for ServiceAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the tooling and the controller source trees live.
#[derive(Debug, Clone)]
pub struct Roots {
    /// Directory holding `templates/` and the governance files (normally cwd).
    pub tooling: PathBuf,
    /// Directory under which `<service>-controller` trees sit.
    pub workspace: PathBuf,
}

impl Roots {
    /// Derive both roots from the tooling directory: controller trees are
    /// checked out as siblings of the tooling repository.
    pub fn from_tooling_dir(tooling: impl Into<PathBuf>) -> Self {
        let tooling = tooling.into();
        let workspace = tooling
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| tooling.clone());
        Self { tooling, workspace }
    }
}

/// Raw optional inputs, one per environment variable / CLI flag.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub cache_dir: Option<PathBuf>,
    pub generator_bin: Option<PathBuf>,
    pub api_version: Option<String>,
    pub generator_config: Option<PathBuf>,
    pub metadata_config: Option<PathBuf>,
    pub service_account: Option<String>,
    pub sdk_version: Option<String>,
    /// Colon-separated list of template directories.
    pub template_dirs: Option<String>,
    pub rbac_role_name: Option<String>,
    pub runtime_crd_dir: Option<PathBuf>,
}

/// The fully resolved parameter set for one build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub service: ServiceAlias,
    /// The controller source tree being written into.
    pub source_dir: PathBuf,
    /// Directory holding templates/ and the governance files.
    pub tooling_dir: PathBuf,
    pub generator_bin: PathBuf,
    pub generator_config: Option<PathBuf>,
    pub metadata_config: Option<PathBuf>,
    pub api_version: String,
    pub sdk_version: String,
    /// Template search path, highest priority first.
    pub template_dirs: Vec<PathBuf>,
    pub service_account: String,
    pub rbac_role_name: String,
    pub runtime_crd_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl BuildConfig {
    /// Resolve the full parameter set for `service`.
    ///
    /// Fails before any external tool runs: missing source tree, missing
    /// generator binary, malformed config file and absent SDK version are
    /// all caught here.
    pub fn resolve(service: ServiceAlias, roots: &Roots, overrides: &Overrides) -> Result<Self> {
        let source_dir = roots.workspace.join(service.controller_name());
        if !source_dir.is_dir() {
            return Err(BuildError::SourceTreeMissing { path: source_dir });
        }

        let generator_bin = match &overrides.generator_bin {
            Some(path) if path.is_file() => path.clone(),
            Some(path) => {
                return Err(BuildError::GeneratorNotFound {
                    name: path.display().to_string(),
                });
            }
            None => {
                tools::find_in_path(GENERATOR_BIN_NAME).ok_or_else(|| {
                    BuildError::GeneratorNotFound {
                        name: GENERATOR_BIN_NAME.to_string(),
                    }
                })?
            }
        };

        let generator_config = discover_config(
            overrides.generator_config.as_deref(),
            &source_dir,
            "generator.yaml",
            "generator",
        )?;
        let metadata_config = discover_config(
            overrides.metadata_config.as_deref(),
            &source_dir,
            "metadata.yaml",
            "metadata",
        )?;

        let api_version = overrides
            .api_version
            .clone()
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        let sdk_version = match &overrides.sdk_version {
            Some(version) => version.clone(),
            None => gomod::sdk_version(&source_dir.join("go.mod"), SDK_MODULE)?,
        };

        let template_dirs = match &overrides.template_dirs {
            Some(raw) => env::split_paths(raw).collect(),
            None => {
                let mut dirs = Vec::new();
                let local = source_dir.join("templates");
                if local.is_dir() {
                    dirs.push(local);
                }
                dirs.push(roots.tooling.join("templates"));
                dirs
            }
        };

        let service_account = overrides
            .service_account
            .clone()
            .unwrap_or_else(|| service.controller_name());
        let rbac_role_name = overrides
            .rbac_role_name
            .clone()
            .unwrap_or_else(|| service.controller_name());
        let runtime_crd_dir = overrides
            .runtime_crd_dir
            .clone()
            .unwrap_or_else(|| roots.workspace.join("runtime/config/crd/bases"));
        let cache_dir = overrides.cache_dir.clone().unwrap_or_else(default_cache_dir);

        Ok(Self {
            service,
            source_dir,
            tooling_dir: roots.tooling.clone(),
            generator_bin,
            generator_config,
            metadata_config,
            api_version,
            sdk_version,
            template_dirs,
            service_account,
            rbac_role_name,
            runtime_crd_dir,
            cache_dir,
        })
    }

    /// Directory holding the generated API type definitions.
    pub fn apis_dir(&self) -> PathBuf {
        self.source_dir.join("apis").join(&self.api_version)
    }

    /// Package holding the generated controller resource code.
    pub fn resource_pkg_dir(&self) -> PathBuf {
        self.source_dir.join("pkg").join("resource")
    }

    pub fn crd_bases_dir(&self) -> PathBuf {
        self.source_dir.join("config/crd/bases")
    }

    pub fn crd_common_dir(&self) -> PathBuf {
        self.source_dir.join("config/crd/common")
    }

    pub fn rbac_dir(&self) -> PathBuf {
        self.source_dir.join("config/rbac")
    }

    pub fn namespaced_overlay_dir(&self) -> PathBuf {
        self.source_dir.join("config/overlays/namespaced")
    }

    /// First `boilerplate.txt` across the template search path.
    pub fn boilerplate_path(&self) -> Result<PathBuf> {
        self.template_dirs
            .iter()
            .map(|dir| dir.join("boilerplate.txt"))
            .find(|path| path.is_file())
            .ok_or(BuildError::BoilerplateMissing)
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("ctlbuild")
}

/// Resolve one of the optional YAML config files: explicit override wins,
/// otherwise a file of the conventional name in the source tree, otherwise
/// none (the generator falls back to its own default).
///
/// Whatever is selected must at least parse as YAML, so a broken config
/// fails here with a pointed message instead of deep inside the generator.
fn discover_config(
    override_path: Option<&Path>,
    source_dir: &Path,
    file_name: &str,
    kind: &'static str,
) -> Result<Option<PathBuf>> {
    let path = match override_path {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let candidate = source_dir.join(file_name);
            candidate.is_file().then_some(candidate)
        }
    };

    if let Some(path) = &path {
        validate_yaml(path, kind)?;
    }

    Ok(path)
}

fn validate_yaml(path: &Path, kind: &'static str) -> Result<()> {
    let text = fs::read_to_string(path).map_err(|err| BuildError::InvalidConfigFile {
        kind,
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    // An empty config file is fine; the generator treats it as defaults.
    if text.trim().is_empty() {
        return Ok(());
    }

    serde_yaml::from_str::<serde_yaml::Value>(&text).map_err(|err| {
        BuildError::InvalidConfigFile {
            kind,
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    })?;

    Ok(())
}
