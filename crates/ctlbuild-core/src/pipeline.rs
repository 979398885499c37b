//! The build pipeline
//!
//! Strictly sequential, fail-fast: two code-generator invocations, three
//! manifest-tool invocations, artifact placement, a formatting pass.
//! Each external failure is classified so the CLI can map it to the
//! right exit code.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use crate::config::BuildConfig;
use crate::error::{BuildError, Result};
use crate::exec::{self, ToolFailure};
use crate::placement;
use crate::tools;

/// The two modes of the external code generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorMode {
    /// Generate the Kubernetes API type definitions.
    Apis,
    /// Generate the controller business logic.
    Controller,
}

impl GeneratorMode {
    fn as_arg(self) -> &'static str {
        match self {
            GeneratorMode::Apis => "apis",
            GeneratorMode::Controller => "controller",
        }
    }
}

impl fmt::Display for GeneratorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}

/// The three manifest-tool passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestStage {
    Deepcopy,
    Crd,
    Rbac,
}

impl fmt::Display for ManifestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ManifestStage::Deepcopy => "deepcopy",
            ManifestStage::Crd => "CRD",
            ManifestStage::Rbac => "RBAC",
        };
        f.write_str(name)
    }
}

/// Driver for one controller build.
pub struct Pipeline<'a> {
    config: &'a BuildConfig,
    manifest_tool: PathBuf,
    formatter: PathBuf,
}

impl<'a> Pipeline<'a> {
    /// Gate on the external tools, then build the driver. Runs before any
    /// generation so a missing or mismatched tool fails the whole run
    /// up front.
    pub fn new(config: &'a BuildConfig) -> Result<Self> {
        let manifest_tool = tools::require_manifest_tool()?;
        let formatter = tools::require_formatter()?;
        Ok(Self::with_tools(config, manifest_tool, formatter))
    }

    /// Build a driver with explicit tool paths (used by tests).
    pub fn with_tools(config: &'a BuildConfig, manifest_tool: PathBuf, formatter: PathBuf) -> Self {
        Self {
            config,
            manifest_tool,
            formatter,
        }
    }

    /// Run the whole pipeline, reporting each step through `progress`.
    pub fn run(&self, progress: &mut dyn FnMut(&str)) -> Result<()> {
        progress("generating API types");
        self.generate(GeneratorMode::Apis)?;

        progress("generating controller code");
        self.generate(GeneratorMode::Controller)?;

        progress("generating deepcopy functions");
        self.manifest(ManifestStage::Deepcopy)?;

        progress("generating CRD manifests");
        self.manifest(ManifestStage::Crd)?;

        progress("generating RBAC manifests");
        self.manifest(ManifestStage::Rbac)?;

        progress("placing artifacts");
        placement::copy_common_crds(self.config)?;
        placement::rename_cluster_role(self.config)?;
        placement::copy_namespaced_overlays(self.config)?;

        progress("formatting generated source");
        self.format_sources()?;

        progress("copying governance files");
        placement::copy_governance_files(self.config)?;

        Ok(())
    }

    fn generate(&self, mode: GeneratorMode) -> Result<()> {
        let config = self.config;

        let mut args: Vec<OsString> = vec![
            mode.as_arg().into(),
            config.service.as_str().into(),
            "-o".into(),
            config.source_dir.clone().into(),
            "--version".into(),
            config.api_version.clone().into(),
            "--cache-dir".into(),
            config.cache_dir.clone().into(),
            "--template-dirs".into(),
            comma_joined(&config.template_dirs),
            "--sdk-version".into(),
            config.sdk_version.clone().into(),
        ];
        if let Some(path) = &config.generator_config {
            args.push("--generator-config-path".into());
            args.push(path.clone().into());
        }
        if let Some(path) = &config.metadata_config {
            args.push("--metadata-config-path".into());
            args.push(path.clone().into());
        }
        if mode == GeneratorMode::Controller {
            args.push("--service-account-name".into());
            args.push(config.service_account.clone().into());
        }

        exec::run_tool(&config.generator_bin, &args, None).map_err(|failure| match failure {
            ToolFailure::Spawn(source) => BuildError::Spawn {
                tool: config.generator_bin.display().to_string(),
                source,
            },
            ToolFailure::Exit(status) => BuildError::GeneratorFailed { mode, status },
        })
    }

    fn manifest(&self, stage: ManifestStage) -> Result<()> {
        let config = self.config;

        let (cwd, args): (PathBuf, Vec<OsString>) = match stage {
            ManifestStage::Deepcopy => {
                let header = config.boilerplate_path()?;
                (
                    config.apis_dir(),
                    vec![
                        format!("object:headerFile={}", header.display()).into(),
                        "paths=./...".into(),
                    ],
                )
            }
            ManifestStage::Crd => (
                config.apis_dir(),
                vec![
                    "crd:allowDangerousTypes=true".into(),
                    "paths=./...".into(),
                    format!(
                        "output:crd:artifacts:config={}",
                        config.crd_bases_dir().display()
                    )
                    .into(),
                ],
            ),
            ManifestStage::Rbac => (
                config.resource_pkg_dir(),
                vec![
                    format!("rbac:roleName={}", config.rbac_role_name).into(),
                    "paths=./...".into(),
                    format!("output:rbac:artifacts:config={}", config.rbac_dir().display())
                        .into(),
                ],
            ),
        };

        exec::run_tool(&self.manifest_tool, &args, Some(&cwd)).map_err(|failure| match failure {
            ToolFailure::Spawn(source) => BuildError::Spawn {
                tool: self.manifest_tool.display().to_string(),
                source,
            },
            ToolFailure::Exit(status) => BuildError::ManifestFailed { stage, status },
        })
    }

    fn format_sources(&self) -> Result<()> {
        let mut args: Vec<OsString> = vec!["-w".into()];
        for subdir in ["apis", "pkg"] {
            let dir = self.config.source_dir.join(subdir);
            if dir.is_dir() {
                args.push(dir.into());
            }
        }
        // Nothing generated yet means nothing to format.
        if args.len() == 1 {
            return Ok(());
        }

        exec::run_tool(&self.formatter, &args, None).map_err(|failure| match failure {
            ToolFailure::Spawn(source) => BuildError::Spawn {
                tool: self.formatter.display().to_string(),
                source,
            },
            ToolFailure::Exit(status) => BuildError::FormatFailed { status },
        })
    }
}

fn comma_joined(paths: &[PathBuf]) -> OsString {
    let mut joined = OsString::new();
    for (index, path) in paths.iter().enumerate() {
        if index > 0 {
            joined.push(",");
        }
        joined.push(path);
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceAlias;
    use crate::error::FailureClass;
    use std::path::Path;
    use tempfile::TempDir;

    /// A shell script that appends its working directory and arguments to
    /// `log`, then exits with `code`.
    fn fake_tool(path: &Path, log: &Path, code: i32) {
        use std::os::unix::fs::PermissionsExt;
        let script = format!(
            "#!/bin/sh\necho \"$(pwd)|$@\" >> {}\nexit {}\n",
            log.display(),
            code
        );
        std::fs::write(path, script).unwrap();
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn test_config(temp: &TempDir) -> BuildConfig {
        let source_dir = temp.path().join("s3-controller");
        std::fs::create_dir_all(source_dir.join("apis/v1alpha1")).unwrap();
        std::fs::create_dir_all(source_dir.join("pkg/resource")).unwrap();

        let templates = temp.path().join("templates");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::write(templates.join("boilerplate.txt"), "// Copyright\n").unwrap();

        BuildConfig {
            service: ServiceAlias::new("s3"),
            source_dir,
            tooling_dir: temp.path().to_path_buf(),
            generator_bin: temp.path().join("controller-codegen"),
            generator_config: None,
            metadata_config: None,
            api_version: "v1alpha1".to_string(),
            sdk_version: "v1.44.93".to_string(),
            template_dirs: vec![templates],
            service_account: "s3-controller".to_string(),
            rbac_role_name: "s3-controller".to_string(),
            runtime_crd_dir: temp.path().join("runtime/config/crd/bases"),
            cache_dir: temp.path().join("cache"),
        }
    }

    fn read_log(log: &Path) -> Vec<String> {
        std::fs::read_to_string(log)
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_generate_apis_arguments() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);
        let log = temp.path().join("gen.log");
        fake_tool(&config.generator_bin, &log, 0);

        let pipeline = Pipeline::with_tools(
            &config,
            temp.path().join("controller-gen"),
            temp.path().join("gofmt"),
        );
        pipeline.generate(GeneratorMode::Apis).unwrap();

        let lines = read_log(&log);
        assert_eq!(lines.len(), 1);
        let call = &lines[0];
        assert!(call.contains("apis s3"));
        assert!(call.contains("--version v1alpha1"));
        assert!(call.contains("--sdk-version v1.44.93"));
        assert!(call.contains("--template-dirs"));
        assert!(!call.contains("--service-account-name"));
    }

    #[test]
    fn test_generate_controller_passes_service_account() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);
        let log = temp.path().join("gen.log");
        fake_tool(&config.generator_bin, &log, 0);

        let pipeline = Pipeline::with_tools(
            &config,
            temp.path().join("controller-gen"),
            temp.path().join("gofmt"),
        );
        pipeline.generate(GeneratorMode::Controller).unwrap();

        let lines = read_log(&log);
        assert!(lines[0].contains("controller s3"));
        assert!(lines[0].contains("--service-account-name s3-controller"));
    }

    #[test]
    fn test_generator_failure_classified() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);
        fake_tool(&config.generator_bin, &temp.path().join("gen.log"), 1);

        let pipeline = Pipeline::with_tools(
            &config,
            temp.path().join("controller-gen"),
            temp.path().join("gofmt"),
        );
        let err = pipeline.generate(GeneratorMode::Apis).unwrap_err();
        assert_eq!(err.class(), FailureClass::Generator);
        assert!(err.to_string().contains("apis"));
    }

    #[test]
    fn test_apis_failure_stops_run_before_controller() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);
        let log = temp.path().join("gen.log");
        fake_tool(&config.generator_bin, &log, 1);

        let manifest_log = temp.path().join("manifest.log");
        let manifest_tool = temp.path().join("controller-gen");
        fake_tool(&manifest_tool, &manifest_log, 0);
        let formatter = temp.path().join("gofmt");
        fake_tool(&formatter, &temp.path().join("fmt.log"), 0);

        let pipeline = Pipeline::with_tools(&config, manifest_tool, formatter);
        let err = pipeline.run(&mut |_| {}).unwrap_err();

        assert_eq!(err.class(), FailureClass::Generator);
        // One generator call (apis), nothing after it.
        assert_eq!(read_log(&log).len(), 1);
        assert!(read_log(&manifest_log).is_empty());
    }

    #[test]
    fn test_manifest_stages_run_in_their_directories() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);
        let log = temp.path().join("manifest.log");
        let manifest_tool = temp.path().join("controller-gen");
        fake_tool(&manifest_tool, &log, 0);

        let pipeline = Pipeline::with_tools(&config, manifest_tool, temp.path().join("gofmt"));
        pipeline.manifest(ManifestStage::Deepcopy).unwrap();
        pipeline.manifest(ManifestStage::Crd).unwrap();
        pipeline.manifest(ManifestStage::Rbac).unwrap();

        let lines = read_log(&log);
        assert_eq!(lines.len(), 3);

        let apis_dir = config.apis_dir().canonicalize().unwrap();
        assert!(lines[0].starts_with(&format!("{}|", apis_dir.display())));
        assert!(lines[0].contains("object:headerFile="));
        assert!(lines[0].contains("boilerplate.txt"));

        assert!(lines[1].contains("crd:allowDangerousTypes=true"));
        assert!(lines[1].contains("output:crd:artifacts:config="));

        let pkg_dir = config.resource_pkg_dir().canonicalize().unwrap();
        assert!(lines[2].starts_with(&format!("{}|", pkg_dir.display())));
        assert!(lines[2].contains("rbac:roleName=s3-controller"));
    }

    #[test]
    fn test_manifest_failure_classified() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);
        let manifest_tool = temp.path().join("controller-gen");
        fake_tool(&manifest_tool, &temp.path().join("manifest.log"), 3);

        let pipeline = Pipeline::with_tools(&config, manifest_tool, temp.path().join("gofmt"));
        let err = pipeline.manifest(ManifestStage::Crd).unwrap_err();
        assert_eq!(err.class(), FailureClass::Manifest);
        assert!(err.to_string().contains("CRD"));
    }

    #[test]
    fn test_format_skipped_without_generated_dirs() {
        let temp = TempDir::new().unwrap();
        let mut config = test_config(&temp);
        config.source_dir = temp.path().join("empty-controller");
        std::fs::create_dir_all(&config.source_dir).unwrap();

        // No formatter exists at this path; the step must not try to run it.
        let pipeline = Pipeline::with_tools(
            &config,
            temp.path().join("controller-gen"),
            temp.path().join("gofmt"),
        );
        pipeline.format_sources().unwrap();
    }

    #[test]
    fn test_comma_joined() {
        let paths = vec![PathBuf::from("/a/templates"), PathBuf::from("/b/templates")];
        assert_eq!(comma_joined(&paths), "/a/templates,/b/templates");
    }
}
