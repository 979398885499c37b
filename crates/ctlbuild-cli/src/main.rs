//! ctlbuild - orchestrate code generation for a cloud-service Kubernetes controller

use clap::Parser;
use std::path::PathBuf;

mod commands;
mod error;
mod exit_codes;

#[derive(Parser)]
#[command(name = "ctlbuild")]
#[command(version)]
#[command(about = "Generate a Kubernetes controller for a cloud service", long_about = None)]
struct Cli {
    /// Service alias (case-insensitive, e.g. "s3")
    service: String,

    /// Cache directory for the code generator
    #[arg(long, env = "CTLBUILD_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Path to the code generator binary (default: controller-codegen on PATH)
    #[arg(long, env = "CTLBUILD_GENERATOR_BIN")]
    generator_bin: Option<PathBuf>,

    /// Version of the generated Kubernetes API group
    #[arg(long, env = "CTLBUILD_API_VERSION")]
    api_version: Option<String>,

    /// Generator config file (default: generator.yaml in the controller tree)
    #[arg(long, env = "CTLBUILD_GENERATOR_CONFIG")]
    generator_config: Option<PathBuf>,

    /// Metadata config file (default: metadata.yaml in the controller tree)
    #[arg(long, env = "CTLBUILD_METADATA_CONFIG")]
    metadata_config: Option<PathBuf>,

    /// Service account the generated controller runs as
    #[arg(long, env = "CTLBUILD_SERVICE_ACCOUNT")]
    service_account: Option<String>,

    /// Cloud SDK version (default: read from the controller tree's go.mod)
    #[arg(long, env = "CTLBUILD_SDK_VERSION")]
    sdk_version: Option<String>,

    /// Colon-separated template directories
    #[arg(long, env = "CTLBUILD_TEMPLATE_DIRS")]
    template_dirs: Option<String>,

    /// Name for the generated RBAC cluster role
    #[arg(long, env = "CTLBUILD_RBAC_ROLE_NAME")]
    rbac_role_name: Option<String>,

    /// Directory holding the shared runtime CRD manifests
    #[arg(long, env = "CTLBUILD_RUNTIME_CRD_DIR")]
    runtime_crd_dir: Option<PathBuf>,
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    // clap exits with 2 on usage errors by default; this tool promises 1.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                exit_codes::CONFIG_ERROR
            } else {
                // --help and --version land here
                exit_codes::SUCCESS
            };
            std::process::exit(code);
        }
    };

    if let Err(err) = commands::build::run(&cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
