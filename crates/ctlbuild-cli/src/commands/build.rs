//! Build command - resolve the configuration and run the full pipeline

use console::style;
use std::env;

use ctlbuild_core::config::{BuildConfig, Overrides, Roots, ServiceAlias};
use ctlbuild_core::pipeline::Pipeline;

use crate::Cli;
use crate::error::{CliError, Result};

pub fn run(cli: &Cli) -> Result<()> {
    let service = ServiceAlias::new(&cli.service);
    if service.is_empty() {
        return Err(CliError::config("service alias must not be empty"));
    }

    let tooling = env::current_dir()
        .map_err(|err| CliError::config(format!("cannot determine current directory: {err}")))?;
    let roots = Roots::from_tooling_dir(tooling);

    let overrides = Overrides {
        cache_dir: cli.cache_dir.clone(),
        generator_bin: cli.generator_bin.clone(),
        api_version: cli.api_version.clone(),
        generator_config: cli.generator_config.clone(),
        metadata_config: cli.metadata_config.clone(),
        service_account: cli.service_account.clone(),
        sdk_version: cli.sdk_version.clone(),
        template_dirs: cli.template_dirs.clone(),
        rbac_role_name: cli.rbac_role_name.clone(),
        runtime_crd_dir: cli.runtime_crd_dir.clone(),
    };

    let config = BuildConfig::resolve(service, &roots, &overrides)?;

    println!(
        "{} building controller for {} (API {})",
        style("→").blue(),
        style(config.service.as_str()).cyan().bold(),
        style(&config.api_version).dim()
    );

    let pipeline = Pipeline::new(&config)?;
    pipeline.run(&mut |step| {
        println!("  {} {}", style("→").blue(), step);
    })?;

    println!(
        "{} controller source updated at {}",
        style("✓").green().bold(),
        style(config.source_dir.display()).dim()
    );

    Ok(())
}
