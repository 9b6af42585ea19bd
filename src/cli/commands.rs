//! Command dispatch

use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::api;
use crate::application::{StoreResultExt, TreeDisplayExporter};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::{PatientId, ProviderId, TreatmentId};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Commands::Completion { shell } => cmd_completion(*shell),
        Commands::Config { command } => cmd_config(cli.config.as_deref(), command),
        command => {
            let settings = Settings::load(cli.config.as_deref())?;
            let container = ServiceContainer::new(settings)?;
            match command {
                Commands::Serve { bind } => cmd_serve(container, bind.as_deref()),
                Commands::Upload { file } => cmd_upload(&container, file),
                Commands::Patient { id } => cmd_patient(&container, id),
                Commands::Provider { id } => cmd_provider(&container, id),
                Commands::Treatment {
                    provider_id,
                    treatment_id,
                    tree,
                } => cmd_treatment(&container, provider_id, treatment_id, *tree),
                Commands::Reset { yes } => cmd_reset(&container, *yes),
                Commands::Completion { .. } | Commands::Config { .. } => Ok(()),
            }
        }
    }
}

#[instrument(skip(container))]
fn cmd_serve(container: ServiceContainer, bind: Option<&str>) -> CliResult<()> {
    let bind = bind
        .map(str::to_string)
        .unwrap_or_else(|| container.settings.server.bind.clone());
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| InfraError::io("start tokio runtime", e))?;
    output::action("Serving", &bind);
    runtime.block_on(api::serve(Arc::new(container), &bind))?;
    Ok(())
}

#[instrument(skip(container))]
fn cmd_upload(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let content = container
        .fs
        .read_to_string(file)
        .map_err(|e| InfraError::io(format!("read {}", file.display()), e))?;
    let summary = container.uploads.upload(content.as_bytes())?;
    output::success(&format!("Uploaded {}", file.display()));
    output::detail(&format!("providers:  {}", summary.providers));
    output::detail(&format!("patients:   {}", summary.patients));
    output::detail(&format!("treatments: {}", summary.treatments));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_patient(container: &ServiceContainer, id: &str) -> CliResult<()> {
    let id: PatientId = id.parse()?;
    let patient = container.patients.get_patient(id, true)?;
    print_json(&patient)
}

#[instrument(skip(container))]
fn cmd_provider(container: &ServiceContainer, id: &str) -> CliResult<()> {
    let id: ProviderId = id.parse()?;
    let provider = container.providers.get_provider(id, true)?;
    print_json(&provider)
}

#[instrument(skip(container))]
fn cmd_treatment(
    container: &ServiceContainer,
    provider_id: &str,
    treatment_id: &str,
    tree: bool,
) -> CliResult<()> {
    let provider: ProviderId = provider_id.parse()?;
    let treatment: TreatmentId = treatment_id.parse()?;
    let dto = container.providers.get_treatment(provider, treatment)?;
    if !tree {
        return print_json(&dto);
    }
    let rendered = dto.into_treatment().export(&mut TreeDisplayExporter)?;
    output::info(&rendered);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_reset(container: &ServiceContainer, yes: bool) -> CliResult<()> {
    let counts = container.store.counts().with_context("count records")?;
    debug!("reset: {:?}", counts);
    if !yes {
        output::header("This removes every record:");
        output::detail(&format!("providers:  {}", counts.providers));
        output::detail(&format!("patients:   {}", counts.patients));
        output::detail(&format!("treatments: {}", counts.treatments));
        if !confirm("Continue? [y/N]")? {
            output::warning("aborted, nothing removed");
            return Ok(());
        }
    }
    container.patients.remove_all()?;
    container.providers.remove_all()?;
    output::success("All records removed");
    Ok(())
}

#[instrument]
fn cmd_config(explicit: Option<&Path>, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(explicit)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Init { force } => {
            let path = global_config_path()
                .ok_or_else(|| CliError::Usage("cannot determine config directory".into()))?;
            if path.exists() && !force {
                return Err(CliError::Usage(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
            }
            std::fs::write(&path, Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::action("Created", &path.display());
        }
        ConfigCommands::Path => {
            output::header("Config files (lowest to highest precedence):");
            match global_config_path() {
                Some(path) => output::detail(&format!(
                    "global:   {} ({})",
                    path.display(),
                    if path.exists() { "exists" } else { "missing" }
                )),
                None => output::detail("global:   <unavailable>"),
            }
            if let Some(path) = explicit {
                output::detail(&format!("explicit: {}", path.display()));
            }
            output::detail("env:      CLINIC_*");
        }
    }
    Ok(())
}

fn cmd_completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(InfraError::from)?;
    output::info(&json);
    Ok(())
}

fn confirm(question: &str) -> CliResult<bool> {
    output::prompt(question);
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|e| InfraError::io("read confirmation", e))?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
