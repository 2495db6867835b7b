//! Command dispatch and handlers

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands, MergeArgs};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{parse_delimiter_map, TreeNodeConvert, YamlWriter};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Execute the parsed command.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    // Completion needs neither settings nor services
    if let Commands::Completion { shell } = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let project_dir = resolve_project_dir(cli.project_dir.as_deref())?;
    let settings = Settings::load(Some(&project_dir))?;
    debug!("settings: {:?}", settings);
    let container = ServiceContainer::new(settings);

    match &cli.command {
        Commands::Merge(args) => cmd_merge(&container, args),
        Commands::Check { files } => cmd_check(&container, files),
        Commands::Tree { file } => cmd_tree(&container, file),
        Commands::Config { command } => match command {
            ConfigCommands::Show => cmd_config_show(&container),
            ConfigCommands::Path => cmd_config_path(&project_dir),
        },
        Commands::Completion { .. } => Ok(()),
    }
}

fn resolve_project_dir(dir: Option<&Path>) -> CliResult<PathBuf> {
    match dir {
        Some(d) => Ok(d.to_path_buf()),
        None => std::env::current_dir()
            .map_err(|e| CliError::Infra(InfraError::io("determine working directory", e))),
    }
}

#[instrument(level = "debug", skip(container))]
fn cmd_merge(container: &ServiceContainer, args: &MergeArgs) -> CliResult<()> {
    let mut options = container.settings.to_merge_options();
    if let Some(token) = &args.deletion_token {
        options.deletion_token = token.clone();
    }
    if let Some(raw) = &args.dpl {
        // Flag entries win over configured ones per list name
        options.delimiters.extend(parse_delimiter_map(raw)?);
    }
    if args.no_strict {
        options.strict = false;
    } else if args.strict {
        options.strict = true;
    }

    if !args.check {
        if let Some(output) = &args.output {
            container.merge_service.ensure_output_available(output)?;
        }
    }

    let merged = container.merge_service.merge_files(&args.inputs, &options)?;

    if args.check {
        output::success("Merge successful.");
        return Ok(());
    }

    let indent = container.settings.output_indent;
    match &args.output {
        Some(path) => {
            container.merge_service.write_output(&merged, path, indent)?;
            output::success(&format!("Merged {} files into {}", args.inputs.len(), path.display()));
        }
        None => {
            let mut stdout = io::stdout().lock();
            YamlWriter::new(indent)
                .write(&merged, &mut stdout)
                .map_err(|e| CliError::Infra(InfraError::io("write merged document", e)))?;
        }
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_check(container: &ServiceContainer, files: &[PathBuf]) -> CliResult<()> {
    let reports = container.merge_service.check_files(files);
    let mut failed = 0;

    output::header("Checking documents:");
    for report in &reports {
        match &report.result {
            Ok(nodes) => output::success_detail(&format!("{} ({} nodes)", report.path.display(), nodes)),
            Err(e) => {
                failed += 1;
                output::failure(e);
            }
        }
    }

    if failed > 0 {
        return Err(CliError::CheckFailed {
            failed,
            total: reports.len(),
        });
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_tree(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let tree = container.merge_service.parse_file(file)?;
    output::info(&tree.to_tree_string());
    Ok(())
}

fn cmd_config_show(container: &ServiceContainer) -> CliResult<()> {
    output::info(&container.settings.to_toml()?);
    Ok(())
}

fn cmd_config_path(project_dir: &Path) -> CliResult<()> {
    output::header("Config files:");
    match global_config_path() {
        Some(path) => output::detail(&format!("global: {}", path.display())),
        None => output::detail("global: <no config directory>"),
    }
    output::detail(&format!("local:  {}", local_config_path(project_dir).display()));
    Ok(())
}
