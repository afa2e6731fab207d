mod config;
mod prompt;
mod views;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use orbman_distro::{ActionKind, Arch, Catalog, Registry};
use orbman_machine::{ActionOutcome, BulkError, DirectoryError, MachineDirectory};
use orbman_orb::{OrbClient, OrbError};
use thiserror::Error;
use tracing::error;

use crate::config::{Config, ConfigError};

#[derive(Parser, Debug)]
#[command(
    name = "orbman",
    version,
    about = "Manage OrbStack machines. A wrapper around the orb client."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long = "config", global = true)]
    pub config_path: Option<PathBuf>,

    #[arg(long = "log", global = true, default_value = "info")]
    pub log: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a machine from a distro, version, and architecture
    Create {
        /// Name of the machine
        #[arg(short, long)]
        name: Option<String>,

        /// Distro to use
        #[arg(short, long)]
        distro: Option<String>,

        /// Distro version to use
        #[arg(long)]
        version: Option<String>,

        /// Architecture to use
        #[arg(short, long)]
        arch: Option<String>,

        /// Run every defined post-create action without asking
        #[arg(long)]
        accept: bool,
    },

    /// Destroy a machine
    Destroy {
        /// Machine name or 1-based index into the listing
        machine: Option<String>,

        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Start a machine
    Start {
        machine: Option<String>,

        /// Start every machine
        #[arg(short, long)]
        all: bool,
    },

    /// Stop a machine
    Stop {
        machine: Option<String>,

        /// Stop every machine
        #[arg(short, long)]
        all: bool,
    },

    /// Rename a machine
    Rename {
        machine: Option<String>,
        new_name: Option<String>,
    },

    /// Update and upgrade a machine
    Upgrade { machine: Option<String> },

    /// Initialise a machine with some essential packages
    Initialise { machine: Option<String> },

    /// Install the package set defined for the machine's distro
    Install { machine: Option<String> },

    /// Run the distro's post-install configuration
    Configure { machine: Option<String> },

    /// Open a shell in a machine
    Shell { machine: Option<String> },

    /// List all machines
    List,

    /// List all available distros
    Distros,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Orb(#[from] OrbError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Bulk(#[from] BulkError),

    #[error(transparent)]
    Prompt(#[from] dialoguer::Error),

    #[error("invalid distro: {distro}")]
    InvalidDistro { distro: String },

    #[error("invalid version for {distro}: {version}")]
    InvalidVersion { distro: String, version: String },

    #[error("invalid architecture: {arch}")]
    InvalidArch { arch: String },

    #[error("no machine with that name or index: {input}")]
    InvalidSelection { input: String },
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::load(cli.config_path.as_deref()).await?;
    let catalog = Catalog::builtin();

    // The distro listing needs neither the orb binary nor a machine
    // query, so answer it before touching either.
    if let Command::Distros = cli.command {
        views::print_distros(&catalog);
        return Ok(());
    }

    let client = match &config.orb {
        Some(program) => OrbClient::with_program(program),
        None => OrbClient::discover()?,
    };
    let registry = Registry::builtin();
    let mut directory = MachineDirectory::load(client, registry).await?;

    match cli.command {
        Command::Create {
            name,
            distro,
            version,
            arch,
            accept,
        } => {
            cmd_create(
                &mut directory,
                &catalog,
                &config,
                CreateArgs {
                    name,
                    distro,
                    version,
                    arch,
                    accept,
                },
            )
            .await
        }
        Command::Destroy { machine, force } => cmd_destroy(&mut directory, machine, force).await,
        Command::Start { machine, all } => cmd_start(&mut directory, machine, all).await,
        Command::Stop { machine, all } => cmd_stop(&mut directory, machine, all).await,
        Command::Rename { machine, new_name } => {
            cmd_rename(&mut directory, machine, new_name).await
        }
        Command::Upgrade { machine } => cmd_action(&mut directory, machine, ActionKind::Upgrade).await,
        Command::Initialise { machine } => {
            cmd_action(&mut directory, machine, ActionKind::Initialise).await
        }
        Command::Install { machine } => cmd_action(&mut directory, machine, ActionKind::Install).await,
        Command::Configure { machine } => {
            cmd_action(&mut directory, machine, ActionKind::Configure).await
        }
        Command::Shell { machine } => cmd_shell(&directory, machine).await,
        Command::List => {
            views::print_machines(directory.list(), false);
            Ok(())
        }
        Command::Distros => unreachable!("handled before the directory is loaded"),
    }
}

struct CreateArgs {
    name: Option<String>,
    distro: Option<String>,
    version: Option<String>,
    arch: Option<String>,
    accept: bool,
}

async fn cmd_create(
    directory: &mut MachineDirectory,
    catalog: &Catalog,
    config: &Config,
    args: CreateArgs,
) -> Result<(), AppError> {
    let name = match args.name {
        Some(name) => name,
        None => prompt::input("Enter a machine name")?,
    };

    let distro = match args.distro {
        Some(distro) => distro,
        None => {
            views::print_distros(catalog);
            let ids: Vec<&str> = catalog.ids().collect();
            let preferred = config.default_distro.as_deref().unwrap_or("ubuntu");
            let default = ids.iter().position(|id| *id == preferred).unwrap_or(0);
            ids[prompt::select("Select a distro", &ids, default)?].to_owned()
        }
    };
    if !catalog.contains(&distro) {
        return Err(AppError::InvalidDistro { distro });
    }

    let versions = catalog.versions(&distro).unwrap_or(&[]);
    let version = if versions.is_empty() {
        None
    } else {
        match args.version {
            Some(version) => {
                if !versions.contains(&version.as_str()) {
                    return Err(AppError::InvalidVersion {
                        distro: distro.clone(),
                        version,
                    });
                }
                Some(version)
            }
            None => {
                let default = catalog
                    .default_version(&distro)
                    .and_then(|preferred| versions.iter().position(|v| *v == preferred))
                    .unwrap_or(0);
                Some(versions[prompt::select("Select a version", versions, default)?].to_owned())
            }
        }
    };

    let arch = match args.arch {
        Some(arch) => arch
            .parse::<Arch>()
            .map_err(|_| AppError::InvalidArch { arch })?,
        None => {
            let labels: Vec<&str> = Arch::ALL.iter().map(Arch::as_str).collect();
            let preferred = config.default_arch.as_deref().unwrap_or("arm64");
            let default = labels.iter().position(|l| *l == preferred).unwrap_or(0);
            Arch::ALL[prompt::select("Select an architecture", &labels, default)?]
        }
    };

    let image = match &version {
        Some(version) => format!("{distro}:{version}"),
        None => distro.clone(),
    };
    if !prompt::confirm(
        &format!("About to create machine {name} with {image} {arch}. Continue?"),
        true,
    )? {
        println!("Aborted");
        return Ok(());
    }

    directory
        .create(&name, &distro, version.as_deref(), arch.as_str())
        .await?;
    println!("Machine {name} created");

    post_create_actions(directory, &name, args.accept || config.accept).await?;

    views::print_machines(directory.list(), false);
    Ok(())
}

/// Offer the machine's defined lifecycle actions in order, each gated by
/// a confirmation unless `accept` is set. Actions the distro does not
/// define are skipped without comment.
async fn post_create_actions(
    directory: &mut MachineDirectory,
    name: &str,
    accept: bool,
) -> Result<(), AppError> {
    let kinds: Vec<ActionKind> = match directory.get(name) {
        Some(record) => ActionKind::ALL
            .into_iter()
            .filter(|kind| record.command(*kind).is_some())
            .collect(),
        None => return Ok(()),
    };

    for kind in kinds {
        let go =
            accept || prompt::confirm(&format!("Do you want to {kind} the machine?"), false)?;
        if go {
            run_action(directory, name, kind).await?;
        }
    }
    Ok(())
}

async fn cmd_destroy(
    directory: &mut MachineDirectory,
    machine: Option<String>,
    force: bool,
) -> Result<(), AppError> {
    let Some(name) = resolve_target(directory, machine, "destroy")? else {
        return Ok(());
    };
    if !force && !prompt::confirm(&format!("Destroy machine {name}?"), false)? {
        println!("Aborted");
        return Ok(());
    }
    directory.destroy(&name, true).await?;
    views::print_machines(directory.list(), false);
    Ok(())
}

async fn cmd_start(
    directory: &mut MachineDirectory,
    machine: Option<String>,
    all: bool,
) -> Result<(), AppError> {
    if all {
        let result = directory.start_all().await;
        views::print_machines(directory.list(), false);
        return finish_bulk(result, "start");
    }
    let Some(name) = resolve_target(directory, machine, "start")? else {
        return Ok(());
    };
    directory.start(&name).await?;
    views::print_machines(directory.list(), false);
    Ok(())
}

async fn cmd_stop(
    directory: &mut MachineDirectory,
    machine: Option<String>,
    all: bool,
) -> Result<(), AppError> {
    if all {
        let result = directory.stop_all().await;
        views::print_machines(directory.list(), false);
        return finish_bulk(result, "stop");
    }
    let Some(name) = resolve_target(directory, machine, "stop")? else {
        return Ok(());
    };
    directory.stop(&name).await?;
    views::print_machines(directory.list(), false);
    Ok(())
}

fn finish_bulk(result: Result<(), BulkError>, verb: &str) -> Result<(), AppError> {
    match result {
        Ok(()) => Ok(()),
        Err(bulk) => {
            for (name, err) in &bulk.failures {
                error!(machine = %name, "failed to {verb}: {err}");
            }
            Err(AppError::Bulk(bulk))
        }
    }
}

async fn cmd_rename(
    directory: &mut MachineDirectory,
    machine: Option<String>,
    new_name: Option<String>,
) -> Result<(), AppError> {
    let Some(name) = resolve_target(directory, machine, "rename")? else {
        return Ok(());
    };
    let new_name = match new_name {
        Some(new_name) => new_name,
        None => prompt::input("Enter the new name for the machine")?,
    };
    directory.rename(&name, &new_name).await?;
    views::print_machines(directory.list(), false);
    Ok(())
}

async fn cmd_action(
    directory: &mut MachineDirectory,
    machine: Option<String>,
    kind: ActionKind,
) -> Result<(), AppError> {
    let Some(name) = resolve_target(directory, machine, &kind.to_string())? else {
        return Ok(());
    };
    run_action(directory, &name, kind).await
}

async fn run_action(
    directory: &mut MachineDirectory,
    name: &str,
    kind: ActionKind,
) -> Result<(), AppError> {
    match directory.run_action(name, kind).await? {
        ActionOutcome::Ran => println!("Machine {name}: {kind} complete"),
        ActionOutcome::Unsupported => {
            println!("Machine {name}: {kind} is not defined for its distro")
        }
    }
    Ok(())
}

async fn cmd_shell(directory: &MachineDirectory, machine: Option<String>) -> Result<(), AppError> {
    let Some(name) = resolve_target(directory, machine, "open a shell in")? else {
        return Ok(());
    };
    directory.shell(&name).await?;
    Ok(())
}

/// Turn an optional name-or-index argument into a machine name,
/// prompting over the listing when it is absent. `Ok(None)` means there
/// is nothing to act on and a message has already been printed.
fn resolve_target(
    directory: &MachineDirectory,
    arg: Option<String>,
    verb: &str,
) -> Result<Option<String>, AppError> {
    if directory.is_empty() {
        println!("No machines to {verb}");
        return Ok(None);
    }

    match arg {
        Some(input) => {
            if let Ok(index) = input.parse::<usize>() {
                let record = index
                    .checked_sub(1)
                    .and_then(|index| directory.list().nth(index));
                return match record {
                    Some(record) => Ok(Some(record.name.clone())),
                    None => Err(AppError::InvalidSelection { input }),
                };
            }
            if directory.get(&input).is_some() {
                Ok(Some(input))
            } else {
                Err(AppError::InvalidSelection { input })
            }
        }
        None => {
            views::print_machines(directory.list(), true);
            let names: Vec<&str> = directory.list().map(|r| r.name.as_str()).collect();
            let picked = prompt::select(&format!("Select a machine to {verb}"), &names, 0)?;
            Ok(Some(names[picked].to_owned()))
        }
    }
}
