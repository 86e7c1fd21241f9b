// SPDX-FileCopyrightText: 2025 The rigup developers
// SPDX-License-Identifier: MIT

use rigup::{
    config::{Blueprint, DotfileSettings, ShellSettings},
    path::{default_blueprint_path, default_dotfiles_dir},
    provision::draft_steps,
    step::Outcome,
    Runner,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::{
    fs,
    path::{Path, PathBuf},
    process::exit,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  rigup [options] <rigup-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to blueprint file to use instead of the default location.
    #[arg(short, long, global = true, value_name = "path")]
    pub blueprint: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let blueprint_path = match self.blueprint {
            Some(path) => path,
            None => default_blueprint_path()?,
        };

        match self.command {
            Command::Init => run_init(blueprint_path),
            Command::Check => run_check(blueprint_path),
            Command::Apply => run_apply(blueprint_path),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Write a starter blueprint to fill out.
    #[command(override_usage = "rigup init [options]")]
    Init,

    /// Report which steps are satisfied and which are pending, changing nothing.
    #[command(override_usage = "rigup check [options]")]
    Check,

    /// Converge the machine to the blueprint.
    #[command(override_usage = "rigup apply [options]")]
    Apply,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_init(blueprint_path: PathBuf) -> Result<()> {
    if blueprint_path.exists() {
        bail!(
            "refusing to overwrite existing blueprint at {}",
            blueprint_path.display()
        );
    }

    let mut blueprint = Blueprint::default();
    blueprint.dotfiles = DotfileSettings {
        url: "<put url to dotfiles remote here>".into(),
        dir: default_dotfiles_dir()?,
        stow_packages: Vec::new(),
    };
    blueprint.shell = ShellSettings {
        set_login_shell: false,
        login_shell: "/usr/bin/bash".into(),
        path_entries: Vec::new(),
    };

    if let Some(parent) = blueprint_path.parent() {
        mkdirp::mkdirp(parent)?;
    }
    fs::write(&blueprint_path, blueprint.to_string())?;
    info!("wrote starter blueprint to {}", blueprint_path.display());

    Ok(())
}

fn run_check(blueprint_path: PathBuf) -> Result<()> {
    let blueprint = load_blueprint(&blueprint_path)?;
    let steps = draft_steps(&blueprint)?;

    let mut pending = 0usize;
    for step in &steps {
        match step.check() {
            Ok(true) => println!("satisfied  {}", step.name()),
            Ok(false) => {
                pending += 1;
                println!("pending    {}", step.name());
            }
            Err(error) => {
                pending += 1;
                warn!("{}: cannot evaluate check: {error}", step.name());
            }
        }
    }

    info!("{} of {} steps pending", pending, steps.len());

    Ok(())
}

fn run_apply(blueprint_path: PathBuf) -> Result<()> {
    let blueprint = load_blueprint(&blueprint_path)?;
    let steps = draft_steps(&blueprint)?;

    let log = Runner::new(steps).converge()?;
    info!(
        "converged: {} applied, {} already satisfied, {} warnings",
        log.tally(Outcome::Applied),
        log.tally(Outcome::AlreadySatisfied),
        log.tally(Outcome::Warned),
    );

    Ok(())
}

fn load_blueprint(blueprint_path: &Path) -> Result<Blueprint> {
    let data = fs::read_to_string(blueprint_path)
        .with_context(|| format!("cannot read blueprint at {}", blueprint_path.display()))?;

    Ok(data.parse()?)
}
