// SPDX-FileCopyrightText: 2025 The rigup developers
// SPDX-License-Identifier: MIT

//! Dotfiles provisioning.
//!
//! Two fatal steps cover the dotfiles: cloning the repository, and symlinking
//! its stow packages into the home directory. Symlink bookkeeping itself is
//! delegated wholesale to the external `stow` binary; rigup only decides
//! whether stow has anything left to do.

use crate::{
    provision::syscall_non_interactive,
    step::{Provision, Result},
};

use auth_git2::{GitAuthenticator, Prompter};
use git2::{build::RepoBuilder, Config, FetchOptions, RemoteCallbacks, Repository};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Password, Text};
use std::{
    path::{Path, PathBuf},
    time,
};
use tracing::{debug, info, instrument};

/// Clone of the dotfiles repository.
#[derive(Clone, Debug)]
pub struct DotfilesClone {
    url: String,
    dir: PathBuf,
}

impl DotfilesClone {
    /// Construct new dotfiles clone provision.
    pub fn new(url: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dir: dir.into(),
        }
    }
}

impl Provision for DotfilesClone {
    /// Satisfied when the target directory already opens as a repository.
    ///
    /// A clone that exists but points at a different remote still counts as
    /// satisfied; reconciling remotes is the user's call, not ours.
    fn check(&self) -> Result<bool> {
        debug!("open repository candidate {:?}", self.dir.display());
        Ok(Repository::open(&self.dir).is_ok())
    }

    /// Clone the repository from its remote.
    ///
    /// The progress of the clone is displayed through a progress bar. If any
    /// credentials are required for the clone to continue, then the user will
    /// be prompted for that information accordingly. The progress bar will be
    /// blocked for user input.
    fn apply(&self) -> Result<()> {
        info!("clone dotfiles from {}", self.url);
        let bar = ProgressBar::no_length();
        let style = ProgressStyle::with_template(
            "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}]",
        )?
        .progress_chars("-Cco.");
        bar.set_style(style);
        bar.set_message(self.url.clone());
        bar.enable_steady_tick(time::Duration::from_millis(100));

        let prompter = IndicatifPrompter::new(bar);
        let authenticator = GitAuthenticator::default().set_prompter(prompter.clone());
        let config = Config::open_default()?;

        let mut throttle = time::Instant::now();
        let mut rc = RemoteCallbacks::new();
        rc.credentials(authenticator.credentials(&config));
        rc.transfer_progress(|progress| {
            let stats = progress.to_owned();
            let bar_size = stats.total_objects() as u64;
            let bar_pos = stats.received_objects() as u64;
            if throttle.elapsed() > time::Duration::from_millis(10) {
                throttle = time::Instant::now();
                prompter.bar.set_length(bar_size);
                prompter.bar.set_position(bar_pos);
            }
            true
        });

        let mut fo = FetchOptions::new();
        fo.remote_callbacks(rc);
        RepoBuilder::new()
            .fetch_options(fo)
            .clone(self.url.as_str(), self.dir.as_path())?;

        Ok(())
    }
}

/// Git2 authentication prompter for progress bar.
#[derive(Debug, Clone)]
pub struct IndicatifPrompter {
    pub(crate) bar: ProgressBar,
}

impl IndicatifPrompter {
    /// Construct new progress bar authenticator.
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl Prompter for IndicatifPrompter {
    #[instrument(skip(self, url, _config), level = "debug")]
    fn prompt_username_password(
        &mut self,
        url: &str,
        _config: &git2::Config,
    ) -> Option<(String, String)> {
        info!("authentication required at {url}");
        self.bar.suspend(|| -> Option<(String, String)> {
            let username = Text::new("username").prompt().ok()?;
            let password = Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()?;
            Some((username, password))
        })
    }

    #[instrument(skip(self, username, url, _config), level = "debug")]
    fn prompt_password(
        &mut self,
        username: &str,
        url: &str,
        _config: &git2::Config,
    ) -> Option<String> {
        info!("authentication required at {url} for user {username}");
        self.bar.suspend(|| -> Option<String> {
            Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()
        })
    }

    #[instrument(skip(self, ssh_key_path, _config), level = "debug")]
    fn prompt_ssh_key_passphrase(
        &mut self,
        ssh_key_path: &Path,
        _config: &git2::Config,
    ) -> Option<String> {
        info!(
            "authentication required with ssh key at {}",
            ssh_key_path.display()
        );
        self.bar.suspend(|| -> Option<String> {
            Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()
        })
    }
}

/// Stow packages symlinked into the home directory.
#[derive(Clone, Debug)]
pub struct StowPackages {
    dir: PathBuf,
    target: PathBuf,
    packages: Vec<String>,
}

impl StowPackages {
    /// Construct new stow provision.
    pub fn new(
        dir: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        packages: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            dir: dir.into(),
            target: target.into(),
            packages: packages.into_iter().map(Into::into).collect(),
        }
    }

    fn stow_args(&self, mode: &str) -> Vec<String> {
        let mut args = vec![
            mode.into(),
            "--verbose".into(),
            "-d".into(),
            self.dir.to_string_lossy().into_owned(),
            "-t".into(),
            self.target.to_string_lossy().into_owned(),
        ];
        args.extend(self.packages.iter().cloned());

        args
    }
}

impl Provision for StowPackages {
    /// Satisfied when a stow simulation plans no link operations.
    fn check(&self) -> Result<bool> {
        debug!("simulate stow for {:?}", self.packages);
        let mut args = vec![String::from("--no")];
        args.extend(self.stow_args("--restow"));
        let message = syscall_non_interactive("stow", args)?;

        Ok(!plans_link_operations(&message))
    }

    /// Restow every package.
    ///
    /// Restowing already-linked packages is a harmless re-assertion; stow
    /// prunes and recreates its own symlinks without touching anything else.
    fn apply(&self) -> Result<()> {
        info!("stow packages {:?}", self.packages);
        syscall_non_interactive("stow", self.stow_args("--restow"))?;

        Ok(())
    }
}

/// Whether verbose stow output plans any filesystem changes.
fn plans_link_operations(message: &str) -> bool {
    message.lines().any(|line| {
        let line = line.trim_start();
        line.starts_with("LINK:")
            || line.starts_with("UNLINK:")
            || line.starts_with("MKDIR:")
            || line.starts_with("RMDIR:")
    })
}
