// SPDX-FileCopyrightText: 2025 The rigup developers
// SPDX-License-Identifier: MIT

//! Login shell and PATH provisioning.
//!
//! Covers the login-profile plumbing a bootstrap needs: directories that
//! should exist, PATH entries that should appear in `~/.profile`, and the
//! login shell recorded in the passwd database.

use crate::{
    provision::syscall_non_interactive,
    step::{Provision, Result},
};

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use tracing::{debug, info};

/// Login shell recorded for a user in the passwd database.
#[derive(Clone, Debug)]
pub struct LoginShell {
    user: String,
    shell: PathBuf,
}

impl LoginShell {
    /// Construct new login shell provision.
    pub fn new(user: impl Into<String>, shell: impl Into<PathBuf>) -> Self {
        Self {
            user: user.into(),
            shell: shell.into(),
        }
    }
}

impl Provision for LoginShell {
    /// Satisfied when the passwd entry's shell field is already the target.
    fn check(&self) -> Result<bool> {
        debug!("read passwd entry for {}", self.user);
        let entry = syscall_non_interactive("getent", ["passwd", self.user.as_str()])?;

        Ok(passwd_shell(&entry) == Some(self.shell.to_string_lossy().as_ref()))
    }

    /// Change the login shell through chsh.
    fn apply(&self) -> Result<()> {
        info!("change login shell of {} to {}", self.user, self.shell.display());
        syscall_non_interactive(
            "chsh",
            ["-s", self.shell.to_string_lossy().as_ref(), self.user.as_str()],
        )?;

        Ok(())
    }
}

/// Extract the shell field from one passwd entry line.
fn passwd_shell(entry: &str) -> Option<&str> {
    let line = entry.lines().next()?;
    let shell = line.rsplit(':').next()?.trim();

    (!shell.is_empty()).then_some(shell)
}

/// Directory that should exist.
#[derive(Clone, Debug)]
pub struct EnsureDir {
    dir: PathBuf,
}

impl EnsureDir {
    /// Construct new directory provision.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Provision for EnsureDir {
    /// Satisfied when the directory already exists.
    fn check(&self) -> Result<bool> {
        Ok(self.dir.is_dir())
    }

    /// Create the directory and any missing parents.
    fn apply(&self) -> Result<()> {
        info!("create directory {}", self.dir.display());
        mkdirp::mkdirp(&self.dir)?;

        Ok(())
    }
}

/// PATH entry exported from the login profile.
///
/// The entry is one literal `export` line. Checking for the exact line is
/// what prevents the classic bootstrap bug of re-appending the same PATH
/// entry on every run.
#[derive(Clone, Debug)]
pub struct PathEntry {
    profile: PathBuf,
    dir: PathBuf,
}

impl PathEntry {
    /// Construct new PATH entry provision.
    pub fn new(profile: impl Into<PathBuf>, dir: impl Into<PathBuf>) -> Self {
        Self {
            profile: profile.into(),
            dir: dir.into(),
        }
    }

    fn export_line(&self) -> String {
        format!("export PATH=\"{}:$PATH\"", self.dir.display())
    }
}

impl Provision for PathEntry {
    /// Satisfied when the profile already contains the exact export line.
    fn check(&self) -> Result<bool> {
        if !self.profile.is_file() {
            return Ok(false);
        }

        let contents = fs::read_to_string(&self.profile)?;
        let line = self.export_line();

        Ok(contents.lines().any(|existing| existing.trim() == line))
    }

    /// Append the export line to the profile, creating it if missing.
    fn apply(&self) -> Result<()> {
        info!(
            "add {} to PATH via {}",
            self.dir.display(),
            self.profile.display()
        );
        let mut profile = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.profile)?;
        writeln!(profile, "{}", self.export_line())?;

        Ok(())
    }
}
