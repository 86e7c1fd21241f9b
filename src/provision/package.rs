// SPDX-FileCopyrightText: 2025 The rigup developers
// SPDX-License-Identifier: MIT

//! System package provisioning.
//!
//! Thin check/apply pairs over the external package managers. Rigup never
//! reimplements any package-manager behavior; the dpkg database and the
//! flatpak installation registry are the live machine state, probed through
//! the managers' own query commands.

use crate::{
    provision::{syscall_non_interactive, syscall_status},
    step::{Provision, Result},
};

use tracing::{debug, info};

/// One apt package that should be installed.
///
/// Advisory by policy when drafted: a package missing from the configured
/// repositories must not block the rest of the run.
#[derive(Clone, Debug)]
pub struct AptPackage {
    name: String,
}

impl AptPackage {
    /// Construct new apt package provision.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Provision for AptPackage {
    /// Satisfied when dpkg knows the package.
    fn check(&self) -> Result<bool> {
        debug!("query dpkg database for {}", self.name);
        Ok(syscall_status("dpkg-query", ["-W", self.name.as_str()])?)
    }

    /// Install through apt-get.
    ///
    /// Re-installing an already-present package is a harmless re-assertion;
    /// apt-get treats it as "already the newest version".
    fn apply(&self) -> Result<()> {
        info!("install apt package {}", self.name);
        syscall_non_interactive("apt-get", ["install", "-y", self.name.as_str()])?;

        Ok(())
    }
}

/// One flatpak application that should be installed from flathub.
#[derive(Clone, Debug)]
pub struct FlatpakApp {
    app_id: String,
}

impl FlatpakApp {
    /// Construct new flatpak application provision.
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
        }
    }
}

impl Provision for FlatpakApp {
    /// Satisfied when flatpak already has the application installed.
    fn check(&self) -> Result<bool> {
        debug!("query flatpak for {}", self.app_id);
        Ok(syscall_status("flatpak", ["info", self.app_id.as_str()])?)
    }

    /// Install from the flathub remote.
    fn apply(&self) -> Result<()> {
        info!("install flatpak application {}", self.app_id);
        syscall_non_interactive(
            "flatpak",
            ["install", "-y", "flathub", self.app_id.as_str()],
        )?;

        Ok(())
    }
}
