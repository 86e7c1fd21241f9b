// SPDX-FileCopyrightText: 2025 The rigup developers
// SPDX-License-Identifier: MIT

//! Provisioning catalogue.
//!
//! Concrete check/apply pairs for everything a blueprint can declare, plus
//! the drafting logic that turns one immutable blueprint into the ordered
//! step list the runner converges.
//!
//! # Step Order
//!
//! Drafted order is fixed: apt packages, PATH directories and profile
//! entries, the dotfiles clone, stow, desktop settings, login shell, flatpak
//! applications. Ordering dependencies between steps are implicit in this
//! sequence, e.g., stow runs only after the clone that provides its input,
//! the same way the steps depend on each other in a hand-written bootstrap
//! script.

pub mod desktop;
pub mod dotfiles;
pub mod package;
pub mod shell;

use crate::{
    config::Blueprint,
    path,
    step::{Policy, Step},
};

use desktop::GsettingsKey;
use dotfiles::{DotfilesClone, StowPackages};
use package::{AptPackage, FlatpakApp};
use shell::{EnsureDir, LoginShell, PathEntry};
use std::{
    ffi::OsStr,
    process::{Command, Stdio},
};

/// Draft the ordered step list for a blueprint.
///
/// Fatal-vs-advisory classification happens here, deliberately per step:
/// the dotfiles clone and stow are fatal, because everything the tool exists
/// for depends on them; package installs, desktop keys, the login shell, and
/// PATH plumbing are advisory, because a machine missing one optional piece
/// is still worth finishing.
///
/// Sections left empty in the blueprint draft no steps at all, not even
/// skipped ones.
///
/// # Errors
///
/// - Return [`DraftError::NoWayHome`] if home directory path cannot be
///   determined.
/// - Return [`DraftError::UnknownUser`] if the login shell step is requested
///   and the current user cannot be determined.
pub fn draft_steps(blueprint: &Blueprint) -> Result<Vec<Step>> {
    let mut steps = Vec::new();

    for name in &blueprint.packages.apt {
        steps.push(Step::new(
            format!("apt package {name}"),
            Policy::Advisory,
            AptPackage::new(name),
        ));
    }

    let profile = path::login_profile_path()?;
    for dir in &blueprint.shell.path_entries {
        steps.push(Step::new(
            format!("directory {}", dir.display()),
            Policy::Advisory,
            EnsureDir::new(dir),
        ));
        steps.push(Step::new(
            format!("path entry {}", dir.display()),
            Policy::Advisory,
            PathEntry::new(&profile, dir),
        ));
    }

    if !blueprint.dotfiles.url.is_empty() {
        let dir = if blueprint.dotfiles.dir.as_os_str().is_empty() {
            path::default_dotfiles_dir()?
        } else {
            blueprint.dotfiles.dir.clone()
        };

        steps.push(Step::new(
            "clone dotfiles",
            Policy::Fatal,
            DotfilesClone::new(&blueprint.dotfiles.url, &dir),
        ));

        if !blueprint.dotfiles.stow_packages.is_empty() {
            steps.push(Step::new(
                "stow dotfiles",
                Policy::Fatal,
                StowPackages::new(&dir, path::home_dir()?, &blueprint.dotfiles.stow_packages),
            ));
        }
    }

    if blueprint.desktop.workspace_count > 0 {
        steps.push(Step::new(
            "workspace count",
            Policy::Advisory,
            GsettingsKey::workspace_count(blueprint.desktop.workspace_count),
        ));
    }

    if blueprint.desktop.font_size > 0 {
        steps.push(Step::new(
            "interface font",
            Policy::Advisory,
            GsettingsKey::interface_font(blueprint.desktop.font_size),
        ));
        steps.push(Step::new(
            "monospace font",
            Policy::Advisory,
            GsettingsKey::monospace_font(blueprint.desktop.font_size),
        ));
    }

    if blueprint.shell.set_login_shell && !blueprint.shell.login_shell.as_os_str().is_empty() {
        let user = std::env::var("USER").map_err(DraftError::UnknownUser)?;
        steps.push(Step::new(
            "login shell",
            Policy::Advisory,
            LoginShell::new(user, &blueprint.shell.login_shell),
        ));
    }

    if blueprint.flatpak.enabled {
        for app in &blueprint.flatpak.apps {
            steps.push(Step::new(
                format!("flatpak app {app}"),
                Policy::Advisory,
                FlatpakApp::new(app),
            ));
        }
    }

    Ok(steps)
}

/// Run external command, reporting only whether it exited successfully.
///
/// Used by check predicates that probe machine state through a tool's exit
/// status, e.g., `dpkg-query -W`. Output is discarded.
pub(crate) fn syscall_status(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> std::io::Result<bool> {
    let status = Command::new(cmd.as_ref())
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;

    Ok(status.success())
}

/// Run external command, collecting its combined output.
///
/// # Errors
///
/// - Return [`std::io::Error`] if the command cannot be spawned or exits
///   non-zero, with the collected output embedded in the message.
pub(crate) fn syscall_non_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> std::io::Result<String> {
    let output = Command::new(cmd.as_ref()).args(args).output()?;
    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
    let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();
    let mut message = String::new();

    if !stdout.is_empty() {
        message.push_str(stdout.as_str());
    }

    if !stderr.is_empty() {
        message.push_str(stderr.as_str());
    }

    // INVARIANT: Chomp trailing newlines.
    let message = message
        .strip_suffix("\r\n")
        .or(message.strip_suffix('\n'))
        .map(ToString::to_string)
        .unwrap_or(message);

    if !output.status.success() {
        return Err(std::io::Error::other(format!(
            "command {:?} failed:\n{message}",
            cmd.as_ref()
        )));
    }

    Ok(message)
}

/// Drafting error types.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    /// Home directory path cannot be determined.
    #[error(transparent)]
    NoWayHome(#[from] crate::path::NoWayHome),

    /// Current user cannot be determined from the environment.
    #[error("cannot determine current user from environment")]
    UnknownUser(#[source] std::env::VarError),
}

/// Friendly result alias :3
type Result<T, E = DraftError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        DesktopSettings, DotfileSettings, FlatpakSettings, PackageSettings, ShellSettings,
    };

    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    fn full_blueprint() -> Blueprint {
        Blueprint {
            dotfiles: DotfileSettings {
                url: "https://blah.org/dotfiles.git".into(),
                dir: "/home/blah/.dotfiles".into(),
                stow_packages: vec!["bash".into(), "vim".into()],
            },
            packages: PackageSettings {
                apt: vec!["git".into(), "stow".into()],
            },
            desktop: DesktopSettings {
                workspace_count: 4,
                font_size: 11,
            },
            shell: ShellSettings {
                set_login_shell: true,
                login_shell: "/usr/bin/zsh".into(),
                path_entries: vec!["/home/blah/.local/bin".into()],
            },
            flatpak: FlatpakSettings {
                enabled: true,
                apps: vec!["org.signal.Signal".into()],
            },
        }
    }

    #[sealed_test(env = [("HOME", "/home/blah"), ("USER", "blah")])]
    fn draft_covers_whole_blueprint_in_fixed_order() -> anyhow::Result<()> {
        let steps = draft_steps(&full_blueprint())?;

        let names = steps.iter().map(Step::name).collect::<Vec<_>>();
        let expect = vec![
            "apt package git",
            "apt package stow",
            "directory /home/blah/.local/bin",
            "path entry /home/blah/.local/bin",
            "clone dotfiles",
            "stow dotfiles",
            "workspace count",
            "interface font",
            "monospace font",
            "login shell",
            "flatpak app org.signal.Signal",
        ];
        assert_eq!(names, expect);

        Ok(())
    }

    #[sealed_test(env = [("HOME", "/home/blah"), ("USER", "blah")])]
    fn draft_classifies_only_dotfile_steps_fatal() -> anyhow::Result<()> {
        let steps = draft_steps(&full_blueprint())?;

        let fatal = steps
            .iter()
            .filter(|step| step.policy().is_fatal())
            .map(Step::name)
            .collect::<Vec<_>>();
        assert_eq!(fatal, vec!["clone dotfiles", "stow dotfiles"]);

        Ok(())
    }

    #[sealed_test(env = [("HOME", "/home/blah"), ("USER", "blah")])]
    fn draft_omits_disabled_sections() -> anyhow::Result<()> {
        let mut blueprint = full_blueprint();
        blueprint.dotfiles.url = String::new();
        blueprint.flatpak.enabled = false;
        blueprint.shell.set_login_shell = false;
        blueprint.desktop = DesktopSettings::default();

        let steps = draft_steps(&blueprint)?;

        let names = steps.iter().map(Step::name).collect::<Vec<_>>();
        let expect = vec![
            "apt package git",
            "apt package stow",
            "directory /home/blah/.local/bin",
            "path entry /home/blah/.local/bin",
        ];
        assert_eq!(names, expect);

        Ok(())
    }

    #[sealed_test]
    fn syscall_status_reports_exit_state() -> anyhow::Result<()> {
        assert!(syscall_status("true", Vec::<String>::new())?);
        assert!(!syscall_status("false", Vec::<String>::new())?);

        Ok(())
    }

    #[sealed_test]
    fn syscall_non_interactive_chomps_trailing_newline() -> anyhow::Result<()> {
        let message = syscall_non_interactive("echo", ["hello"])?;
        assert_eq!(message, "hello");

        Ok(())
    }
}
