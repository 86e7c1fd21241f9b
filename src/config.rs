// SPDX-FileCopyrightText: 2025 The rigup developers
// SPDX-License-Identifier: MIT

//! Blueprint layout.
//!
//! Specify the layout of the blueprint file that Rigup uses to simplify the
//! process of serialization and deserialization. File I/O is left to the
//! caller to figure out.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Blueprint layout.
///
/// A __blueprint__ declares the desired state of a machine. It is a simple
/// configuration file constructed once at startup and treated as immutable
/// for the rest of the run. Every provisioning step is drafted from it; no
/// step reads configuration from anywhere else.
///
/// # General Layout
///
/// A blueprint is composed of a handful of sections: the dotfiles repository
/// to clone and symlink, the apt package list, desktop settings, login shell
/// settings, and the optional flatpak section. Any section may be omitted,
/// in which case its steps are simply not drafted.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Blueprint {
    /// Dotfiles repository settings.
    #[serde(default)]
    pub dotfiles: DotfileSettings,

    /// System package listing.
    #[serde(default)]
    pub packages: PackageSettings,

    /// Desktop environment settings.
    #[serde(default)]
    pub desktop: DesktopSettings,

    /// Login shell settings.
    #[serde(default)]
    pub shell: ShellSettings,

    /// Optional flatpak application settings.
    #[serde(default)]
    pub flatpak: FlatpakSettings,
}

impl FromStr for Blueprint {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut blueprint: Blueprint = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on all path-valued fields.
        blueprint.dotfiles.dir = expand_path(&blueprint.dotfiles.dir)?;
        blueprint.shell.login_shell = expand_path(&blueprint.shell.login_shell)?;
        blueprint.shell.path_entries = blueprint
            .shell
            .path_entries
            .iter()
            .map(|entry| expand_path(entry))
            .collect::<Result<Vec<_>>>()?;

        Ok(blueprint)
    }
}

impl Display for Blueprint {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Dotfiles repository settings.
///
/// Where the dotfiles live remotely, where the clone should land, and which
/// stow packages inside the clone get symlinked into the home directory.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct DotfileSettings {
    /// Remote URL to clone the dotfiles repository from.
    ///
    /// Leave empty to skip dotfile provisioning entirely.
    #[serde(default)]
    pub url: String,

    /// Local directory the clone lives in.
    #[serde(default)]
    pub dir: PathBuf,

    /// Stow package names to symlink into the home directory.
    #[serde(default)]
    pub stow_packages: Vec<String>,
}

/// System package listing.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct PackageSettings {
    /// Apt packages that should be installed.
    #[serde(default)]
    pub apt: Vec<String>,
}

/// Desktop environment settings.
///
/// A value of zero means "leave this setting alone"; no step is drafted
/// for it.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct DesktopSettings {
    /// Number of static workspaces.
    #[serde(default)]
    pub workspace_count: u32,

    /// Point size for the UI and monospace fonts.
    #[serde(default)]
    pub font_size: u32,
}

/// Login shell settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ShellSettings {
    /// Whether the login shell should be changed at all.
    #[serde(default)]
    pub set_login_shell: bool,

    /// Absolute path to the desired login shell.
    #[serde(default)]
    pub login_shell: PathBuf,

    /// Directories to ensure exist and appear on PATH via the login profile.
    #[serde(default)]
    pub path_entries: Vec<PathBuf>,
}

/// Optional flatpak application settings.
///
/// Flatpak provisioning is a skippable feature. When disabled, none of its
/// steps are drafted, not even as no-ops.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct FlatpakSettings {
    /// Whether flatpak applications should be provisioned.
    #[serde(default)]
    pub enabled: bool,

    /// Flatpak application identifiers to install from flathub.
    #[serde(default)]
    pub apps: Vec<String>,
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("BLAH", "/home/blah")])]
    fn deserialize_blueprint() -> anyhow::Result<()> {
        let result: Blueprint = r#"
            [dotfiles]
            url = "https://blah.org/dotfiles.git"
            dir = "$BLAH/.dotfiles"
            stow_packages = ["bash", "vim", "tmux"]

            [packages]
            apt = ["git", "stow"]

            [desktop]
            workspace_count = 4
            font_size = 11

            [shell]
            set_login_shell = true
            login_shell = "/usr/bin/zsh"
            path_entries = ["$BLAH/.local/bin"]

            [flatpak]
            enabled = true
            apps = ["org.signal.Signal"]
        "#
        .parse()?;

        let expect = Blueprint {
            dotfiles: DotfileSettings {
                url: "https://blah.org/dotfiles.git".into(),
                dir: "/home/blah/.dotfiles".into(),
                stow_packages: vec!["bash".into(), "vim".into(), "tmux".into()],
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
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[sealed_test]
    fn deserialize_blueprint_missing_sections() -> anyhow::Result<()> {
        let result: Blueprint = r#"
            [packages]
            apt = ["git"]
        "#
        .parse()?;

        assert_eq!(result.packages.apt, vec![String::from("git")]);
        assert_eq!(result.dotfiles, DotfileSettings::default());
        assert_eq!(result.flatpak, FlatpakSettings::default());

        Ok(())
    }

    #[test]
    fn serialize_blueprint() {
        let result = Blueprint {
            dotfiles: DotfileSettings {
                url: "https://blah.org/dotfiles.git".into(),
                dir: "/home/blah/.dotfiles".into(),
                stow_packages: vec!["bash".into(), "vim".into(), "tmux".into()],
            },
            packages: PackageSettings {
                apt: vec!["git".into(), "stow".into(), "zsh".into()],
            },
            desktop: DesktopSettings {
                workspace_count: 4,
                font_size: 11,
            },
            shell: ShellSettings {
                set_login_shell: true,
                login_shell: "/usr/bin/zsh".into(),
                path_entries: Vec::new(),
            },
            flatpak: FlatpakSettings {
                enabled: false,
                apps: Vec::new(),
            },
        }
        .to_string();

        let expect = indoc! {r#"
            [dotfiles]
            url = "https://blah.org/dotfiles.git"
            dir = "/home/blah/.dotfiles"
            stow_packages = [
                "bash",
                "vim",
                "tmux",
            ]

            [packages]
            apt = [
                "git",
                "stow",
                "zsh",
            ]

            [desktop]
            workspace_count = 4
            font_size = 11

            [shell]
            set_login_shell = true
            login_shell = "/usr/bin/zsh"
            path_entries = []

            [flatpak]
            enabled = false
            apps = []
        "#};

        assert_eq!(result, expect);
    }
}
