// SPDX-FileCopyrightText: 2025 The rigup developers
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevant path information for external files that need to be
//! interacted with, or managed in some way.

use std::path::PathBuf;

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Determine default absolute path to the blueprint file.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/rigup/blueprint.toml` as
/// the default location. Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_blueprint_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("rigup").join("blueprint.toml"))
        .ok_or(NoWayHome)
}

/// Determine default absolute path to the dotfiles clone.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_dotfiles_dir() -> Result<PathBuf> {
    home_dir().map(|path| path.join(".dotfiles"))
}

/// Determine absolute path to the user's login profile.
///
/// PATH entries land in `~/.profile`, which every POSIX login shell sources.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn login_profile_path() -> Result<PathBuf> {
    home_dir().map(|path| path.join(".profile"))
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
