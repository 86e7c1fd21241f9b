// SPDX-FileCopyrightText: 2025 The rigup developers
// SPDX-License-Identifier: MIT

//! Desktop environment provisioning.
//!
//! GNOME settings are converged one key at a time through the external
//! `gsettings` binary. The settings store is the live machine state; checks
//! read it back on every run rather than trusting anything from a previous
//! invocation.

use crate::{
    provision::syscall_non_interactive,
    step::{Provision, Result},
};

use tracing::{debug, info};

/// One gsettings key that should hold a desired value.
#[derive(Clone, Debug)]
pub struct GsettingsKey {
    schema: String,
    key: String,
    value: String,
}

impl GsettingsKey {
    /// Construct new gsettings provision.
    pub fn new(
        schema: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// Static workspace count for the window manager.
    pub fn workspace_count(count: u32) -> Self {
        Self::new(
            "org.gnome.desktop.wm.preferences",
            "num-workspaces",
            count.to_string(),
        )
    }

    /// UI font at the given point size.
    pub fn interface_font(size: u32) -> Self {
        Self::new(
            "org.gnome.desktop.interface",
            "font-name",
            format!("Ubuntu {size}"),
        )
    }

    /// Monospace font at the given point size.
    pub fn monospace_font(size: u32) -> Self {
        Self::new(
            "org.gnome.desktop.interface",
            "monospace-font-name",
            format!("Ubuntu Mono {size}"),
        )
    }
}

impl Provision for GsettingsKey {
    /// Satisfied when the key already reads back as the desired value.
    fn check(&self) -> Result<bool> {
        debug!("read gsettings {} {}", self.schema, self.key);
        let current =
            syscall_non_interactive("gsettings", ["get", self.schema.as_str(), self.key.as_str()])?;

        Ok(strip_variant_literal(&current) == self.value)
    }

    /// Write the desired value.
    ///
    /// Setting a key to the value it already holds is a harmless
    /// re-assertion.
    fn apply(&self) -> Result<()> {
        info!("set gsettings {} {} to {}", self.schema, self.key, self.value);
        syscall_non_interactive(
            "gsettings",
            [
                "set",
                self.schema.as_str(),
                self.key.as_str(),
                self.value.as_str(),
            ],
        )?;

        Ok(())
    }
}

/// Strip GVariant literal syntax from gsettings output.
///
/// `gsettings get` prints typed literals, e.g. `uint32 4` or `'Ubuntu 11'`,
/// while `gsettings set` accepts the bare value. Comparisons happen on the
/// bare form.
fn strip_variant_literal(literal: &str) -> &str {
    let literal = literal.trim();
    let literal = literal
        .strip_prefix("uint32 ")
        .or_else(|| literal.strip_prefix("int32 "))
        .unwrap_or(literal);

    literal
        .strip_prefix('\'')
        .and_then(|inner| inner.strip_suffix('\''))
        .unwrap_or(literal)
}
