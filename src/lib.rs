// SPDX-FileCopyrightText: 2025 The rigup developers
// SPDX-License-Identifier: MIT

//! Converge a Linux workstation toward a declared desired state.
//!
//! Rigup reads a __blueprint__, a small TOML file declaring what the machine
//! should look like: packages installed, dotfiles cloned and symlinked,
//! desktop settings applied, login shell set, PATH entries present. From the
//! blueprint it drafts an ordered list of [`Step`] values, each pairing a
//! `check` predicate (does the desired state already hold?) with an `apply`
//! action (establish it). The [`Runner`] walks the list in order, skipping
//! steps whose check already holds, so re-running against a machine in any
//! state never duplicates side effects.
//!
//! Machine state is never cached. Every run queries the live system through
//! the check predicates, because packages get removed, symlinks get deleted,
//! and settings get changed behind our back between runs. Re-running the tool
//! is the only retry mechanism, and idempotent steps are what make that safe.

pub mod config;
pub mod path;
pub mod provision;
pub mod runner;
pub mod step;

pub use config::Blueprint;
pub use runner::{Runner, RunnerError};
pub use step::{Outcome, Policy, Provision, RunLog, Step, StepError};
