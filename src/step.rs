// SPDX-FileCopyrightText: 2025 The rigup developers
// SPDX-License-Identifier: MIT

//! Provisioning step model.
//!
//! A __step__ is an ordered, named unit of provisioning work. Every step
//! pairs a `check` predicate describing whether the desired end-state already
//! holds with an `apply` action that establishes it, plus a policy deciding
//! whether its failure aborts the whole run or merely warns.
//!
//! Steps are first-class values rather than command strings, so the runner,
//! the logger, and the test suite all operate on them uniformly.
//!
//! # Idempotence
//!
//! For every step, invoking `apply` when `check` already holds must be a
//! no-op or harmless re-assertion. This invariant is what makes re-running
//! the whole tool against a machine in unknown state safe.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Live machine-state probe and mutation pair behind every step.
///
/// Implementations query the machine live on every `check` call. No cached
/// representation of machine state exists anywhere, because the state can
/// change between runs outside our control, e.g., manual package removal.
pub trait Provision {
    /// Report whether the desired end-state already holds.
    ///
    /// # Errors
    ///
    /// - Return [`StepError`] if the probe itself cannot be evaluated.
    fn check(&self) -> Result<bool>;

    /// Establish the desired end-state.
    ///
    /// # Errors
    ///
    /// - Return [`StepError`] if the end-state cannot be established.
    fn apply(&self) -> Result<()>;
}

/// Failure policy of a step.
///
/// The fatal-vs-advisory choice is a deliberate per-step decision made when
/// the step list is drafted, never inferred from the failure itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Policy {
    /// Failure aborts the entire run immediately.
    Fatal,

    /// Failure becomes a warning and the run continues.
    Advisory,
}

impl Policy {
    /// Whether failure under this policy aborts the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal)
    }
}

/// A single provisioning step.
pub struct Step {
    name: String,
    policy: Policy,
    provision: Box<dyn Provision>,
}

impl Step {
    /// Construct new step.
    pub fn new(name: impl Into<String>, policy: Policy, provision: impl Provision + 'static) -> Self {
        Self {
            name: name.into(),
            policy,
            provision: Box::new(provision),
        }
    }

    /// Name of step, for logging.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Failure policy of step.
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Report whether the desired end-state already holds.
    ///
    /// # Errors
    ///
    /// - Return [`StepError`] if the probe itself cannot be evaluated.
    pub fn check(&self) -> Result<bool> {
        self.provision.check()
    }

    /// Establish the desired end-state.
    ///
    /// # Errors
    ///
    /// - Return [`StepError`] if the end-state cannot be established.
    pub fn apply(&self) -> Result<()> {
        self.provision.apply()
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.debug_struct("Step")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Outcome of running a single step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Apply ran and succeeded.
    Applied,

    /// Check reported the desired state already holds; apply never ran.
    AlreadySatisfied,

    /// Apply failed, but the step was advisory and the run continued.
    Warned,

    /// Apply failed on a fatal step, aborting the run.
    Failed,
}

impl Display for Outcome {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Applied => "applied",
            Self::AlreadySatisfied => "already-satisfied",
            Self::Warned => "warned",
            Self::Failed => "failed",
        };
        fmt.write_str(name)
    }
}

/// One entry of the run log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// Name of the step the entry belongs to.
    pub name: String,

    /// What happened to the step.
    pub outcome: Outcome,
}

/// Append-only ordered audit trail of one run.
///
/// Exists only for the duration of one invocation; never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunLog(Vec<Record>);

impl RunLog {
    /// Construct new empty run log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to the run log.
    pub fn push(&mut self, name: impl Into<String>, outcome: Outcome) {
        self.0.push(Record {
            name: name.into(),
            outcome,
        });
    }

    /// All entries in execution order.
    pub fn records(&self) -> &[Record] {
        self.0.as_slice()
    }

    /// Number of entries with the given outcome.
    pub fn tally(&self, outcome: Outcome) -> usize {
        self.0.iter().filter(|record| record.outcome == outcome).count()
    }
}

/// Step failure types.
///
/// Any failure an apply or check can hit crosses the step boundary as one of
/// these values. The runner, not the step, decides fatal-vs-advisory from the
/// step's declared policy.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// External command invocation fails.
    #[error(transparent)]
    Syscall(#[from] std::io::Error),

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),

    /// Style template cannot be set for progress bars.
    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),
}

/// Friendly result alias :3
pub type Result<T, E = StepError> = std::result::Result<T, E>;
