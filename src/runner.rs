// SPDX-FileCopyrightText: 2025 The rigup developers
// SPDX-License-Identifier: MIT

//! Convergent step runner.
//!
//! Executes an ordered sequence of steps against the live machine, skipping
//! work already done, surfacing advisory problems as warnings, and stopping
//! immediately on fatal failure. Each step moves from unsatisfied to
//! satisfied either by being found already satisfied or by applying
//! successfully; the runner never drives the reverse transition. External
//! actors may revert state between runs, which is expected and handled by
//! re-evaluating every check on the next invocation.
//!
//! Execution is strictly sequential. Steps may have implicit ordering
//! dependencies, e.g., a tool must be installed before its configuration step
//! runs, and fixed textual order is the simplest mechanism that respects this
//! without a dependency graph.

use crate::step::{Outcome, Policy, RunLog, Step, StepError};

use tracing::{info, warn};

/// Runner that converges a step list against the live machine.
#[derive(Debug)]
pub struct Runner {
    steps: Vec<Step>,
}

impl Runner {
    /// Construct new runner over an ordered step list.
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Execute every step in the exact order supplied.
    ///
    /// Per step: evaluate its check first, and skip the apply entirely when
    /// the desired state already holds. Otherwise apply. A failing advisory
    /// step is recorded as warned and the run continues; a failing fatal step
    /// aborts the run immediately, leaving the log as the audit trail of what
    /// happened before the failure.
    ///
    /// A successful run may still contain warnings.
    ///
    /// # Errors
    ///
    /// - Return [`RunnerError::Aborted`] if a fatal step fails, carrying the
    ///   failing step's name, its 1-based position, and the run log so far.
    pub fn converge(self) -> Result<RunLog> {
        let mut log = RunLog::new();
        for (index, step) in self.steps.into_iter().enumerate() {
            // A failing check counts as a step failure under the step's own
            // policy, since an unreadable probe means unknown machine state.
            let failure = match step.check() {
                Ok(true) => {
                    info!("{}: already satisfied", step.name());
                    log.push(step.name(), Outcome::AlreadySatisfied);
                    continue;
                }
                Ok(false) => step.apply().err(),
                Err(error) => Some(error),
            };

            match failure {
                None => {
                    info!("{}: applied", step.name());
                    log.push(step.name(), Outcome::Applied);
                }
                Some(error) if step.policy() == Policy::Advisory => {
                    warn!("{}: {error}", step.name());
                    log.push(step.name(), Outcome::Warned);
                }
                Some(error) => {
                    log.push(step.name(), Outcome::Failed);
                    return Err(RunnerError::Aborted {
                        step: step.name().into(),
                        position: index + 1,
                        log,
                        source: error,
                    });
                }
            }
        }

        Ok(log)
    }
}

/// Runner error types.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A fatal step failed and the run stopped.
    #[error("aborted at step {position} ({step}): {source}")]
    Aborted {
        /// Name of the failing step.
        step: String,

        /// 1-based position of the failing step in the supplied order.
        position: usize,

        /// Audit trail of everything that ran before the abort.
        log: RunLog,

        /// Underlying step failure.
        source: StepError,
    },
}

/// Friendly result alias :3
type Result<T, E = RunnerError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{Provision, Result as StepResult};

    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;
    use std::sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    };

    /// Test double over shared state, observable after the runner consumes
    /// the step list.
    #[derive(Clone, Default)]
    struct Probe {
        satisfied: Arc<AtomicBool>,
        applies: Arc<AtomicUsize>,
        fail_apply: bool,
        journal: Option<(Arc<Mutex<Vec<&'static str>>>, &'static str)>,
    }

    impl Probe {
        fn satisfied() -> Self {
            let probe = Self::default();
            probe.satisfied.store(true, Ordering::SeqCst);
            probe
        }

        fn failing() -> Self {
            Self {
                fail_apply: true,
                ..Self::default()
            }
        }

        fn journaled(log: Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> Self {
            Self {
                journal: Some((log, tag)),
                ..Self::default()
            }
        }

        fn apply_count(&self) -> usize {
            self.applies.load(Ordering::SeqCst)
        }
    }

    impl Provision for Probe {
        fn check(&self) -> StepResult<bool> {
            Ok(self.satisfied.load(Ordering::SeqCst))
        }

        fn apply(&self) -> StepResult<()> {
            self.applies.fetch_add(1, Ordering::SeqCst);
            if self.fail_apply {
                return Err(std::io::Error::other("apply blew up").into());
            }
            if let Some((log, tag)) = &self.journal {
                log.lock().unwrap().push(tag);
            }
            self.satisfied.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn outcomes(log: &RunLog) -> Vec<Outcome> {
        log.records().iter().map(|record| record.outcome).collect()
    }

    #[test]
    fn skip_on_satisfied_never_applies() -> anyhow::Result<()> {
        let probe = Probe::satisfied();
        let runner = Runner::new(vec![Step::new("git", Policy::Advisory, probe.clone())]);

        let log = runner.converge()?;

        assert_eq!(outcomes(&log), vec![Outcome::AlreadySatisfied]);
        assert_eq!(probe.apply_count(), 0);

        Ok(())
    }

    #[test]
    fn second_run_is_all_satisfied_with_zero_applies() -> anyhow::Result<()> {
        let probes = [Probe::default(), Probe::default(), Probe::default()];
        let draft = |policy| {
            vec![
                Step::new("install git", policy, probes[0].clone()),
                Step::new("path entry", policy, probes[1].clone()),
                Step::new("clone dotfiles", policy, probes[2].clone()),
            ]
        };

        let first = Runner::new(draft(Policy::Fatal)).converge()?;
        let second = Runner::new(draft(Policy::Fatal)).converge()?;

        assert_eq!(outcomes(&first), vec![Outcome::Applied; 3]);
        assert_eq!(outcomes(&second), vec![Outcome::AlreadySatisfied; 3]);
        for probe in &probes {
            assert_eq!(probe.apply_count(), 1);
        }

        Ok(())
    }

    #[test]
    fn order_preserved_exactly() -> anyhow::Result<()> {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let steps = ["A", "B", "C"]
            .into_iter()
            .map(|tag| {
                Step::new(
                    tag,
                    Policy::Advisory,
                    Probe::journaled(Arc::clone(&journal), tag),
                )
            })
            .collect();

        Runner::new(steps).converge()?;

        assert_eq!(*journal.lock().unwrap(), vec!["A", "B", "C"]);

        Ok(())
    }

    #[test_case(Policy::Fatal; "fatal stops the run")]
    #[test_case(Policy::Advisory; "advisory continues the run")]
    #[test]
    fn failure_honors_step_policy(policy: Policy) {
        use pretty_assertions::assert_eq;

        let tail = Probe::default();
        let steps = vec![
            Step::new("first", Policy::Advisory, Probe::default()),
            Step::new("broken", policy, Probe::failing()),
            Step::new("last", Policy::Advisory, tail.clone()),
        ];

        let result = Runner::new(steps).converge();

        match policy {
            Policy::Fatal => {
                let Err(RunnerError::Aborted {
                    step,
                    position,
                    log,
                    ..
                }) = result
                else {
                    panic!("fatal failure must abort the run");
                };
                assert_eq!(step, "broken");
                assert_eq!(position, 2);
                assert_eq!(outcomes(&log), vec![Outcome::Applied, Outcome::Failed]);
                assert_eq!(tail.apply_count(), 0);
            }
            Policy::Advisory => {
                let log = result.expect("advisory failure must not abort the run");
                assert_eq!(
                    outcomes(&log),
                    vec![Outcome::Applied, Outcome::Warned, Outcome::Applied]
                );
                assert_eq!(tail.apply_count(), 1);
            }
        }
    }

    #[test]
    fn offline_bootstrap_scenario() {
        // Packages and PATH entry land, required clone cannot reach the
        // network, run aborts non-zero with a two-entry success prefix.
        let steps = vec![
            Step::new("install git", Policy::Advisory, Probe::default()),
            Step::new("path entry ~/.local/bin", Policy::Advisory, Probe::default()),
            Step::new("clone dotfiles", Policy::Fatal, Probe::failing()),
        ];

        let Err(RunnerError::Aborted { position, log, .. }) = Runner::new(steps).converge() else {
            panic!("run must abort when the required clone fails");
        };

        assert_eq!(position, 3);
        assert_eq!(
            outcomes(&log),
            vec![Outcome::Applied, Outcome::Applied, Outcome::Failed]
        );
        assert_eq!(log.tally(Outcome::Failed), 1);
    }

    #[test]
    fn failing_check_counts_as_step_failure() {
        struct BrokenProbe;

        impl Provision for BrokenProbe {
            fn check(&self) -> StepResult<bool> {
                Err(std::io::Error::other("probe unreadable").into())
            }

            fn apply(&self) -> StepResult<()> {
                panic!("apply must not run when check errors");
            }
        }

        let log = Runner::new(vec![Step::new("broken probe", Policy::Advisory, BrokenProbe)])
            .converge()
            .expect("advisory check failure must not abort the run");

        assert_eq!(outcomes(&log), vec![Outcome::Warned]);
    }
}
