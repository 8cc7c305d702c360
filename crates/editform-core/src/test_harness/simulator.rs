//! Edit session simulator
//!
//! Drives one session through a seeded random sequence of field edits,
//! saves, exits and reloads against the in-memory collaborators, checking
//! after every step:
//! - the navigation guard is locked exactly when the record is dirty
//! - the page-exit check is armed exactly when the record is dirty
//! - the error flag stays false while a record is loaded
//! - a successful save leaves the validation context unmodified
//! - an exit attempt on a dirty record invokes no exit path

use crate::config::SessionConfig;
use crate::memory::{
    InMemoryRecordService, PersistOutcome, RecordingAlerts, RecordingExit, RecordingGuard,
};
use crate::service::RecordService;
use crate::session::{Collaborators, EditSessionController};
use crate::types::ExitDecision;
use crate::validation::{Validate, ValidationReport};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use std::sync::Arc;

/// Record edited by the simulator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimRecord {
    pub name: String,
    pub quantity: i64,
}

impl Validate for SimRecord {
    fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::valid();
        if self.name.trim().is_empty() {
            report.push("name", "Name is required");
        }
        if self.quantity < 0 {
            report.push("quantity", "Quantity cannot be negative");
        }
        report
    }
}

/// Simulator configuration
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Number of operations to run
    pub operations: u64,
    /// Stop at the first violation
    pub stop_on_first_violation: bool,
    /// Session under test
    pub session: SessionConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            operations: 1000,
            stop_on_first_violation: false,
            session: SessionConfig::new().with_default_description("Item"),
        }
    }
}

/// One simulated user or service action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SimulatedOperation {
    /// Edit a field, leaving the record valid or not
    Edit { valid: bool },
    /// Field widget reports the value is back to its original
    Revert,
    /// Press save; the service persists or fails
    Save { persist_ok: bool },
    /// Press save-and-exit
    SaveAndExit { persist_ok: bool },
    /// Press exit
    TryExit,
    /// Confirm exit after the "discard changes?" prompt
    ConfirmExit,
    /// Reload the record
    Reload,
}

/// A broken invariant
#[derive(Debug, Clone, Serialize)]
pub enum Violation {
    GuardOutOfStep {
        step: u64,
        operation: SimulatedOperation,
        locked: bool,
        is_clean: bool,
    },
    ExitCheckOutOfStep {
        step: u64,
        operation: SimulatedOperation,
        armed: bool,
        is_clean: bool,
    },
    ErrorFlagWhileLoaded {
        step: u64,
        operation: SimulatedOperation,
    },
    ModifiedAfterSave {
        step: u64,
    },
    ExitedWhileDirty {
        step: u64,
    },
    UnexpectedError {
        step: u64,
        operation: SimulatedOperation,
        error: String,
    },
}

/// Statistics for simulation
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulatorStats {
    pub operations: u64,
    pub edits: u64,
    pub saves_attempted: u64,
    pub saves_succeeded: u64,
    pub saves_rejected: u64,
    pub saves_failed: u64,
    pub exits: u64,
    pub exits_refused: u64,
    pub reloads: u64,
    pub render_requests: u64,
}

/// Final report from simulator
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorReport {
    pub config: SimulatorConfig,
    pub stats: SimulatorStats,
    pub violations: Vec<Violation>,
}

impl SimulatorReport {
    /// Check if simulation passed all criteria
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Generate text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Edit Session Simulator Report ===\n\n");
        report.push_str(&format!("Seed: {}\n", self.config.seed));
        report.push_str(&format!("Modal: {}\n", self.config.session.is_modal));
        report.push_str(&format!("Operations: {}\n", self.stats.operations));
        report.push_str(&format!("Edits: {}\n", self.stats.edits));
        report.push_str(&format!("Saves Attempted: {}\n", self.stats.saves_attempted));
        report.push_str(&format!("Saves Succeeded: {}\n", self.stats.saves_succeeded));
        report.push_str(&format!("Saves Rejected (validation): {}\n", self.stats.saves_rejected));
        report.push_str(&format!("Saves Failed (persist): {}\n", self.stats.saves_failed));
        report.push_str(&format!("Exits: {}\n", self.stats.exits));
        report.push_str(&format!("Exits Needing Confirmation: {}\n", self.stats.exits_refused));
        report.push_str(&format!("Reloads: {}\n", self.stats.reloads));
        report.push_str(&format!("Render Requests: {}\n", self.stats.render_requests));
        report.push_str(&format!("Violations: {}\n", self.violations.len()));

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                report.push_str(&format!("{}. {:?}\n", i + 1, v));
            }
        }

        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));

        report
    }
}

struct Rig {
    service: Arc<InMemoryRecordService<SimRecord>>,
    guard: Arc<RecordingGuard>,
    exit: Arc<RecordingExit>,
    session: EditSessionController<InMemoryRecordService<SimRecord>>,
}

impl Rig {
    fn new(config: SessionConfig) -> Self {
        let service = Arc::new(InMemoryRecordService::new().with_record(
            1,
            SimRecord {
                name: "seed".to_string(),
                quantity: 1,
            },
        ));
        let guard = Arc::new(RecordingGuard::new());
        let exit = Arc::new(RecordingExit::new());
        let collaborators = Collaborators::new(
            guard.clone(),
            Arc::new(RecordingAlerts::new()),
            exit.clone(),
        );
        let session = EditSessionController::new(Arc::clone(&service), config, collaborators);
        Self {
            service,
            guard,
            exit,
            session,
        }
    }
}

fn generate_operation(rng: &mut StdRng) -> SimulatedOperation {
    match rng.random_range(0..100) {
        0..=39 => SimulatedOperation::Edit {
            valid: rng.random_bool(0.8),
        },
        40..=49 => SimulatedOperation::Revert,
        50..=64 => SimulatedOperation::Save {
            persist_ok: rng.random_bool(0.75),
        },
        65..=72 => SimulatedOperation::SaveAndExit {
            persist_ok: rng.random_bool(0.75),
        },
        73..=84 => SimulatedOperation::TryExit,
        85..=92 => SimulatedOperation::ConfirmExit,
        _ => SimulatedOperation::Reload,
    }
}

fn persist(rig: &Rig, ok: bool) {
    rig.service.set_persist_outcome(if ok {
        PersistOutcome::Succeed
    } else {
        PersistOutcome::Fail
    });
}

/// Run the edit session simulator
pub async fn run_simulator(config: SimulatorConfig) -> SimulatorReport {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut stats = SimulatorStats::default();
    let mut violations = Vec::new();

    let rig = Rig::new(config.session.clone());
    if let Err(e) = rig.session.load(true).await {
        violations.push(Violation::UnexpectedError {
            step: 0,
            operation: SimulatedOperation::Reload,
            error: e.to_string(),
        });
        return SimulatorReport {
            config,
            stats,
            violations,
        };
    }
    rig.session.on_first_render();

    for step in 1..=config.operations {
        let operation = generate_operation(&mut rng);
        let mut step_violations = Vec::new();
        stats.operations += 1;

        match operation {
            SimulatedOperation::Edit { valid } => {
                stats.edits += 1;
                if let Some(record) = rig.service.record() {
                    let mut record = record.write();
                    record.name = if valid { format!("item-{step}") } else { String::new() };
                    record.quantity = if valid { rng.random_range(0..100) } else { -1 };
                }
                rig.session.on_field_changed(true);
            }
            SimulatedOperation::Revert => rig.session.on_field_changed(false),
            SimulatedOperation::Save { persist_ok } => {
                stats.saves_attempted += 1;
                persist(&rig, persist_ok);
                match rig.session.save().await {
                    Ok(true) => {
                        stats.saves_succeeded += 1;
                        if rig.session.is_modified() {
                            step_violations.push(Violation::ModifiedAfterSave { step });
                        }
                    }
                    Ok(false) if rig.session.field_errors().is_empty() => stats.saves_failed += 1,
                    Ok(false) => stats.saves_rejected += 1,
                    Err(e) => step_violations.push(Violation::UnexpectedError {
                        step,
                        operation,
                        error: e.to_string(),
                    }),
                }
            }
            SimulatedOperation::SaveAndExit { persist_ok } => {
                stats.saves_attempted += 1;
                persist(&rig, persist_ok);
                match rig.session.save_and_exit().await {
                    Ok(Some(_)) => {
                        stats.saves_succeeded += 1;
                        stats.exits += 1;
                    }
                    Ok(None) if rig.session.field_errors().is_empty() => stats.saves_failed += 1,
                    Ok(None) => stats.saves_rejected += 1,
                    Err(e) => step_violations.push(Violation::UnexpectedError {
                        step,
                        operation,
                        error: e.to_string(),
                    }),
                }
            }
            SimulatedOperation::TryExit => {
                let was_clean = rig.session.is_clean();
                let before = rig.exit.total();
                match rig.session.try_exit() {
                    ExitDecision::Exited(_) => stats.exits += 1,
                    ExitDecision::ConfirmationRequired => stats.exits_refused += 1,
                }
                if !was_clean && rig.exit.total() != before {
                    step_violations.push(Violation::ExitedWhileDirty { step });
                }
            }
            SimulatedOperation::ConfirmExit => {
                rig.session.confirm_exit();
                stats.exits += 1;
            }
            SimulatedOperation::Reload => {
                stats.reloads += 1;
                if let Err(e) = rig.session.load(false).await {
                    step_violations.push(Violation::UnexpectedError {
                        step,
                        operation,
                        error: e.to_string(),
                    });
                }
            }
        }

        check_invariants(&rig, step, operation, &mut step_violations);

        let found = !step_violations.is_empty();
        violations.extend(step_violations);
        if found && config.stop_on_first_violation {
            break;
        }
    }

    stats.render_requests = rig.session.render_requests();
    rig.session.dispose();

    SimulatorReport {
        config,
        stats,
        violations,
    }
}

fn check_invariants(
    rig: &Rig,
    step: u64,
    operation: SimulatedOperation,
    violations: &mut Vec<Violation>,
) {
    let is_clean = rig.session.is_clean();

    let locked = rig.guard.is_locked();
    if locked == is_clean {
        violations.push(Violation::GuardOutOfStep {
            step,
            operation,
            locked,
            is_clean,
        });
    }

    let armed = rig.guard.exit_check_armed();
    if armed == is_clean {
        violations.push(Violation::ExitCheckOutOfStep {
            step,
            operation,
            armed,
            is_clean,
        });
    }

    if rig.session.is_error() {
        violations.push(Violation::ErrorFlagWhileLoaded { step, operation });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_run_passes() {
        let report = run_simulator(SimulatorConfig {
            operations: 500,
            ..SimulatorConfig::default()
        })
        .await;

        assert!(report.passed(), "{}", report.generate_text());
        assert_eq!(report.stats.operations, 500);
        assert!(report.stats.saves_attempted > 0);
    }

    #[tokio::test]
    async fn modal_run_passes() {
        let report = run_simulator(SimulatorConfig {
            seed: 7,
            operations: 300,
            stop_on_first_violation: true,
            session: SessionConfig::new().modal(true),
        })
        .await;

        assert!(report.passed(), "{}", report.generate_text());
    }

    #[tokio::test]
    async fn same_seed_same_stats() {
        let config = SimulatorConfig {
            seed: 99,
            operations: 200,
            ..SimulatorConfig::default()
        };
        let a = run_simulator(config.clone()).await;
        let b = run_simulator(config).await;
        assert_eq!(a.stats.saves_succeeded, b.stats.saves_succeeded);
        assert_eq!(a.stats.exits, b.stats.exits);
    }

    #[test]
    fn sim_record_validation() {
        assert!(!SimRecord::default().validate().is_valid());
        let ok = SimRecord {
            name: "a".into(),
            quantity: 0,
        };
        assert!(ok.validate().is_valid());
    }
}
