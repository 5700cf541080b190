//! Drives a reconciliation plan against the tracker.
//!
//! Operations run strictly in plan order. A failed operation is logged
//! and skipped; the run continues and the failure count poisons the
//! process exit status at the end. Cancellation is checked between
//! operations so a stopped run never issues new tracker calls.

use super::{IssueRef, Op, Plan};
use crate::config::RunContext;
use crate::models::SyncStats;
use crate::render::{issue_labels, render_body, render_title};
use crate::tracker::{label_specs, IssueUpdate, NewIssue, Tracker};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Cooperative cancellation flag checked between tracker operations.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What actually happened during execution.
#[derive(Debug, Default)]
pub struct ExecOutcome {
    pub stats: SyncStats,
    /// Operations that failed permanently and were skipped.
    pub failed_ops: usize,
}

/// Execute a plan. Per-operation failures do not abort the run.
pub fn execute(
    tracker: &dyn Tracker,
    plan: &Plan,
    ctx: &RunContext,
    cancel: &CancelToken,
) -> ExecOutcome {
    let mut outcome = ExecOutcome {
        stats: SyncStats {
            skipped_below_threshold: plan.skipped_below_threshold,
            skipped_max_reached: plan.skipped_max_reached,
            ..Default::default()
        },
        failed_ops: 0,
    };

    if let Err(err) = tracker.ensure_labels(&label_specs(&ctx.config)) {
        error!("Failed to ensure labels: {err}");
        outcome.failed_ops += 1;
    }

    // Tracker numbers of issues created so far, by creation order
    let mut created_numbers: Vec<Option<u64>> = Vec::new();

    for op in &plan.ops {
        if cancel.is_cancelled() {
            warn!("Run cancelled; no further tracker operations will be issued");
            break;
        }
        match op {
            Op::Create { finding } => {
                let issue = NewIssue {
                    title: render_title(finding, &ctx.config.label),
                    body: render_body(finding, ctx),
                    labels: issue_labels(finding, &ctx.config),
                    assignees: ctx.config.assignees.clone(),
                };
                match tracker.create_issue(&issue) {
                    Ok(number) => {
                        info!("Created issue #{}: {}", number, issue.title);
                        created_numbers.push(Some(number));
                        outcome.stats.created += 1;
                    }
                    Err(err) => {
                        error!("Failed to create issue for {}: {err}", finding.fingerprint);
                        created_numbers.push(None);
                        outcome.failed_ops += 1;
                    }
                }
            }

            Op::Update { number, finding } => {
                let update = IssueUpdate {
                    number: *number,
                    title: Some(render_title(finding, &ctx.config.label)),
                    body: Some(render_body(finding, ctx)),
                    labels: Some(issue_labels(finding, &ctx.config)),
                };
                match tracker.update_issue(&update) {
                    Ok(()) => {
                        info!("Updated issue #{number}");
                        outcome.stats.updated += 1;
                    }
                    Err(err) => {
                        error!("Failed to update issue #{number}: {err}");
                        outcome.failed_ops += 1;
                    }
                }
            }

            Op::Comment { number, body } => {
                if let Err(err) = tracker.add_issue_comment(*number, body) {
                    error!("Failed to comment on issue #{number}: {err}");
                    outcome.failed_ops += 1;
                }
            }

            Op::Close { number, comment } => {
                match tracker.close_issue(*number, Some(comment.as_str())) {
                    Ok(()) => {
                        info!("Closed issue #{number}");
                        outcome.stats.closed += 1;
                    }
                    Err(err) => {
                        error!("Failed to close issue #{number}: {err}");
                        outcome.failed_ops += 1;
                    }
                }
            }

            Op::CloseDuplicate { issue, canonical } => {
                let Some(number) = resolve(issue, &created_numbers) else {
                    warn!("Skipping duplicate close: issue was never created");
                    continue;
                };
                let Some(canonical_number) = resolve(canonical, &created_numbers) else {
                    warn!("Skipping duplicate close of #{number}: canonical issue missing");
                    continue;
                };
                let comment = format!(
                    "Duplicate of #{canonical_number}. Closing in favor of the newer report."
                );
                match tracker.close_issue(number, Some(comment.as_str())) {
                    Ok(()) => {
                        info!("Closed issue #{number} as duplicate of #{canonical_number}");
                        outcome.stats.closed += 1;
                    }
                    Err(err) => {
                        error!("Failed to close duplicate issue #{number}: {err}");
                        outcome.failed_ops += 1;
                    }
                }
            }
        }
    }

    outcome
}

fn resolve(issue_ref: &IssueRef, created_numbers: &[Option<u64>]) -> Option<u64> {
    match issue_ref {
        IssueRef::Existing(number) => Some(*number),
        IssueRef::Created(index) => created_numbers.get(*index).copied().flatten(),
    }
}
