//! Finding-to-issue reconciliation.
//!
//! [`plan`] is the pure state machine: it maps the current finding set
//! plus the tracker's existing issues onto a deterministic operation
//! sequence. [`execute`] drives that sequence against a [`Tracker`]
//! under rate limiting, isolating per-operation failures.
//!
//! [`Tracker`]: crate::tracker::Tracker

mod execute;
mod plan;

pub use execute::{execute, CancelToken, ExecOutcome};
pub use plan::plan;

use crate::models::{Finding, SyncStats};

/// Number of consecutive missed runs before an absent finding's issue is
/// closed. Protects against analyzers that flap.
pub const FLAP_PROTECTION_RUNS: u64 = 3;

/// Reference to an issue the plan touches: one that already exists, or
/// one the plan itself creates (indexed by creation order). Created
/// issues always receive higher numbers than existing ones, so ordering
/// created-after-existing preserves "highest issue number wins" without
/// knowing tracker-assigned numbers at planning time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueRef {
    Existing(u64),
    Created(usize),
}

impl IssueRef {
    /// Sort key reproducing tracker number order across the two variants.
    fn rank(&self) -> (u8, u64) {
        match self {
            IssueRef::Existing(number) => (0, *number),
            IssueRef::Created(index) => (1, *index as u64),
        }
    }
}

/// One tracker operation the plan decided on.
#[derive(Debug, Clone)]
pub enum Op {
    Create {
        finding: Finding,
    },
    Update {
        number: u64,
        finding: Finding,
    },
    Comment {
        number: u64,
        body: String,
    },
    Close {
        number: u64,
        comment: String,
    },
    /// Close `issue` as a duplicate of `canonical`; the canonical issue
    /// number may only be known after execution creates it.
    CloseDuplicate {
        issue: IssueRef,
        canonical: IssueRef,
    },
}

/// The reconciler's decision for one run.
#[derive(Debug, Default)]
pub struct Plan {
    pub ops: Vec<Op>,
    pub skipped_below_threshold: usize,
    pub skipped_max_reached: usize,
}

impl Plan {
    /// Stats this plan would produce if every operation succeeds.
    pub fn projected_stats(&self, skipped_duplicate: usize) -> SyncStats {
        let mut stats = SyncStats {
            skipped_below_threshold: self.skipped_below_threshold,
            skipped_duplicate,
            skipped_max_reached: self.skipped_max_reached,
            ..Default::default()
        };
        for op in &self.ops {
            match op {
                Op::Create { .. } => stats.created += 1,
                Op::Update { .. } => stats.updated += 1,
                Op::Close { .. } | Op::CloseDuplicate { .. } => stats.closed += 1,
                Op::Comment { .. } => {}
            }
        }
        stats
    }
}
