//! Per-frame diagnostics returned by the scheduler

use crate::foundation::math::Vec3;
use crate::physics::narrow_phase::DetectionStats;

/// Counters for one scheduler step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Shape pairs run through a narrow-phase test
    pub hit_tests: u32,
    /// Contacts handed to a resolver
    pub contacts_resolved: u32,
    /// Resolve-loop iterations used
    pub iterations: u32,
    /// Broad-phase candidate pairs
    pub candidate_pairs: u32,
    /// Primitive tests skipped for degenerate input
    pub degenerate_inputs: u32,
    /// Resolutions aborted for breaking an invariant
    pub invariant_violations: u32,
    /// Animations removed by cleanup
    pub removed: u32,
    /// Animations alive after cleanup
    pub active: u32,
    /// False when the iteration cap was hit with contacts still pending
    pub converged: bool,
    /// Resolved contact points, when recording is enabled
    pub contact_points: Vec<Vec3>,
}

impl FrameReport {
    pub(crate) fn absorb(&mut self, stats: &DetectionStats) {
        self.hit_tests += stats.hit_tests;
        self.degenerate_inputs += stats.degenerate_inputs;
    }
}

impl std::fmt::Display for FrameReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "active {} | candidates {} | tests {} | contacts {} | iterations {}{}",
            self.active,
            self.candidate_pairs,
            self.hit_tests,
            self.contacts_resolved,
            self.iterations,
            if self.converged { "" } else { " (capped)" },
        )?;
        if self.degenerate_inputs > 0 || self.invariant_violations > 0 {
            write!(
                f,
                " | degenerate {} | violations {}",
                self.degenerate_inputs, self.invariant_violations
            )?;
        }
        Ok(())
    }
}
