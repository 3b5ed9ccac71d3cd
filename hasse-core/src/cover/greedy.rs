//! Greedy cover: repeatedly take the node adding the most uncovered
//! entities.

use std::collections::BTreeSet;

use tracing::{debug, info, instrument, warn};

use crate::{
    Result,
    execution::Parallelism,
    poset::NodeId,
    reach::{EntityId, ReachabilityIndex},
};

use super::{CoverStatus, CoverageCombo, CoverageTarget, SetCoverSearcher};

/// One pick of the greedy search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GreedyStep {
    /// Node chosen at this step.
    pub node: NodeId,
    /// Entities this node added to the cover.
    pub gained: usize,
    /// Entities covered after this step.
    pub covered: usize,
    /// `covered` as a share of the universe.
    pub share: f64,
}

/// Outcome of [`SetCoverSearcher::greedy`].
#[derive(Debug, Clone, PartialEq)]
pub struct GreedyCover {
    target: CoverageTarget,
    steps: Vec<GreedyStep>,
    covered: BTreeSet<EntityId>,
    status: CoverStatus,
}

impl GreedyCover {
    /// Picks in order, with running coverage.
    #[rustfmt::skip]
    #[must_use]
    pub fn steps(&self) -> &[GreedyStep] { &self.steps }

    /// Final covered entity count.
    #[must_use]
    pub fn covered(&self) -> usize {
        self.covered.len()
    }

    /// Covered entities, ascending.
    #[rustfmt::skip]
    #[must_use]
    pub fn covered_entities(&self) -> &BTreeSet<EntityId> { &self.covered }

    /// Final covered share of the universe.
    #[must_use]
    pub fn share(&self) -> f64 {
        self.target.share(self.covered.len())
    }

    /// Target the search worked towards.
    #[rustfmt::skip]
    #[must_use]
    pub fn target(&self) -> CoverageTarget { self.target }

    /// Whether the target was reached.
    #[rustfmt::skip]
    #[must_use]
    pub fn status(&self) -> CoverStatus { self.status }

    /// The chosen nodes as one combination.
    #[must_use]
    pub fn combo(&self) -> CoverageCombo {
        CoverageCombo::new(
            self.steps.iter().map(|step| step.node).collect(),
            self.covered.len(),
        )
    }
}

impl SetCoverSearcher {
    /// Greedy cover of the target.
    ///
    /// Each step takes the candidate with the most still-uncovered entities,
    /// the lowest node winning ties. The search stops once the target is met
    /// or no candidate adds coverage, so it takes at most one step per
    /// candidate.
    ///
    /// # Errors
    /// Returns [`crate::HasseError::InvalidParameter`] when the universe is
    /// smaller than the attached entity count and
    /// [`crate::HasseError::BackendUnavailable`] for an unsupported strategy.
    #[instrument(
        name = "core.greedy_cover",
        err,
        skip(self, index),
        fields(
            universe = self.target.universe(),
            min_required = self.target.min_required(),
            excluded = self.excluded.len(),
        ),
    )]
    pub fn greedy(&self, index: &ReachabilityIndex) -> Result<GreedyCover> {
        self.check_universe(index)?;
        let candidates = self.candidates(index);
        let mode = Parallelism::resolve(self.strategy, candidates.len(), self.parallel_threshold)?;
        let min_required = self.target.min_required();

        let mut remaining = candidates;
        let mut covered: BTreeSet<EntityId> = BTreeSet::new();
        let mut steps = Vec::new();
        while covered.len() < min_required {
            let gains = mode.map(0..remaining.len(), |i| {
                remaining
                    .get(i)
                    .and_then(|&node| index.reach(node))
                    .map_or(0, |reach| reach.difference(&covered).count())
            });
            let Some((position, gained)) = best_gain(&gains) else {
                break;
            };
            let node = remaining.remove(position);
            if let Some(reach) = index.reach(node) {
                covered.extend(reach.iter().copied());
            }
            let step = GreedyStep {
                node,
                gained,
                covered: covered.len(),
                share: self.target.share(covered.len()),
            };
            debug!(node = node.get(), gained, covered = step.covered, "greedy pick");
            steps.push(step);
        }

        let status = if covered.len() >= min_required {
            CoverStatus::Satisfied
        } else {
            warn!(
                covered = covered.len(),
                min_required, "no remaining node adds coverage"
            );
            CoverStatus::Exhausted
        };
        info!(
            steps = steps.len(),
            covered = covered.len(),
            status = status.as_str(),
            "greedy cover finished"
        );
        Ok(GreedyCover {
            target: self.target,
            steps,
            covered,
            status,
        })
    }
}

/// First position with the strictly largest non-zero gain.
fn best_gain(gains: &[usize]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    for (position, &gain) in gains.iter().enumerate() {
        if gain > 0 && best.is_none_or(|(_, current)| gain > current) {
            best = Some((position, gain));
        }
    }
    best
}
