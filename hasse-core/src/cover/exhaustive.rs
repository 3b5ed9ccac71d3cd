//! Exhaustive cover: stream every combination up to a size bound, keep
//! the qualifying ones, then keep those no other qualifying combination
//! generalizes.
//!
//! Combinations are produced lazily and scored in fixed-size batches, so
//! memory grows with the qualifying combinations rather than the search
//! space.

use tracing::{info, instrument, warn};

use crate::{
    Result,
    error::HasseError,
    execution::Parallelism,
    poset::NodeId,
    reach::ReachabilityIndex,
};

use super::{CoverStatus, CoverageCombo, CoverageTarget, SetCoverSearcher};

/// Combinations materialized and scored per batch.
const SCORE_BATCH: usize = 4_096;

/// Parameters of an exhaustive run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExhaustiveSearch {
    max_size: usize,
    combination_limit: Option<u128>,
    antichains_only: bool,
    minimal_only: bool,
}

impl ExhaustiveSearch {
    /// Enumerates combinations of one to `max_size` nodes.
    #[must_use]
    pub const fn new(max_size: usize) -> Self {
        Self {
            max_size,
            combination_limit: None,
            antichains_only: false,
            minimal_only: false,
        }
    }

    /// Rejects runs that would enumerate more than `limit` combinations.
    #[must_use]
    pub const fn with_combination_limit(mut self, limit: Option<u128>) -> Self {
        self.combination_limit = limit;
        self
    }

    /// Keeps only combinations whose members are pairwise incomparable.
    #[must_use]
    pub const fn with_antichains_only(mut self, enabled: bool) -> Self {
        self.antichains_only = enabled;
        self
    }

    /// Drops qualifying combinations that strictly contain another
    /// qualifying combination.
    #[must_use]
    pub const fn with_minimal_only(mut self, enabled: bool) -> Self {
        self.minimal_only = enabled;
        self
    }

    /// Largest combination size.
    #[rustfmt::skip]
    #[must_use]
    pub const fn max_size(&self) -> usize { self.max_size }
}

/// Outcome of [`SetCoverSearcher::exhaustive`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExhaustiveCover {
    target: CoverageTarget,
    searched: u128,
    qualified: Vec<CoverageCombo>,
    generalizations: Vec<(usize, usize)>,
    best: Vec<usize>,
    status: CoverStatus,
}

impl ExhaustiveCover {
    /// Number of combinations enumerated.
    #[rustfmt::skip]
    #[must_use]
    pub fn searched(&self) -> u128 { self.searched }

    /// Qualifying combinations by size, then lexicographically.
    #[rustfmt::skip]
    #[must_use]
    pub fn qualified(&self) -> &[CoverageCombo] { &self.qualified }

    /// Edges `(a, b)` between positions in [`Self::qualified`] where every
    /// node of `a` reaches some node of `b`.
    #[rustfmt::skip]
    #[must_use]
    pub fn generalizations(&self) -> &[(usize, usize)] { &self.generalizations }

    /// Qualifying combinations with no incoming generalization edge.
    pub fn best(&self) -> impl Iterator<Item = &CoverageCombo> + '_ {
        self.best
            .iter()
            .filter_map(|&position| self.qualified.get(position))
    }

    /// Target the search worked towards.
    #[rustfmt::skip]
    #[must_use]
    pub fn target(&self) -> CoverageTarget { self.target }

    /// Whether anything qualified.
    #[rustfmt::skip]
    #[must_use]
    pub fn status(&self) -> CoverStatus { self.status }
}

impl SetCoverSearcher {
    /// Exhaustive search over every candidate combination of up to
    /// `search.max_size()` nodes.
    ///
    /// # Errors
    /// Returns [`HasseError::ZeroComboSize`] when `max_size` is zero,
    /// [`HasseError::SearchSpaceTooLarge`] when the enumeration exceeds the
    /// configured limit or cannot be counted in a `u128`,
    /// [`HasseError::InvalidParameter`] when the universe is smaller than the
    /// attached entity count and
    /// [`HasseError::BackendUnavailable`] for an unsupported strategy.
    #[instrument(
        name = "core.exhaustive_cover",
        err,
        skip(self, index, search),
        fields(
            max_size = search.max_size,
            min_required = self.target.min_required(),
            searched = tracing::field::Empty,
        ),
    )]
    pub fn exhaustive(
        &self,
        index: &ReachabilityIndex,
        search: &ExhaustiveSearch,
    ) -> Result<ExhaustiveCover> {
        if search.max_size == 0 {
            warn!("combination size bound is zero");
            return Err(HasseError::ZeroComboSize);
        }
        self.check_universe(index)?;
        let candidates = self.candidates(index);
        let max_size = search.max_size.min(candidates.len());
        let limit = search.combination_limit.unwrap_or(u128::MAX);
        let combinations = match search_space(candidates.len(), max_size) {
            Some(combinations) if combinations <= limit => combinations,
            counted => {
                let combinations = counted.unwrap_or(u128::MAX);
                warn!(combinations, limit, "search space exceeds the configured limit");
                return Err(HasseError::SearchSpaceTooLarge {
                    combinations,
                    limit,
                });
            }
        };
        tracing::Span::current().record("searched", combinations);

        let workload = usize::try_from(combinations).unwrap_or(usize::MAX);
        let mode = Parallelism::resolve(self.strategy, workload, self.parallel_threshold)?;
        let min_required = self.target.min_required();
        let mut combos = Combinations::new(candidates.len(), max_size);
        let mut batch: Vec<Vec<NodeId>> = Vec::with_capacity(SCORE_BATCH);
        let mut qualified: Vec<CoverageCombo> = Vec::new();
        loop {
            batch.clear();
            batch.extend(combos.by_ref().take(SCORE_BATCH).map(|picks| {
                picks
                    .iter()
                    .filter_map(|&position| candidates.get(position).copied())
                    .collect()
            }));
            if batch.is_empty() {
                break;
            }
            let scored = mode.map(0..batch.len(), |i| {
                batch.get(i).and_then(|nodes| {
                    let combo = CoverageCombo::new(nodes.clone(), index.covered_by(nodes).len());
                    let keep = combo.covered >= min_required
                        && (!search.antichains_only || combo.is_antichain(index));
                    keep.then_some(combo)
                })
            });
            qualified.extend(scored.into_iter().flatten());
        }
        if search.minimal_only {
            qualified = minimal(qualified);
        }

        let outgoing = mode.map(0..qualified.len(), |a| {
            let Some(from) = qualified.get(a) else {
                return Vec::new();
            };
            qualified
                .iter()
                .enumerate()
                .filter(|&(b, to)| a != b && from.generalizes(to, index))
                .map(|(b, _)| (a, b))
                .collect::<Vec<_>>()
        });
        let generalizations: Vec<(usize, usize)> = outgoing.into_iter().flatten().collect();
        let mut has_incoming = vec![false; qualified.len()];
        for &(_, to) in &generalizations {
            if let Some(flag) = has_incoming.get_mut(to) {
                *flag = true;
            }
        }
        let best: Vec<usize> = has_incoming
            .iter()
            .enumerate()
            .filter(|(_, incoming)| !**incoming)
            .map(|(position, _)| position)
            .collect();

        let status = if qualified.is_empty() {
            warn!(min_required, "no combination reaches the target");
            CoverStatus::NoQualifyingCombo
        } else {
            CoverStatus::Satisfied
        };
        info!(
            searched = combinations,
            qualified = qualified.len(),
            best = best.len(),
            status = status.as_str(),
            "exhaustive cover finished"
        );
        Ok(ExhaustiveCover {
            target: self.target,
            searched: combinations,
            qualified,
            generalizations,
            best,
            status,
        })
    }
}

/// `Σ_{k=1..=max} C(n, k)`, or `None` when the count overflows `u128`.
pub(super) fn search_space(n: usize, max: usize) -> Option<u128> {
    let max = max.min(n) as u128;
    let n = n as u128;
    let mut total = 0_u128;
    let mut choose = 1_u128;
    for k in 1..=max {
        // C(n, k) = C(n, k - 1) * (n + 1 - k) / k, exact in integers.
        choose = choose.checked_mul(n + 1 - k)? / k;
        total = total.checked_add(choose)?;
    }
    Some(total)
}

/// Positions of every combination of `1..=max_size` out of `len` items, by
/// size then lexicographically, generated one at a time.
#[derive(Debug, Clone)]
pub(super) struct Combinations {
    len: usize,
    max_size: usize,
    picks: Vec<usize>,
    exhausted: bool,
}

impl Combinations {
    pub(super) fn new(len: usize, max_size: usize) -> Self {
        Self {
            len,
            max_size: max_size.min(len),
            picks: vec![0],
            exhausted: len == 0 || max_size == 0,
        }
    }

    fn advance(&mut self) {
        let size = self.picks.len();
        let len = self.len;
        // Rightmost pick that can still move right.
        let movable = (0..size).rev().find(|&slot| {
            self.picks
                .get(slot)
                .is_some_and(|&pick| pick + size < len + slot)
        });
        match movable {
            Some(slot) => {
                let base = self.picks.get(slot).copied().unwrap_or(0);
                for (offset, pick) in self.picks.iter_mut().enumerate().skip(slot) {
                    *pick = base + 1 + offset - slot;
                }
            }
            None if size < self.max_size => self.picks = (0..=size).collect(),
            None => self.exhausted = true,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let current = self.picks.clone();
        self.advance();
        Some(current)
    }
}

fn minimal(qualified: Vec<CoverageCombo>) -> Vec<CoverageCombo> {
    qualified
        .iter()
        .filter(|combo| !qualified.iter().any(|other| other.is_proper_subset_of(combo)))
        .cloned()
        .collect()
}
