//! Precedence matrices derived from observed event sequences.
//!
//! An episode is a sequence of terms, each term a set of events seen
//! together. For a fixed [`EventOrder`] the episode yields, per event, the
//! 1-based indices of the terms containing it, and a relation matrix with
//! `M[i][j] = 1` exactly when both events occur and every occurrence of `i`
//! precedes every occurrence of `j`.

use std::{
    collections::{BTreeSet, HashMap},
    num::NonZeroUsize,
    sync::Arc,
};

use tracing::{debug, instrument, warn};

use crate::{
    Result,
    datasource::MatrixSource,
    error::{DataSourceError, HasseError},
    matrix::RelationMatrix,
};

/// Ordered list of tracked events; row and column `i` of every episode
/// matrix refer to event `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOrder {
    events: Vec<Arc<str>>,
    lookup: HashMap<Arc<str>, usize>,
}

impl EventOrder {
    /// Creates an order from distinct event names.
    ///
    /// # Errors
    /// Returns [`HasseError::InvalidParameter`] when `events` is empty or
    /// names an event twice.
    pub fn try_new<I, S>(events: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut order = Self {
            events: Vec::new(),
            lookup: HashMap::new(),
        };
        for event in events {
            let name: Arc<str> = Arc::from(event.as_ref());
            if order.lookup.contains_key(&name) {
                return Err(HasseError::InvalidParameter {
                    name: "events",
                    reason: Arc::from(format!("event `{name}` is listed twice")),
                });
            }
            order.lookup.insert(Arc::clone(&name), order.events.len());
            order.events.push(name);
        }
        if order.events.is_empty() {
            return Err(HasseError::InvalidParameter {
                name: "events",
                reason: Arc::from("at least one event must be tracked"),
            });
        }
        Ok(order)
    }

    /// Number of tracked events, which is also the matrix order.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always `false`; construction rejects empty orders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event names in matrix order.
    #[rustfmt::skip]
    #[must_use]
    pub fn events(&self) -> &[Arc<str>] { &self.events }

    /// Row of `event`, if tracked.
    #[must_use]
    pub fn position(&self, event: &str) -> Option<usize> {
        self.lookup.get(event).copied()
    }

    /// Encodes one episode. Events outside the order are ignored.
    ///
    /// # Examples
    /// ```
    /// use hasse_core::EventOrder;
    ///
    /// let order = EventOrder::try_new(["open", "read", "close"])?;
    /// let episode = order.episode(&[vec!["open"], vec!["read", "noise"], vec!["close"]]);
    /// assert_eq!(episode.matrix().get(0, 2), Some(1));
    /// assert_eq!(episode.matrix().get(2, 0), Some(0));
    /// assert_eq!(episode.positions(1).map(|p| p.len()), Some(1));
    /// # Ok::<(), hasse_core::HasseError>(())
    /// ```
    #[must_use]
    pub fn episode<T: AsRef<str>>(&self, terms: &[Vec<T>]) -> Episode {
        let mut positions = vec![BTreeSet::new(); self.len()];
        for (term, events) in terms.iter().enumerate() {
            for event in events {
                if let Some(slot) = self
                    .position(event.as_ref())
                    .and_then(|row| positions.get_mut(row))
                {
                    slot.insert(term + 1);
                }
            }
        }
        let order = NonZeroUsize::new(self.len()).unwrap_or(NonZeroUsize::MIN);
        // M[i][j] = 1 iff i != j, both occur and max(P_i) < min(P_j).
        let matrix = RelationMatrix::tabulate(order, |row, col| {
            u32::from(row != col && precedes(positions.get(row), positions.get(col)))
        });
        Episode { matrix, positions }
    }
}

fn precedes(before: Option<&BTreeSet<usize>>, after: Option<&BTreeSet<usize>>) -> bool {
    match (before.and_then(|p| p.last()), after.and_then(|p| p.first())) {
        (Some(last), Some(first)) => last < first,
        _ => false,
    }
}

/// One encoded episode: its relation matrix and per-event term positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    matrix: RelationMatrix,
    positions: Vec<BTreeSet<usize>>,
}

impl Episode {
    /// Pairs a stored matrix with its position sets, for episodes encoded
    /// elsewhere.
    ///
    /// # Errors
    /// Returns [`HasseError::DimensionMismatch`] when the matrix order and
    /// the number of position sets differ.
    pub fn from_parts(matrix: RelationMatrix, positions: Vec<BTreeSet<usize>>) -> Result<Self> {
        if matrix.order() != positions.len() {
            return Err(HasseError::DimensionMismatch {
                expected: positions.len(),
                actual: matrix.order(),
            });
        }
        Ok(Self { matrix, positions })
    }

    /// The stored relation matrix.
    #[rustfmt::skip]
    #[must_use]
    pub fn matrix(&self) -> &RelationMatrix { &self.matrix }

    /// Term indices at which event `row` occurs.
    #[must_use]
    pub fn positions(&self, row: usize) -> Option<&BTreeSet<usize>> {
        self.positions.get(row)
    }

    fn both_occur(&self, i: usize, j: usize) -> bool {
        let occurs = |row| self.positions(row).is_some_and(|p| !p.is_empty());
        occurs(i) && occurs(j)
    }
}

/// Relation that holds for a whole group of episodes.
///
/// `M[i][j] = 1` iff every member in which both events occur stores
/// `M_c[i][j] = 1`, and at least one member shows `i` strictly before `j`.
///
/// # Errors
/// Returns [`HasseError::EmptySource`] for an empty group and
/// [`HasseError::DimensionMismatch`] when members disagree on the order.
#[instrument(name = "core.consensus", err, skip(episodes), fields(members = episodes.len()))]
pub fn consensus_matrix(episodes: &[&Episode]) -> Result<RelationMatrix> {
    let Some(first) = episodes.first() else {
        warn!("consensus requested for an empty group");
        return Err(HasseError::EmptySource {
            data_source: Arc::from("consensus"),
        });
    };
    let order = first.matrix.dimension();
    if let Some(odd) = episodes.iter().find(|e| e.matrix.order() != order.get()) {
        return Err(HasseError::DimensionMismatch {
            expected: order.get(),
            actual: odd.matrix.order(),
        });
    }
    let holds = |i: usize, j: usize| {
        let consistent = episodes
            .iter()
            .filter(|episode| episode.both_occur(i, j))
            .all(|episode| episode.matrix.get(i, j) == Some(1));
        let witnessed = episodes
            .iter()
            .any(|episode| precedes(episode.positions(i), episode.positions(j)));
        i != j && consistent && witnessed
    };
    let consensus = RelationMatrix::tabulate(order, |row, col| u32::from(holds(row, col)));
    debug!(relations = consensus.relation_count(), "consensus computed");
    Ok(consensus)
}

/// Named, ordered collection of episodes usable as an entity source.
#[derive(Debug, Clone)]
pub struct EpisodeFamily {
    name: Arc<str>,
    events: EventOrder,
    episodes: Vec<Episode>,
}

impl EpisodeFamily {
    /// Creates a family whose episodes all follow `events`.
    ///
    /// # Errors
    /// Returns [`HasseError::DimensionMismatch`] when an episode matrix does
    /// not match the event count.
    pub fn try_new(
        name: impl Into<Arc<str>>,
        events: EventOrder,
        episodes: Vec<Episode>,
    ) -> Result<Self> {
        if let Some(odd) = episodes.iter().find(|e| e.matrix.order() != events.len()) {
            return Err(HasseError::DimensionMismatch {
                expected: events.len(),
                actual: odd.matrix.order(),
            });
        }
        Ok(Self {
            name: name.into(),
            events,
            episodes,
        })
    }

    /// Tracked events.
    #[rustfmt::skip]
    #[must_use]
    pub fn events(&self) -> &EventOrder { &self.events }

    /// Episodes in input order.
    #[rustfmt::skip]
    #[must_use]
    pub fn episodes(&self) -> &[Episode] { &self.episodes }

    /// Replaces every stored matrix with its copy without self-relations.
    #[must_use]
    pub fn without_diagonal(mut self) -> Self {
        for episode in &mut self.episodes {
            episode.matrix = episode.matrix.without_diagonal();
        }
        self
    }

    /// Consensus of the episodes at `members`.
    ///
    /// # Errors
    /// Propagates [`consensus_matrix`] errors and returns
    /// [`HasseError::DataSource`] for an out-of-range member.
    pub fn consensus<I>(&self, members: I) -> Result<RelationMatrix>
    where
        I: IntoIterator<Item = usize>,
    {
        let group = members
            .into_iter()
            .map(|index| {
                self.episodes
                    .get(index)
                    .ok_or_else(|| {
                        HasseError::data_source(&self.name, DataSourceError::OutOfBounds { index })
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        consensus_matrix(&group)
    }
}

impl MatrixSource for EpisodeFamily {
    fn len(&self) -> usize {
        self.episodes.len()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn matrix(&self, index: usize) -> std::result::Result<&RelationMatrix, DataSourceError> {
        self.episodes
            .get(index)
            .map(Episode::matrix)
            .ok_or(DataSourceError::OutOfBounds { index })
    }
}
