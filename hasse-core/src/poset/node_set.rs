//! Fixed-capacity bit set over node indices.

/// Dense set of node indices in `0..capacity`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct NodeSet {
    words: Vec<u64>,
}

const WORD_BITS: usize = u64::BITS as usize;

impl NodeSet {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(WORD_BITS)],
        }
    }

    /// Inserts `index`, returning whether it was absent. Out-of-range indices
    /// are ignored.
    pub(crate) fn insert(&mut self, index: usize) -> bool {
        let Some(word) = self.words.get_mut(index / WORD_BITS) else {
            return false;
        };
        let mask = 1_u64 << (index % WORD_BITS);
        let absent = *word & mask == 0;
        *word |= mask;
        absent
    }

    pub(crate) fn contains(&self, index: usize) -> bool {
        self.words
            .get(index / WORD_BITS)
            .is_some_and(|word| word & (1_u64 << (index % WORD_BITS)) != 0)
    }

    pub(crate) fn union_with(&mut self, other: &Self) {
        for (mine, theirs) in self.words.iter_mut().zip(&other.words) {
            *mine |= theirs;
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.words
            .iter()
            .map(|word| word.count_ones() as usize)
            .sum()
    }

    /// Ascending iterator over members.
    pub(crate) fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        Self::bits(self.words.iter().copied())
    }

    /// Ascending iterator over members shared with `other`.
    pub(crate) fn intersection<'a>(&'a self, other: &'a Self) -> impl Iterator<Item = usize> + 'a {
        Self::bits(self.words.iter().zip(&other.words).map(|(a, b)| a & b))
    }

    fn bits(words: impl Iterator<Item = u64>) -> impl Iterator<Item = usize> {
        words.enumerate().flat_map(|(slot, mut word)| {
            std::iter::from_fn(move || {
                if word == 0 {
                    return None;
                }
                let bit = word.trailing_zeros() as usize;
                word &= word - 1;
                Some(slot * WORD_BITS + bit)
            })
        })
    }
}
