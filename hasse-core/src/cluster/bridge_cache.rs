//! Memo of bridge computations keyed by representative pairs.
//!
//! Many entities share a node, so distinct cluster pairs often ask for the
//! same representative pair. Entries are keyed by the unordered pair because
//! the bridge is symmetric.

#[cfg(not(feature = "parallel"))]
use std::{collections::HashMap, sync::Mutex};

#[cfg(feature = "parallel")]
use dashmap::DashMap;

use crate::poset::NodeId;

use super::graph_distance::Bridge;

type BridgeKey = (NodeId, NodeId);

pub(crate) struct BridgeCache {
    #[cfg(feature = "parallel")]
    entries: DashMap<BridgeKey, Option<Bridge>>,
    #[cfg(not(feature = "parallel"))]
    entries: Mutex<HashMap<BridgeKey, Option<Bridge>>>,
}

impl BridgeCache {
    pub(crate) fn new() -> Self {
        Self {
            entries: Default::default(),
        }
    }

    /// Returns the cached bridge for `(a, b)`, computing it on a miss.
    pub(crate) fn get_or_compute(
        &self,
        a: NodeId,
        b: NodeId,
        compute: impl FnOnce() -> Option<Bridge>,
    ) -> Option<Bridge> {
        let key = if a <= b { (a, b) } else { (b, a) };
        if let Some(hit) = self.lookup(&key) {
            self.record_hit();
            return hit;
        }
        self.record_miss();
        let bridge = compute();
        self.store(key, bridge);
        bridge
    }

    pub(crate) fn len(&self) -> usize {
        #[cfg(feature = "parallel")]
        {
            self.entries.len()
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.entries.lock().map_or(0, |entries| entries.len())
        }
    }

    #[cfg(feature = "parallel")]
    fn lookup(&self, key: &BridgeKey) -> Option<Option<Bridge>> {
        self.entries.get(key).map(|entry| *entry)
    }

    #[cfg(not(feature = "parallel"))]
    fn lookup(&self, key: &BridgeKey) -> Option<Option<Bridge>> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).copied())
    }

    #[cfg(feature = "parallel")]
    fn store(&self, key: BridgeKey, bridge: Option<Bridge>) {
        self.entries.insert(key, bridge);
    }

    #[cfg(not(feature = "parallel"))]
    fn store(&self, key: BridgeKey, bridge: Option<Bridge>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, bridge);
        }
    }

    #[cfg(feature = "metrics")]
    fn record_hit(&self) {
        metrics::counter!("bridge_cache_hits").increment(1);
    }

    #[cfg(not(feature = "metrics"))]
    fn record_hit(&self) {}

    #[cfg(feature = "metrics")]
    fn record_miss(&self) {
        metrics::counter!("bridge_cache_misses").increment(1);
    }

    #[cfg(not(feature = "metrics"))]
    fn record_miss(&self) {}
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn symmetric_pairs_share_one_entry() {
        let cache = BridgeCache::new();
        let calls = AtomicUsize::new(0);
        let bridge = Bridge {
            node: NodeId::new(3),
            distance: 2,
        };
        let compute = || {
            calls.fetch_add(1, Ordering::Relaxed);
            Some(bridge)
        };

        assert_eq!(cache.get_or_compute(NodeId::new(1), NodeId::new(2), compute), Some(bridge));
        assert_eq!(cache.get_or_compute(NodeId::new(2), NodeId::new(1), compute), Some(bridge));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn unmergeable_pairs_are_cached_too() {
        let cache = BridgeCache::new();
        assert_eq!(cache.get_or_compute(NodeId::new(0), NodeId::new(4), || None), None);
        assert_eq!(
            cache.get_or_compute(NodeId::new(0), NodeId::new(4), || {
                Some(Bridge {
                    node: NodeId::new(0),
                    distance: 0,
                })
            }),
            None
        );
    }
}
