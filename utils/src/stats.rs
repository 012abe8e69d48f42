//! Named counters for admission statistics.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// A fixed set of thread-safe counters, declared up front by name.
///
/// Unknown names are ignored on write and read as zero.
pub struct StatsCounter {
    counters: BTreeMap<&'static str, AtomicU64>,
}

impl StatsCounter {
    pub fn new(names: &[&'static str]) -> Self {
        Self {
            counters: names.iter().map(|&n| (n, AtomicU64::new(0))).collect(),
        }
    }

    /// Increment `name`, returning the new value.
    pub fn increment(&self, name: &str) -> u64 {
        self.counters
            .get(name)
            .map(|c| c.fetch_add(1, Ordering::Relaxed) + 1)
            .unwrap_or(0)
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// All counters, sorted by name.
    pub fn snapshot(&self) -> BTreeMap<&'static str, u64> {
        self.counters
            .iter()
            .map(|(&k, v)| (k, v.load(Ordering::Relaxed)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_declared_names_only() {
        let stats = StatsCounter::new(&["a", "b"]);
        assert_eq!(stats.increment("a"), 1);
        assert_eq!(stats.increment("a"), 2);
        assert_eq!(stats.increment("missing"), 0);
        assert_eq!(stats.get("a"), 2);
        assert_eq!(stats.get("missing"), 0);

        let snap = stats.snapshot();
        assert_eq!(snap.into_iter().collect::<Vec<_>>(), vec![("a", 2), ("b", 0)]);
    }
}
