//! Order-preserving pair deduplication.

use dxarb_core::MarketPair;
use std::collections::HashSet;

/// Collects pairs, keeping the first occurrence of each pair address.
#[derive(Debug, Default)]
pub struct PairSet {
    seen: HashSet<String>,
    pairs: Vec<MarketPair>,
}

impl PairSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair. Returns false if its address was already present.
    pub fn insert(&mut self, pair: MarketPair) -> bool {
        if !self.seen.insert(pair.dedup_key()) {
            return false;
        }
        self.pairs.push(pair);
        true
    }

    /// Insert many pairs. Returns how many were new.
    pub fn extend(&mut self, pairs: impl IntoIterator<Item = MarketPair>) -> usize {
        let mut added = 0;
        for pair in pairs {
            if self.insert(pair) {
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Consume the set, keeping at most `cap` pairs in insertion order.
    pub fn into_capped(mut self, cap: usize) -> Vec<MarketPair> {
        self.pairs.truncate(cap);
        self.pairs
    }
}

impl FromIterator<MarketPair> for PairSet {
    fn from_iter<I: IntoIterator<Item = MarketPair>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
