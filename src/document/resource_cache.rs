//! `DocumentCache`: a shared, lazily-populated table of read-only
//! documents loaded from disk, keyed by `"<link>:<inner_path>"`.
//!
//! Grounded on the probabilistic eviction used by the original engine's
//! document cache: there is no LRU list to maintain. Every access rolls
//! one candidate slot and evicts it if it looks idle, which keeps the
//! structure O(1) per access at the cost of occasionally evicting
//! something still in use (it just gets reloaded next time).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::Rng;

use super::document::Document;
use super::path::split_composite;

/// A single cached document load, with the sentinel it returns for a path
/// that doesn't exist in the file (rather than panicking or erroring).
struct Slot {
    doc: Document,
    hits_since_eviction_roll: u32,
}

/// Lazily loads and caches read-only JSON documents referenced by invoke
/// rules (`functioncalls` targets, `exprs` that read another entity's
/// saved state, etc.).
pub struct DocumentCache {
    slots: HashMap<String, Slot>,
    eviction_chance: f64,
    idle_hits_threshold: u32,
}

impl DocumentCache {
    pub fn new(eviction_chance: f64, idle_hits_threshold: u32) -> Self {
        DocumentCache {
            slots: HashMap::new(),
            eviction_chance,
            idle_hits_threshold,
        }
    }

    /// Read a scalar at `inner_path` inside the document named by `link`.
    /// `key` is the composite `"<link>:<inner_path>"` form; missing files
    /// or missing paths both fall back to `default` rather than erroring,
    /// matching the document's own `get<T>` contract.
    pub fn get<T: super::value::ScalarValue>(&mut self, key: &str, default: T) -> T {
        let (link, inner) = split_composite(key);
        match self.load(link) {
            Some(doc) => doc.get(inner, default),
            None => default,
        }
    }

    fn load(&mut self, link: &str) -> Option<&mut Document> {
        self.maybe_evict();

        if !self.slots.contains_key(link) {
            let doc = read_document(link).unwrap_or_default();
            self.slots.insert(
                link.to_string(),
                Slot {
                    doc,
                    hits_since_eviction_roll: 0,
                },
            );
        }
        let slot = self.slots.get_mut(link)?;
        slot.hits_since_eviction_roll += 1;
        Some(&mut slot.doc)
    }

    /// Roll one random occupied slot and evict it if it has seen fewer
    /// hits than `idle_hits_threshold` since the last roll that touched it.
    fn maybe_evict(&mut self) {
        if self.slots.is_empty() {
            return;
        }
        let mut rng = rand::thread_rng();
        if !rng.gen_bool(self.eviction_chance.clamp(0.0, 1.0)) {
            return;
        }
        let idx = rng.gen_range(0..self.slots.len());
        let candidate = self.slots.keys().nth(idx).cloned();
        if let Some(key) = candidate {
            let idle = self
                .slots
                .get(&key)
                .map(|s| s.hits_since_eviction_roll < self.idle_hits_threshold)
                .unwrap_or(false);
            if idle {
                self.slots.remove(&key);
            } else if let Some(slot) = self.slots.get_mut(&key) {
                slot.hits_since_eviction_roll = 0;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

fn read_document(link: &str) -> Option<Document> {
    let path = Path::new(link);
    let text = fs::read_to_string(path).ok()?;
    Document::deserialize(&text).ok()
}
