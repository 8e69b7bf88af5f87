//! Reference-counted cache of shared instances.

use std::collections::HashMap;
use std::hash::Hash;

use super::Instance;
use crate::key::DependencyKey;

/// Per-key counters that never go below zero.
#[derive(Debug, Clone)]
pub struct RefCounter<K> {
    counts: HashMap<K, usize>,
}

impl<K: Eq + Hash> RefCounter<K> {
    pub fn new() -> Self {
        RefCounter {
            counts: HashMap::new(),
        }
    }

    pub fn count(&self, key: &K) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Returns the new count.
    pub fn increment(&mut self, key: K) -> usize {
        let count = self.counts.entry(key).or_insert(0);
        *count += 1;
        *count
    }

    /// Returns the new count; a key at zero stays at zero.
    pub fn decrement(&mut self, key: &K) -> usize {
        match self.counts.get_mut(key) {
            Some(count) if *count > 1 => {
                *count -= 1;
                *count
            }
            Some(_) => {
                self.counts.remove(key);
                0
            }
            None => 0,
        }
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

impl<K: Eq + Hash> Default for RefCounter<K> {
    fn default() -> Self {
        RefCounter::new()
    }
}

/// Shared instances keyed by their shared key, with one reference per
/// resolved binding key.
///
/// An instance is evicted when its count returns to zero; the next
/// acquisition after that creates a new one.
#[derive(Debug, Default)]
pub struct SharedInstanceCache {
    instances: HashMap<DependencyKey, Instance>,
    refs: RefCounter<DependencyKey>,
}

impl SharedInstanceCache {
    pub fn new() -> Self {
        SharedInstanceCache::default()
    }

    /// Cached instance for `key`, taking a reference to it.
    pub fn acquire(&mut self, key: &DependencyKey) -> Option<Instance> {
        let instance = self.instances.get(key)?.clone();
        self.refs.increment(key.clone());
        Some(instance)
    }

    /// Stores a newly created instance with its first reference.
    pub fn insert(&mut self, key: DependencyKey, instance: Instance) {
        self.refs.increment(key.clone());
        self.instances.insert(key, instance);
    }

    /// Drops one reference; returns the instance if this evicted it.
    pub fn release(&mut self, key: &DependencyKey) -> Option<Instance> {
        if self.refs.decrement(key) == 0 {
            self.instances.remove(key)
        } else {
            None
        }
    }

    pub fn ref_count(&self, key: &DependencyKey) -> usize {
        self.refs.count(key)
    }

    pub fn contains(&self, key: &DependencyKey) -> bool {
        self.instances.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.refs.clear();
    }
}
