//! BD-003: Binding cache, the memo table for one resolution pass.
//!
//! Instances are stored in one typed slot per category, so a lookup for
//! category `K` can only ever return an `Arc<K>`. The slot table itself is
//! type-erased and keyed by the category's `TypeId`; a slot whose concrete
//! type disagrees with its key is a broken invariant and aborts loudly.
//!
//! Every insertion is journaled so a failed bind can roll the cache back to
//! the state it had before that bind started.

use super::blueprint::Category;
use super::types::CacheKey;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::sync::Arc;

// ============================================================================
// Category slots
// ============================================================================

trait ErasedSlot: Send {
    fn category(&self) -> &'static str;
    fn len(&self) -> usize;
    fn contains(&self, key: &CacheKey) -> bool;
    fn keys(&self) -> Vec<CacheKey>;
    fn remove(&mut self, key: &CacheKey) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct CategorySlot<K: Category + ?Sized> {
    instances: IndexMap<CacheKey, Arc<K>>,
}

impl<K: Category + ?Sized> CategorySlot<K> {
    fn new() -> Self {
        Self {
            instances: IndexMap::new(),
        }
    }
}

impl<K: Category + ?Sized> ErasedSlot for CategorySlot<K> {
    fn category(&self) -> &'static str {
        K::NAME
    }

    fn len(&self) -> usize {
        self.instances.len()
    }

    fn contains(&self, key: &CacheKey) -> bool {
        self.instances.contains_key(key)
    }

    fn keys(&self) -> Vec<CacheKey> {
        self.instances.keys().copied().collect()
    }

    fn remove(&mut self, key: &CacheKey) -> bool {
        self.instances.shift_remove(key).is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn slot_mismatch<K: Category + ?Sized>(found: &'static str) -> ! {
    panic!(
        "binding cache invariant violated: slot for category '{}' holds '{}' instances",
        K::NAME,
        found
    )
}

// ============================================================================
// BindingCache
// ============================================================================

/// Position in the insertion journal, used to undo a failed bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Memo table mapping `(blueprint, context)` to the bound instance.
#[derive(Default)]
pub struct BindingCache {
    slots: FxHashMap<TypeId, Box<dyn ErasedSlot>>,
    journal: Vec<(TypeId, CacheKey)>,
    hits: u64,
    misses: u64,
}

impl BindingCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot<K: Category + ?Sized>(&self) -> Option<&CategorySlot<K>> {
        let slot = self.slots.get(&TypeId::of::<K>())?;
        match slot.as_any().downcast_ref::<CategorySlot<K>>() {
            Some(typed) => Some(typed),
            None => slot_mismatch::<K>(slot.category()),
        }
    }

    fn slot_mut<K: Category + ?Sized>(&mut self) -> &mut CategorySlot<K> {
        let slot = self
            .slots
            .entry(TypeId::of::<K>())
            .or_insert_with(|| Box::new(CategorySlot::<K>::new()));
        let found = slot.category();
        match slot.as_any_mut().downcast_mut::<CategorySlot<K>>() {
            Some(typed) => typed,
            None => slot_mismatch::<K>(found),
        }
    }

    /// Look up an instance without touching the hit/miss counters.
    pub fn get<K: Category + ?Sized>(&self, key: &CacheKey) -> Option<Arc<K>> {
        self.slot::<K>()
            .and_then(|slot| slot.instances.get(key))
            .cloned()
    }

    /// Look up an instance during binding; counts a hit or a miss.
    pub fn lookup<K: Category + ?Sized>(&mut self, key: &CacheKey) -> Option<Arc<K>> {
        let found = self.get::<K>(key);
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    /// Store an instance. Returns the instance previously stored under `key`.
    pub fn insert<K: Category + ?Sized>(&mut self, key: CacheKey, instance: Arc<K>) -> Option<Arc<K>> {
        self.journal.push((TypeId::of::<K>(), key));
        self.slot_mut::<K>().instances.insert(key, instance)
    }

    /// True if any category holds an instance under `key`.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.slots.values().any(|slot| slot.contains(key))
    }

    pub fn len(&self) -> usize {
        self.slots.values().map(|slot| slot.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self.slots.values().flat_map(|slot| slot.keys()).collect();
        keys.sort();
        keys
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.journal.len())
    }

    /// Remove every instance inserted after `checkpoint`. Returns how many
    /// entries were dropped.
    pub fn rollback(&mut self, checkpoint: Checkpoint) -> usize {
        let mut removed = 0;
        while self.journal.len() > checkpoint.0 {
            let Some((type_id, key)) = self.journal.pop() else {
                break;
            };
            if let Some(slot) = self.slots.get_mut(&type_id) {
                if slot.remove(&key) {
                    removed += 1;
                }
            }
        }
        removed
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.journal.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Serializable view of the cache contents.
    pub fn snapshot(&self) -> CacheSnapshot {
        let mut entries: Vec<CacheEntry> = self
            .slots
            .values()
            .flat_map(|slot| {
                let category = slot.category().to_string();
                slot.keys().into_iter().map(move |key| CacheEntry {
                    key,
                    category: category.clone(),
                })
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        CacheSnapshot {
            entries,
            hits: self.hits,
            misses: self.misses,
        }
    }
}

impl std::fmt::Debug for BindingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingCache")
            .field("entries", &self.len())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}

/// One cached instance, by key and category name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub category: String,
}

/// Snapshot of a cache for inspection and test assertions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub entries: Vec<CacheEntry>,
    pub hits: u64,
    pub misses: u64,
}
