use super::ReferenceProvider;
use crate::errors::ProviderResult;
use schema::{normalize_name, CreatureProfile, EvolutionChain, SpeciesPage};
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Fixed-capacity map that evicts the least recently used entry.
///
/// No time-based expiry: an entry lives until it is pushed out. A hit moves
/// the key to the back of the recency list in O(capacity), so keep capacities
/// small (the service config caps them).
#[derive(Debug)]
pub struct LruCache<K, V> {
    capacity: usize,
    entries: HashMap<K, V>,
    // Front is least recently used.
    order: VecDeque<K>,
}

impl<K: Eq + Hash + Clone, V: Clone> LruCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Membership test that does not count as a use.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        let value = self.entries.get(key)?.clone();
        self.touch(key);
        Some(value)
    }

    pub fn insert(&mut self, key: K, value: V) {
        if self.entries.insert(key.clone(), value).is_some() {
            self.touch(&key);
            return;
        }
        self.order.push_back(key);
        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(evicted) => {
                    self.entries.remove(&evicted);
                }
                None => break,
            }
        }
    }

    fn touch(&mut self, key: &K) {
        if let Some(position) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(position) {
                self.order.push_back(k);
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Entries are plain values, so a poisoned lock is still usable.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Memoizes profile and evolution-chain lookups of another provider.
///
/// Only successful lookups are stored. Sprites, the species index and the
/// health probe always go to the inner provider; use `inner()` to bypass the
/// cache for lookups that must be fresh.
#[derive(Debug)]
pub struct CachedProvider<P> {
    inner: P,
    profiles: Mutex<LruCache<String, CreatureProfile>>,
    chains: Mutex<LruCache<String, EvolutionChain>>,
}

impl<P: ReferenceProvider> CachedProvider<P> {
    pub fn new(inner: P, capacity: usize) -> Self {
        Self {
            inner,
            profiles: Mutex::new(LruCache::new(capacity)),
            chains: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn cached_profiles(&self) -> usize {
        lock(&self.profiles).len()
    }

    pub fn cached_chains(&self) -> usize {
        lock(&self.chains).len()
    }
}

impl<P: ReferenceProvider> ReferenceProvider for CachedProvider<P> {
    fn resolve(&self, name: &str) -> ProviderResult<CreatureProfile> {
        let key = normalize_name(name);
        if let Some(profile) = lock(&self.profiles).get(&key) {
            log::debug!("profile cache hit for {}", key);
            return Ok(profile);
        }
        log::debug!("profile cache miss for {}", key);
        // The lock is not held across the fetch; concurrent misses may both
        // fetch and store the same value.
        let profile = self.inner.resolve(&key)?;
        lock(&self.profiles).insert(key, profile.clone());
        Ok(profile)
    }

    fn evolution_chain(&self, name: &str) -> ProviderResult<EvolutionChain> {
        let key = normalize_name(name);
        if let Some(chain) = lock(&self.chains).get(&key) {
            log::debug!("evolution chain cache hit for {}", key);
            return Ok(chain);
        }
        log::debug!("evolution chain cache miss for {}", key);
        let chain = self.inner.evolution_chain(&key)?;
        lock(&self.chains).insert(key, chain.clone());
        Ok(chain)
    }

    fn sprite_bytes(&self, sprite_id: u32) -> ProviderResult<Vec<u8>> {
        self.inner.sprite_bytes(sprite_id)
    }

    fn list_species(&self, offset: u32, limit: u32) -> ProviderResult<SpeciesPage> {
        self.inner.list_species(offset, limit)
    }

    fn probe(&self) -> ProviderResult<()> {
        self.inner.probe()
    }
}
