use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::utils::coords::Cell;

use super::Path;

// ----------------------------------------------
// PathKey
// ----------------------------------------------

// Canonical cache key for a (start, goal) query, in grid cells.
// Direction matters: the cache does not treat (goal, start) as
// equivalent, so a reverse query is a miss unless the caller
// stores both directions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PathKey {
    pub start: Cell,
    pub goal: Cell,
}

impl PathKey {
    #[inline]
    pub const fn new(start: Cell, goal: Cell) -> Self {
        Self { start, goal }
    }
}

impl std::fmt::Display for PathKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} -> {}", self.start, self.goal)
    }
}

// ----------------------------------------------
// PathCache
// ----------------------------------------------

struct CacheEntry {
    path: Path,
    inserted_at: Instant,
}

// Bounded, time-expiring store of previously computed paths.
// Expiry is lazy (checked on read); eviction at capacity is FIFO by
// insertion order, regardless of access recency. Deliberately simpler
// than LRU, and kept exact for testability.
pub struct PathCache {
    entries: HashMap<PathKey, CacheEntry>,
    insertion_order: VecDeque<PathKey>,
    ttl: Duration,
    max_entries: usize,
}

impl PathCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        debug_assert!(max_entries > 0);
        Self {
            entries: HashMap::with_capacity(max_entries),
            insertion_order: VecDeque::with_capacity(max_entries),
            ttl,
            max_entries,
        }
    }

    #[inline]
    pub fn get(&mut self, key: PathKey) -> Option<&Path> {
        self.get_at(key, Instant::now())
    }

    // An entry older than the TTL is treated as absent and dropped.
    pub(crate) fn get_at(&mut self, key: PathKey, now: Instant) -> Option<&Path> {
        let expired = match self.entries.get(&key) {
            Some(entry) => now.duration_since(entry.inserted_at) > self.ttl,
            None => return None,
        };

        if expired {
            self.remove(key);
            return None;
        }

        self.entries.get(&key).map(|entry| &entry.path)
    }

    #[inline]
    pub fn put(&mut self, key: PathKey, path: Path) {
        self.put_at(key, path, Instant::now());
    }

    pub(crate) fn put_at(&mut self, key: PathKey, path: Path, now: Instant) {
        if self.entries.contains_key(&key) {
            // Re-inserting an existing key refreshes it: it moves to
            // the back of the FIFO order like a fresh insertion.
            self.insertion_order.retain(|existing| *existing != key);
        } else if self.entries.len() >= self.max_entries {
            // At capacity: the oldest-inserted entry goes first.
            if let Some(oldest) = self.insertion_order.pop_front() {
                self.entries.remove(&oldest);
            }
        }

        self.insertion_order.push_back(key);
        self.entries.insert(key, CacheEntry { path, inserted_at: now });
    }

    #[inline]
    pub fn clean_expired(&mut self) {
        self.clean_expired_at(Instant::now());
    }

    // Optional periodic sweep to bound memory between reads.
    pub(crate) fn clean_expired_at(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| now.duration_since(entry.inserted_at) <= ttl);

        let entries = &self.entries;
        self.insertion_order.retain(|key| entries.contains_key(key));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.insertion_order.clear();
    }

    fn remove(&mut self, key: PathKey) {
        self.entries.remove(&key);
        self.insertion_order.retain(|existing| *existing != key);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ----------------------------------------------
// Tests
// ----------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn key(sx: i32, sy: i32, gx: i32, gy: i32) -> PathKey {
        PathKey::new(Cell::new(sx, sy), Cell::new(gx, gy))
    }

    fn path(cells: &[(i32, i32)]) -> Path {
        cells.iter().map(|(x, y)| Cell::new(*x, *y)).collect()
    }

    #[test]
    fn test_get_put_roundtrip() {
        let mut cache = PathCache::new(Duration::from_secs(30), 8);

        let k = key(0, 0, 3, 3);
        assert!(cache.get(k).is_none());

        cache.put(k, path(&[(0, 0), (1, 1), (2, 2), (3, 3)]));
        assert_eq!(cache.get(k).unwrap().len(), 4);
        assert_eq!(cache.len(), 1);

        // Reverse direction is a different key: a miss.
        assert!(cache.get(key(3, 3, 0, 0)).is_none());
    }

    #[test]
    fn test_fifo_eviction() {
        let mut cache = PathCache::new(Duration::from_secs(30), 2);

        let first  = key(0, 0, 1, 1);
        let second = key(0, 0, 2, 2);
        let third  = key(0, 0, 3, 3);

        cache.put(first, path(&[(0, 0), (1, 1)]));
        cache.put(second, path(&[(0, 0), (2, 2)]));

        // Reading `first` must not protect it: eviction is FIFO, not LRU.
        assert!(cache.get(first).is_some());

        cache.put(third, path(&[(0, 0), (3, 3)]));

        assert!(cache.get(first).is_none());
        assert!(cache.get(second).is_some());
        assert!(cache.get(third).is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lazy_ttl_expiry() {
        let ttl = Duration::from_secs(10);
        let mut cache = PathCache::new(ttl, 4);

        let now = Instant::now();
        let k = key(0, 0, 5, 5);
        cache.put_at(k, path(&[(0, 0), (5, 5)]), now);

        // Still fresh right at the TTL boundary.
        assert!(cache.get_at(k, now + ttl).is_some());

        // One tick past the TTL the entry reads as absent and is dropped.
        assert!(cache.get_at(k, now + ttl + Duration::from_millis(1)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clean_expired_sweep() {
        let ttl = Duration::from_secs(10);
        let mut cache = PathCache::new(ttl, 4);

        let now = Instant::now();
        let old_key = key(0, 0, 1, 1);
        let new_key = key(0, 0, 2, 2);

        cache.put_at(old_key, path(&[(0, 0), (1, 1)]), now);
        cache.put_at(new_key, path(&[(0, 0), (2, 2)]), now + Duration::from_secs(8));

        cache.clean_expired_at(now + Duration::from_secs(12));

        // `get` after a sweep past the TTL finds nothing, even though
        // the earlier `put` succeeded.
        assert!(cache.get_at(old_key, now + Duration::from_secs(12)).is_none());
        assert!(cache.get_at(new_key, now + Duration::from_secs(12)).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_put_refreshes_existing_key() {
        let mut cache = PathCache::new(Duration::from_secs(30), 2);

        let first  = key(0, 0, 1, 1);
        let second = key(0, 0, 2, 2);
        let third  = key(0, 0, 3, 3);

        cache.put(first, path(&[(0, 0), (1, 1)]));
        cache.put(second, path(&[(0, 0), (2, 2)]));

        // Refresh `first`: it becomes the newest insertion, so the
        // next eviction takes `second` instead.
        cache.put(first, path(&[(0, 0), (0, 1), (1, 1)]));
        cache.put(third, path(&[(0, 0), (3, 3)]));

        assert!(cache.get(first).is_some());
        assert!(cache.get(second).is_none());
        assert!(cache.get(third).is_some());
        assert_eq!(cache.get(first).unwrap().len(), 3);
    }

    #[test]
    fn test_clear() {
        let mut cache = PathCache::new(Duration::from_secs(30), 4);
        cache.put(key(0, 0, 1, 1), path(&[(0, 0), (1, 1)]));
        cache.put(key(0, 0, 2, 2), path(&[(0, 0), (2, 2)]));

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(key(0, 0, 1, 1)).is_none());
    }
}
