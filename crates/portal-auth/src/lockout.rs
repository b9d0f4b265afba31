//! Login throttling state
//!
//! Failed logins are counted per client key. A client is locked out once it
//! reaches [`LockoutPolicy::max_attempts`] failures, until
//! [`LockoutPolicy::window`] has passed since its last failure. Expiry is
//! evaluated whenever an entry is touched; nothing sweeps the map in the
//! background.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Lockout thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_attempts: u32,
    pub window: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::minutes(5),
        }
    }
}

/// Failure record for one client key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutEntry {
    pub failures: u32,
    pub last_failure: DateTime<Utc>,
}

impl LockoutEntry {
    pub fn is_expired(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.last_failure >= window
    }

    pub fn is_locked(&self, policy: &LockoutPolicy, now: DateTime<Utc>) -> bool {
        self.failures >= policy.max_attempts && !self.is_expired(now, policy.window)
    }
}

/// Storage for lockout entries.
///
/// Each call must be atomic with respect to its key.
pub trait LockoutStore: Send + Sync {
    /// Current entry for `key`. Entries older than the window read as absent.
    fn read(&self, key: &str, now: DateTime<Utc>) -> Option<LockoutEntry>;

    /// Record a failure at `now`. An expired entry restarts from zero.
    fn increment(&self, key: &str, now: DateTime<Utc>) -> LockoutEntry;

    fn clear(&self, key: &str);
}

/// Default number of tracked keys above which `increment` drops expired entries first
pub const PRUNE_THRESHOLD: usize = 10_000;

/// Process-local lockout store
#[derive(Debug)]
pub struct MemoryLockoutStore {
    window: Duration,
    prune_threshold: usize,
    entries: Mutex<HashMap<String, LockoutEntry>>,
}

impl MemoryLockoutStore {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            prune_threshold: PRUNE_THRESHOLD,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_prune_threshold(mut self, threshold: usize) -> Self {
        self.prune_threshold = threshold;
        self
    }

    pub fn for_policy(policy: &LockoutPolicy) -> Self {
        Self::new(policy.window)
    }

    /// Number of tracked keys, including expired ones not yet touched
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LockoutStore for MemoryLockoutStore {
    fn read(&self, key: &str, now: DateTime<Utc>) -> Option<LockoutEntry> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now, self.window) => {
                entries.remove(key);
                None
            }
            other => other.copied(),
        }
    }

    fn increment(&self, key: &str, now: DateTime<Utc>) -> LockoutEntry {
        let mut entries = self.entries.lock();

        if entries.len() >= self.prune_threshold {
            let window = self.window;
            entries.retain(|_, entry| !entry.is_expired(now, window));
        }

        let entry = entries.entry(key.to_string()).or_insert(LockoutEntry {
            failures: 0,
            last_failure: now,
        });
        if entry.is_expired(now, self.window) {
            entry.failures = 0;
        }
        entry.failures += 1;
        entry.last_failure = now;
        *entry
    }

    fn clear(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn start() -> DateTime<Utc> {
        "2024-06-01T08:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_increment_counts_failures() {
        let store = MemoryLockoutStore::new(Duration::minutes(5));
        let now = start();

        assert!(store.read("10.0.0.1", now).is_none());
        store.increment("10.0.0.1", now);
        let entry = store.increment("10.0.0.1", now + Duration::seconds(10));

        assert_eq!(entry.failures, 2);
        assert_eq!(entry.last_failure, now + Duration::seconds(10));
        assert_eq!(store.read("10.0.0.1", now + Duration::seconds(20)), Some(entry));
        assert!(store.read("10.0.0.2", now).is_none());
    }

    #[test]
    fn test_expired_entry_reads_as_absent() {
        let store = MemoryLockoutStore::new(Duration::minutes(5));
        let now = start();
        store.increment("k", now);

        assert!(store.read("k", now + Duration::minutes(4)).is_some());
        assert!(store.read("k", now + Duration::minutes(5)).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_increment_after_expiry_restarts_count() {
        let store = MemoryLockoutStore::new(Duration::minutes(5));
        let now = start();
        for _ in 0..4 {
            store.increment("k", now);
        }

        let entry = store.increment("k", now + Duration::minutes(6));
        assert_eq!(entry.failures, 1);
    }

    #[test]
    fn test_increment_prunes_expired_keys_past_threshold() {
        let store = MemoryLockoutStore::new(Duration::minutes(5)).with_prune_threshold(3);
        let now = start();
        for key in ["a", "b", "c"] {
            store.increment(key, now);
        }
        assert_eq!(store.len(), 3);

        store.increment("d", now + Duration::minutes(5));
        assert_eq!(store.len(), 1);
        assert!(store.read("d", now + Duration::minutes(5)).is_some());
    }

    #[test]
    fn test_increment_keeps_live_keys_when_pruning() {
        let store = MemoryLockoutStore::new(Duration::minutes(5)).with_prune_threshold(3);
        let now = start();
        store.increment("old", now);
        store.increment("live1", now + Duration::minutes(3));
        store.increment("live2", now + Duration::minutes(4));

        store.increment("new", now + Duration::minutes(6));
        assert_eq!(store.len(), 3);
        assert!(store.read("old", now + Duration::minutes(6)).is_none());
        assert!(store.read("live1", now + Duration::minutes(6)).is_some());
    }

    #[test]
    fn test_no_pruning_below_threshold() {
        let store = MemoryLockoutStore::new(Duration::minutes(5));
        let now = start();
        for key in ["a", "b", "c"] {
            store.increment(key, now);
        }

        store.increment("d", now + Duration::minutes(10));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_clear_removes_entry() {
        let store = MemoryLockoutStore::new(Duration::minutes(5));
        store.increment("k", start());
        store.clear("k");
        store.clear("k");
        assert!(store.read("k", start()).is_none());
    }

    #[test]
    fn test_is_locked_uses_threshold_and_window() {
        let policy = LockoutPolicy::default();
        let now = start();
        let entry = LockoutEntry {
            failures: 5,
            last_failure: now,
        };

        assert!(entry.is_locked(&policy, now + Duration::minutes(4)));
        assert!(!entry.is_locked(&policy, now + Duration::minutes(5)));
        assert!(
            !LockoutEntry {
                failures: 4,
                last_failure: now
            }
            .is_locked(&policy, now)
        );
    }

    #[test]
    fn test_concurrent_increments_keep_entry() {
        let store = Arc::new(MemoryLockoutStore::new(Duration::minutes(5)));
        let now = start();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        store.increment("shared", now);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.read("shared", now).unwrap().failures, 400);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(start());
        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), start() + Duration::seconds(90));
    }
}
