//! Persistent image sequence counter.
//!
//! The counter is the one piece of state that must survive power loss: image
//! file names derive from it, and two images may never share a sequence
//! number. [`PersistentCounter`] owns all access to the backing store; the
//! control loop only ever asks for "next value" and never touches the store
//! directly.

use crate::hal::CounterStore;

/// Logical address of the sequence counter within the non-volatile store.
pub const COUNTER_ADDR: u8 = 0;

/// Wrapper enforcing the monotonic-counter invariant over a [`CounterStore`].
#[derive(Debug)]
pub struct PersistentCounter<S> {
    store: S,
}

impl<S: CounterStore> PersistentCounter<S> {
    /// Takes exclusive ownership of the backing store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the last committed value, or 0 if none was ever committed.
    pub fn load(&mut self) -> u16 {
        self.store.read_u16(COUNTER_ADDR)
    }

    /// Advances the counter past `current`, commits it durably, and returns
    /// the new value.
    ///
    /// The write and commit happen before the caller uses the value, so a
    /// power loss before the commit leaves the prior value intact and a power
    /// loss after it is indistinguishable from a later read. Gaps in the
    /// sequence are acceptable; reuse is not.
    pub fn next_and_commit(&mut self, current: u16) -> u16 {
        let next = current.wrapping_add(1);
        self.store.write_u16(COUNTER_ADDR, next);
        self.store.commit();
        next
    }

    /// Maintenance reset, outside normal operation (console tooling only).
    pub fn reset_to_zero(&mut self) {
        self.store.write_u16(COUNTER_ADDR, 0);
        self.store.commit();
    }

    /// Releases resources held by the persistence layer.
    ///
    /// Called only on the sleep-entry path, never during capture.
    pub fn shutdown(&mut self) {
        self.store.release();
    }

    /// Consumes the wrapper and returns the store (power-cycle simulation).
    pub fn into_store(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        committed: u16,
        staged: Option<u16>,
        released: bool,
    }

    impl CounterStore for MemoryStore {
        fn read_u16(&mut self, _addr: u8) -> u16 {
            self.committed
        }

        fn write_u16(&mut self, _addr: u8, value: u16) {
            self.staged = Some(value);
        }

        fn commit(&mut self) {
            if let Some(value) = self.staged.take() {
                self.committed = value;
            }
        }

        fn release(&mut self) {
            self.released = true;
        }
    }

    #[test]
    fn fresh_store_loads_zero() {
        let mut counter = PersistentCounter::new(MemoryStore::default());
        assert_eq!(counter.load(), 0);
    }

    #[test]
    fn next_and_commit_is_durable() {
        let mut counter = PersistentCounter::new(MemoryStore::default());
        let value = counter.load();
        assert_eq!(counter.next_and_commit(value), 1);

        // Survives a simulated power cycle.
        let store = counter.into_store();
        let mut counter = PersistentCounter::new(store);
        assert_eq!(counter.load(), 1);
    }

    #[test]
    fn values_never_repeat_across_cycles() {
        let mut store = MemoryStore::default();
        let mut seen_max = 0;
        for _ in 0..3 {
            let mut counter = PersistentCounter::new(store);
            let mut value = counter.load();
            for _ in 0..4 {
                value = counter.next_and_commit(value);
                assert!(value > seen_max);
                seen_max = value;
            }
            store = counter.into_store();
        }
        assert_eq!(seen_max, 12);
    }

    #[test]
    fn shutdown_releases_store() {
        let mut counter = PersistentCounter::new(MemoryStore::default());
        counter.shutdown();
        assert!(counter.into_store().released);
    }

    #[test]
    fn maintenance_reset_rewinds_to_zero() {
        let mut counter = PersistentCounter::new(MemoryStore::default());
        let value = counter.next_and_commit(41);
        assert_eq!(value, 42);
        counter.reset_to_zero();
        assert_eq!(counter.load(), 0);
    }
}
