//! Per-control bank slots

use tracing::{debug, warn};

/// Most banks a single control can hold
pub const MAX_BANKS: usize = 1024;

/// Committed values for one control, one slot per bank
///
/// Grows on demand up to [`MAX_BANKS`] and never shrinks. The active bank
/// always indexes an existing slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankStore {
    slots: Vec<u16>,
    active: usize,
}

impl BankStore {
    /// Create a store with `count` zeroed slots (at least one, at most [`MAX_BANKS`])
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![0; count.clamp(1, MAX_BANKS)],
            active: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn active(&self) -> usize {
        self.active
    }

    /// Make `bank` active, growing the store if it does not exist yet
    ///
    /// Banks past [`MAX_BANKS`] select the last one.
    pub fn select(&mut self, bank: usize) {
        let bank = if bank >= MAX_BANKS {
            warn!("Bank {} out of range, using {}", bank, MAX_BANKS - 1);
            MAX_BANKS - 1
        } else {
            bank
        };
        self.ensure_len(bank + 1);
        self.active = bank;
    }

    /// Grow to at least `count` slots (capped at [`MAX_BANKS`]), keeping existing values
    pub fn ensure_len(&mut self, count: usize) {
        let count = count.min(MAX_BANKS);
        if count > self.slots.len() {
            debug!("Growing bank store from {} to {} slots", self.slots.len(), count);
            self.slots.resize(count, 0);
        }
    }

    /// Value of the active bank
    pub fn value(&self) -> u16 {
        self.slots[self.active]
    }

    /// Value of any bank; banks never written read as 0
    pub fn value_at(&self, bank: usize) -> u16 {
        self.slots.get(bank).copied().unwrap_or(0)
    }

    pub fn set_value(&mut self, value: u16) {
        self.slots[self.active] = value;
    }

    /// Write any bank, growing the store if needed; writes past [`MAX_BANKS`] are dropped
    pub fn set_value_at(&mut self, bank: usize, value: u16) {
        if bank >= MAX_BANKS {
            warn!("Ignoring write to bank {} (max {})", bank, MAX_BANKS - 1);
            return;
        }
        self.ensure_len(bank + 1);
        self.slots[bank] = value;
    }

    /// Zero every slot without changing the count
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = 0);
    }

    pub fn values(&self) -> &[u16] {
        &self.slots
    }
}

impl Default for BankStore {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_has_zeroed_slots() {
        let store = BankStore::new(4);
        assert_eq!(store.values(), &[0, 0, 0, 0]);
        assert_eq!(store.active(), 0);

        // Zero count still gives a usable slot
        assert_eq!(BankStore::new(0).len(), 1);
    }

    #[test]
    fn test_read_unallocated_bank_is_zero() {
        let store = BankStore::new(2);
        assert_eq!(store.value_at(10), 0);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_write_grows_and_preserves() {
        let mut store = BankStore::new(2);
        store.set_value_at(1, 300);
        store.set_value_at(5, 700);

        assert_eq!(store.len(), 6);
        assert_eq!(store.values(), &[0, 300, 0, 0, 0, 700]);
    }

    #[test]
    fn test_select_grows_and_switches() {
        let mut store = BankStore::new(2);
        store.set_value(42);
        store.select(3);

        assert_eq!(store.active(), 3);
        assert_eq!(store.len(), 4);
        assert_eq!(store.value(), 0);
        assert_eq!(store.value_at(0), 42);
    }

    #[test]
    fn test_clear_keeps_len() {
        let mut store = BankStore::new(3);
        store.set_value_at(2, 9);
        store.clear();
        assert_eq!(store.values(), &[0, 0, 0]);
    }

    #[test]
    fn test_huge_bank_index_is_capped() {
        let mut store = BankStore::new(2);
        store.select(usize::MAX);
        assert_eq!(store.active(), MAX_BANKS - 1);
        assert_eq!(store.len(), MAX_BANKS);

        store.set_value_at(usize::MAX, 5);
        assert_eq!(store.len(), MAX_BANKS);
        assert_eq!(store.value_at(usize::MAX), 0);

        store.ensure_len(usize::MAX);
        assert_eq!(store.len(), MAX_BANKS);
        assert_eq!(BankStore::new(usize::MAX).len(), MAX_BANKS);
    }

    proptest! {
        #[test]
        fn prop_growth_never_loses_values(
            writes in proptest::collection::vec((0usize..64, 0u16..1024), 1..40),
            select in 0usize..128,
        ) {
            let mut store = BankStore::new(4);
            let mut expected = std::collections::HashMap::new();
            for (bank, value) in writes {
                store.set_value_at(bank, value);
                expected.insert(bank, value);
            }
            let len_before = store.len();

            store.select(select);
            prop_assert!(store.active() < store.len());
            prop_assert!(store.len() >= len_before);
            for (bank, value) in expected {
                prop_assert_eq!(store.value_at(bank), value);
            }
        }
    }
}
