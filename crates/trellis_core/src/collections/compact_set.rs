use super::{INLINE_MAX, LOAD_NUM, MIN_TABLE_CAPACITY, home_slot, probe_distance};
use core::fmt;

/// A set of 32-bit keys tuned for the occupancy profile of per-vertex
/// adjacency data: almost always a handful of entries, occasionally huge.
///
/// Small sets are an exact-fit array scanned linearly; past [`INLINE_MAX`]
/// entries the set promotes to a Robin-Hood open-addressing table with
/// backward-shift deletion. Promotion is one-way, the set never shrinks
/// back to the inline form.
pub struct CompactSet {
    repr: Repr,
}

enum Repr {
    /// Exact-fit array in insertion order, length equals occupancy
    Inline(Box<[u32]>),
    Table(Table),
}

/// Power-of-two open-addressing table. Slot value 0 marks an empty slot;
/// the key 0 itself is held out-of-band in `zero`.
struct Table {
    slots: Box<[u32]>,
    /// Number of non-zero keys stored in `slots`
    len: usize,
    zero: bool,
}

impl CompactSet {
    pub fn new() -> Self {
        Self {
            repr: Repr::Inline(Box::new([])),
        }
    }

    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Inline(keys) => keys.len(),
            Repr::Table(table) => table.len + table.zero as usize,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: u32) -> bool {
        match &self.repr {
            Repr::Inline(keys) => keys.contains(&key),
            Repr::Table(table) => table.contains(key),
        }
    }

    /// Adds `key`, returning `false` if it was already present
    pub fn insert(&mut self, key: u32) -> bool {
        match &mut self.repr {
            Repr::Inline(keys) => {
                if keys.contains(&key) {
                    return false;
                }
                if keys.len() < INLINE_MAX {
                    let mut grown = Vec::with_capacity(keys.len() + 1);
                    grown.extend_from_slice(keys);
                    grown.push(key);
                    *keys = grown.into_boxed_slice();
                } else {
                    log::trace!("compact set promoted to table at {} keys", keys.len() + 1);
                    let mut table = Table::with_capacity(MIN_TABLE_CAPACITY);
                    for &k in keys.iter() {
                        table.insert_absent(k);
                    }
                    table.insert_absent(key);
                    self.repr = Repr::Table(table);
                }
                true
            }
            Repr::Table(table) => table.insert(key),
        }
    }

    /// Removes `key`, returning `false` if it was not present
    pub fn remove(&mut self, key: u32) -> bool {
        match &mut self.repr {
            Repr::Inline(keys) => {
                if !keys.contains(&key) {
                    return false;
                }
                *keys = keys.iter().copied().filter(|&k| k != key).collect();
                true
            }
            Repr::Table(table) => table.remove(key),
        }
    }

    /// Advances `pos` past one entry and returns it, or `None` at the end.
    ///
    /// Positions index representation storage directly, so a cursor stays
    /// O(1) in size and needs no borrow of the set between steps. Cursors
    /// are only meaningful while the set is not mutated.
    pub fn cursor_next(&self, pos: &mut usize) -> Option<u32> {
        match &self.repr {
            Repr::Inline(keys) => {
                let key = *keys.get(*pos)?;
                *pos += 1;
                Some(key)
            }
            Repr::Table(table) => {
                if *pos == 0 {
                    *pos = 1;
                    if table.zero {
                        return Some(0);
                    }
                }
                while let Some(&key) = table.slots.get(*pos - 1) {
                    *pos += 1;
                    if key != 0 {
                        return Some(key);
                    }
                }
                None
            }
        }
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter { set: self, pos: 0 }
    }
}

impl Default for CompactSet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CompactSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

pub struct Iter<'a> {
    set: &'a CompactSet,
    pos: usize,
}

impl Iterator for Iter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        self.set.cursor_next(&mut self.pos)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.set.len()))
    }
}

impl<'a> IntoIterator for &'a CompactSet {
    type Item = u32;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl Table {
    fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        Self {
            slots: vec![0; capacity].into_boxed_slice(),
            len: 0,
            zero: false,
        }
    }

    #[inline]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    fn contains(&self, key: u32) -> bool {
        if key == 0 {
            return self.zero;
        }
        let mask = self.mask();
        let mut slot = home_slot(key, mask);
        let mut dist = 0;
        loop {
            let held = self.slots[slot];
            if held == key {
                return true;
            }
            // An empty slot, or a richer resident, proves the key is absent
            if held == 0 || probe_distance(held, slot, mask) < dist {
                return false;
            }
            slot = (slot + 1) & mask;
            dist += 1;
        }
    }

    fn insert(&mut self, key: u32) -> bool {
        if key == 0 {
            let inserted = !self.zero;
            self.zero = true;
            return inserted;
        }
        if self.contains(key) {
            return false;
        }
        if (self.len + 1) * 4 > self.slots.len() * LOAD_NUM {
            self.grow();
        }
        self.insert_absent(key);
        true
    }

    /// Robin-Hood displacement insert of a key known to be absent
    fn insert_absent(&mut self, mut key: u32) {
        if key == 0 {
            self.zero = true;
            return;
        }
        let mask = self.mask();
        let mut slot = home_slot(key, mask);
        let mut dist = 0;
        loop {
            let held = self.slots[slot];
            if held == 0 {
                self.slots[slot] = key;
                self.len += 1;
                return;
            }
            let held_dist = probe_distance(held, slot, mask);
            if held_dist < dist {
                // Rich resident yields its slot to the poorer probe
                self.slots[slot] = key;
                key = held;
                dist = held_dist;
            }
            slot = (slot + 1) & mask;
            dist += 1;
        }
    }

    fn remove(&mut self, key: u32) -> bool {
        if key == 0 {
            let removed = self.zero;
            self.zero = false;
            return removed;
        }
        let mask = self.mask();
        let mut slot = home_slot(key, mask);
        let mut dist = 0;
        loop {
            let held = self.slots[slot];
            if held == key {
                break;
            }
            if held == 0 || probe_distance(held, slot, mask) < dist {
                return false;
            }
            slot = (slot + 1) & mask;
            dist += 1;
        }
        self.backward_shift(slot);
        self.len -= 1;
        true
    }

    /// Shifts the probe chain after `slot` back by one to fill the hole,
    /// stopping at an empty slot or a key already sitting at home
    fn backward_shift(&mut self, mut slot: usize) {
        let mask = self.mask();
        loop {
            let next = (slot + 1) & mask;
            let held = self.slots[next];
            if held == 0 || probe_distance(held, next, mask) == 0 {
                self.slots[slot] = 0;
                return;
            }
            self.slots[slot] = held;
            slot = next;
        }
    }

    fn grow(&mut self) {
        let mut grown = Table::with_capacity(self.slots.len() * 2);
        grown.zero = self.zero;
        for &key in self.slots.iter().filter(|&&key| key != 0) {
            grown.insert_absent(key);
        }
        *self = grown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_insert_and_remove() {
        let mut set = CompactSet::new();
        assert!(set.insert(7));
        assert!(set.insert(0));
        assert!(!set.insert(7));
        assert_eq!(set.len(), 2);
        assert!(set.contains(0));
        assert!(set.remove(7));
        assert!(!set.remove(7));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn promotes_past_inline_bound() {
        let mut set = CompactSet::new();
        for key in 0..100u32 {
            assert!(set.insert(key * 3));
        }
        assert_eq!(set.len(), 100);
        for key in 0..100u32 {
            assert!(set.contains(key * 3));
            assert!(!set.contains(key * 3 + 1));
        }
    }

    #[test]
    fn backward_shift_keeps_chains_reachable() {
        let mut set = CompactSet::new();
        for key in 1..=200u32 {
            set.insert(key);
        }
        for key in (1..=200u32).step_by(2) {
            assert!(set.remove(key));
        }
        for key in 1..=200u32 {
            assert_eq!(set.contains(key), key % 2 == 0, "key {key}");
        }
        assert_eq!(set.len(), 100);
    }

    #[test]
    fn zero_key_survives_promotion() {
        let mut set = CompactSet::new();
        set.insert(0);
        for key in 1..=64u32 {
            set.insert(key);
        }
        assert!(set.contains(0));
        assert!(set.remove(0));
        assert!(!set.contains(0));
        assert_eq!(set.len(), 64);
    }

    #[test]
    fn cursor_visits_every_key_once() {
        let mut set = CompactSet::new();
        for key in 0..50u32 {
            set.insert(key * 7);
        }
        let mut seen = Vec::new();
        let mut pos = 0;
        while let Some(key) = set.cursor_next(&mut pos) {
            seen.push(key);
        }
        seen.sort_unstable();
        let expected: Vec<u32> = (0..50).map(|k| k * 7).collect();
        assert_eq!(seen, expected);
    }
}
