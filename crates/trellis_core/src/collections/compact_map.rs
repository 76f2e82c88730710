use super::{INLINE_MAX, LOAD_NUM, MIN_TABLE_CAPACITY, home_slot, probe_distance};
use core::fmt;

/// Companion of [`CompactSet`](super::CompactSet): the same two-level
/// representation with a plain-data value carried next to every 32-bit key.
///
/// Values are stored in a parallel array in both representations, so the
/// map stays as flat in memory as the set.
pub struct CompactMap<V> {
    repr: Repr<V>,
}

enum Repr<V> {
    /// Exact-fit parallel arrays in insertion order
    Inline {
        keys: Box<[u32]>,
        values: Box<[V]>,
    },
    Table(Table<V>),
}

/// Power-of-two open-addressing table. Slot key 0 marks an empty slot; the
/// key 0 itself lives out-of-band in `zero` together with its value.
struct Table<V> {
    slots: Box<[u32]>,
    values: Box<[V]>,
    /// Number of non-zero keys stored in `slots`
    len: usize,
    zero: Option<V>,
}

impl<V: Copy + Default> CompactMap<V> {
    pub fn new() -> Self {
        Self {
            repr: Repr::Inline {
                keys: Box::new([]),
                values: Box::new([]),
            },
        }
    }

    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Inline { keys, .. } => keys.len(),
            Repr::Table(table) => table.len + table.zero.is_some() as usize,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: u32) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: u32) -> Option<V> {
        match &self.repr {
            Repr::Inline { keys, values } => {
                let at = keys.iter().position(|&k| k == key)?;
                Some(values[at])
            }
            Repr::Table(table) => table.get(key).copied(),
        }
    }

    pub fn get_mut(&mut self, key: u32) -> Option<&mut V> {
        match &mut self.repr {
            Repr::Inline { keys, values } => {
                let at = keys.iter().position(|&k| k == key)?;
                Some(&mut values[at])
            }
            Repr::Table(table) => table.get_mut(key),
        }
    }

    /// Maps `key` to `value`, returning the previous value if there was one
    pub fn insert(&mut self, key: u32, value: V) -> Option<V> {
        match &mut self.repr {
            Repr::Inline { keys, values } => {
                if let Some(at) = keys.iter().position(|&k| k == key) {
                    return Some(core::mem::replace(&mut values[at], value));
                }
                if keys.len() < INLINE_MAX {
                    let mut grown_keys = Vec::with_capacity(keys.len() + 1);
                    let mut grown_values = Vec::with_capacity(keys.len() + 1);
                    grown_keys.extend_from_slice(keys);
                    grown_values.extend_from_slice(values);
                    grown_keys.push(key);
                    grown_values.push(value);
                    *keys = grown_keys.into_boxed_slice();
                    *values = grown_values.into_boxed_slice();
                } else {
                    log::trace!("compact map promoted to table at {} keys", keys.len() + 1);
                    let mut table = Table::with_capacity(MIN_TABLE_CAPACITY);
                    for (&k, &v) in keys.iter().zip(values.iter()) {
                        table.insert_absent(k, v);
                    }
                    table.insert_absent(key, value);
                    self.repr = Repr::Table(table);
                }
                None
            }
            Repr::Table(table) => table.insert(key, value),
        }
    }

    /// Unmaps `key`, returning its value if there was one
    pub fn remove(&mut self, key: u32) -> Option<V> {
        match &mut self.repr {
            Repr::Inline { keys, values } => {
                let at = keys.iter().position(|&k| k == key)?;
                let removed = values[at];
                *keys = keys
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| i != at)
                    .map(|(_, &k)| k)
                    .collect();
                *values = values
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| i != at)
                    .map(|(_, &v)| v)
                    .collect();
                Some(removed)
            }
            Repr::Table(table) => table.remove(key),
        }
    }

    /// Advances `pos` past one entry and returns it, or `None` at the end.
    ///
    /// Same cursor contract as [`CompactSet::cursor_next`](super::CompactSet::cursor_next):
    /// O(1) state, only meaningful while the map is not mutated.
    pub fn cursor_next(&self, pos: &mut usize) -> Option<(u32, V)> {
        match &self.repr {
            Repr::Inline { keys, values } => {
                let entry = (*keys.get(*pos)?, values[*pos]);
                *pos += 1;
                Some(entry)
            }
            Repr::Table(table) => {
                if *pos == 0 {
                    *pos = 1;
                    if let Some(value) = table.zero {
                        return Some((0, value));
                    }
                }
                while let Some(&key) = table.slots.get(*pos - 1) {
                    let slot = *pos - 1;
                    *pos += 1;
                    if key != 0 {
                        return Some((key, table.values[slot]));
                    }
                }
                None
            }
        }
    }

    pub fn iter(&self) -> Iter<'_, V> {
        Iter { map: self, pos: 0 }
    }
}

impl<V: Copy + Default> Default for CompactMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Copy + Default + fmt::Debug> fmt::Debug for CompactMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

pub struct Iter<'a, V> {
    map: &'a CompactMap<V>,
    pos: usize,
}

impl<V: Copy + Default> Iterator for Iter<'_, V> {
    type Item = (u32, V);

    fn next(&mut self) -> Option<(u32, V)> {
        self.map.cursor_next(&mut self.pos)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.map.len()))
    }
}

impl<V: Copy + Default> Table<V> {
    fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        Self {
            slots: vec![0; capacity].into_boxed_slice(),
            values: vec![V::default(); capacity].into_boxed_slice(),
            len: 0,
            zero: None,
        }
    }

    #[inline]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    /// Slot of `key`, or `None` if it is absent
    fn find(&self, key: u32) -> Option<usize> {
        let mask = self.mask();
        let mut slot = home_slot(key, mask);
        let mut dist = 0;
        loop {
            let held = self.slots[slot];
            if held == key {
                return Some(slot);
            }
            if held == 0 || probe_distance(held, slot, mask) < dist {
                return None;
            }
            slot = (slot + 1) & mask;
            dist += 1;
        }
    }

    fn get(&self, key: u32) -> Option<&V> {
        if key == 0 {
            return self.zero.as_ref();
        }
        self.find(key).map(|slot| &self.values[slot])
    }

    fn get_mut(&mut self, key: u32) -> Option<&mut V> {
        if key == 0 {
            return self.zero.as_mut();
        }
        self.find(key).map(|slot| &mut self.values[slot])
    }

    fn insert(&mut self, key: u32, value: V) -> Option<V> {
        if key == 0 {
            return self.zero.replace(value);
        }
        if let Some(slot) = self.find(key) {
            return Some(core::mem::replace(&mut self.values[slot], value));
        }
        if (self.len + 1) * 4 > self.slots.len() * LOAD_NUM {
            self.grow();
        }
        self.insert_absent(key, value);
        None
    }

    /// Robin-Hood displacement insert of a key known to be absent
    fn insert_absent(&mut self, mut key: u32, mut value: V) {
        if key == 0 {
            self.zero = Some(value);
            return;
        }
        let mask = self.mask();
        let mut slot = home_slot(key, mask);
        let mut dist = 0;
        loop {
            let held = self.slots[slot];
            if held == 0 {
                self.slots[slot] = key;
                self.values[slot] = value;
                self.len += 1;
                return;
            }
            let held_dist = probe_distance(held, slot, mask);
            if held_dist < dist {
                self.slots[slot] = key;
                key = held;
                core::mem::swap(&mut self.values[slot], &mut value);
                dist = held_dist;
            }
            slot = (slot + 1) & mask;
            dist += 1;
        }
    }

    fn remove(&mut self, key: u32) -> Option<V> {
        if key == 0 {
            return self.zero.take();
        }
        let slot = self.find(key)?;
        let removed = self.values[slot];
        self.backward_shift(slot);
        self.len -= 1;
        Some(removed)
    }

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
            self.values[slot] = self.values[next];
            slot = next;
        }
    }

    fn grow(&mut self) {
        let mut grown = Table::with_capacity(self.slots.len() * 2);
        grown.zero = self.zero;
        for (slot, &key) in self.slots.iter().enumerate() {
            if key != 0 {
                grown.insert_absent(key, self.values[slot]);
            }
        }
        *self = grown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_replace_and_remove() {
        let mut map = CompactMap::new();
        assert_eq!(map.insert(3, 30u32), None);
        assert_eq!(map.insert(0, 100), None);
        assert_eq!(map.insert(3, 31), Some(30));
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(0), Some(100));
        assert_eq!(map.remove(3), Some(31));
        assert_eq!(map.remove(3), None);
    }

    #[test]
    fn values_follow_keys_through_promotion() {
        let mut map = CompactMap::new();
        for key in 0..120u32 {
            map.insert(key, key * 10);
        }
        assert_eq!(map.len(), 120);
        for key in 0..120u32 {
            assert_eq!(map.get(key), Some(key * 10), "key {key}");
        }
    }

    #[test]
    fn values_follow_keys_through_backward_shift() {
        let mut map = CompactMap::new();
        for key in 1..=150u32 {
            map.insert(key, key + 1000);
        }
        for key in (1..=150u32).step_by(3) {
            assert_eq!(map.remove(key), Some(key + 1000));
        }
        for key in 1..=150u32 {
            let expected = (key % 3 != 1).then_some(key + 1000);
            assert_eq!(map.get(key), expected, "key {key}");
        }
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut map = CompactMap::new();
        map.insert(5, 1u32);
        map.insert(0, 2);
        *map.get_mut(5).unwrap() += 10;
        *map.get_mut(0).unwrap() += 10;
        assert_eq!(map.get(5), Some(11));
        assert_eq!(map.get(0), Some(12));
        assert!(map.get_mut(6).is_none());
    }

    #[test]
    fn cursor_visits_every_entry_once() {
        let mut map = CompactMap::new();
        for key in 0..70u32 {
            map.insert(key * 5, key);
        }
        let mut seen = Vec::new();
        let mut pos = 0;
        while let Some(entry) = map.cursor_next(&mut pos) {
            seen.push(entry);
        }
        seen.sort_unstable();
        let expected: Vec<(u32, u32)> = (0..70).map(|k| (k * 5, k)).collect();
        assert_eq!(seen, expected);
    }
}
