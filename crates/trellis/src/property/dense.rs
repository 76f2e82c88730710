use core::any::TypeId;
use core::mem::{self, ManuallyDrop};
use fixedbitset::FixedBitSet;

/// Dense slot storage for one property, indexed by the element's integer
/// identity.
///
/// The representation is picked once at construction by element type: bools
/// pack into a bitset, the four fixed-width numerics share one backbone per
/// word width through an encode/decode codec pair, everything else lives in
/// option slots. After that single match the access paths are monomorphic.
///
/// A slot is either initialized or empty; empty slots report `None` so the
/// owner can run its lazy initializer.
pub(crate) enum DenseStore<T: 'static> {
    Bits {
        values: FixedBitSet,
        init: FixedBitSet,
        len: usize,
    },
    Word32 {
        words: Vec<u32>,
        init: FixedBitSet,
    },
    Word64 {
        words: Vec<u64>,
        init: FixedBitSet,
    },
    Boxed {
        slots: Vec<Option<T>>,
    },
}

impl<T: 'static> DenseStore<T> {
    pub fn new() -> Self {
        let ty = TypeId::of::<T>();
        if ty == TypeId::of::<bool>() {
            Self::Bits {
                values: FixedBitSet::new(),
                init: FixedBitSet::new(),
                len: 0,
            }
        } else if ty == TypeId::of::<i32>() || ty == TypeId::of::<f32>() {
            Self::Word32 {
                words: Vec::new(),
                init: FixedBitSet::new(),
            }
        } else if ty == TypeId::of::<i64>() || ty == TypeId::of::<f64>() {
            Self::Word64 {
                words: Vec::new(),
                init: FixedBitSet::new(),
            }
        } else {
            Self::Boxed { slots: Vec::new() }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Bits { len, .. } => *len,
            Self::Word32 { words, .. } => words.len(),
            Self::Word64 { words, .. } => words.len(),
            Self::Boxed { slots } => slots.len(),
        }
    }

    /// Extends the store with empty slots up to `n` elements
    pub fn ensure_len(&mut self, n: usize) {
        if n <= self.len() {
            return;
        }
        match self {
            Self::Bits { values, init, len } => {
                values.grow(n);
                init.grow(n);
                *len = n;
            }
            Self::Word32 { words, init } => {
                words.resize(n, 0);
                init.grow(n);
            }
            Self::Word64 { words, init } => {
                words.resize(n, 0);
                init.grow(n);
            }
            Self::Boxed { slots } => slots.resize_with(n, || None),
        }
    }

    pub fn reserve(&mut self, additional: usize) {
        match self {
            // FixedBitSet only grows to a length, not to a capacity
            Self::Bits { .. } => {}
            Self::Word32 { words, .. } => words.reserve(additional),
            Self::Word64 { words, .. } => words.reserve(additional),
            Self::Boxed { slots } => slots.reserve(additional),
        }
    }

    pub fn is_initialized(&self, at: usize) -> bool {
        if at >= self.len() {
            return false;
        }
        match self {
            Self::Bits { init, .. } => init.contains(at),
            Self::Word32 { init, .. } => init.contains(at),
            Self::Word64 { init, .. } => init.contains(at),
            Self::Boxed { slots } => slots[at].is_some(),
        }
    }

    /// The value at `at`, or `None` while the slot is empty
    pub fn get(&self, at: usize) -> Option<T>
    where
        T: Clone,
    {
        if !self.is_initialized(at) {
            return None;
        }
        Some(match self {
            Self::Bits { values, .. } => decode_bit(values.contains(at)),
            Self::Word32 { words, .. } => decode32(words[at]),
            Self::Word64 { words, .. } => decode64(words[at]),
            Self::Boxed { slots } => slots[at].clone()?,
        })
    }

    /// Calls `f` on the value at `at` without requiring `T: Clone`
    pub fn with_value<R>(&self, at: usize, f: impl FnOnce(&T) -> R) -> Option<R> {
        if !self.is_initialized(at) {
            return None;
        }
        match self {
            Self::Bits { values, .. } => {
                let value: T = decode_bit(values.contains(at));
                Some(f(&value))
            }
            Self::Word32 { words, .. } => {
                let value: T = decode32(words[at]);
                Some(f(&value))
            }
            Self::Word64 { words, .. } => {
                let value: T = decode64(words[at]);
                Some(f(&value))
            }
            Self::Boxed { slots } => slots[at].as_ref().map(f),
        }
    }

    /// Writes the value at `at`; the caller has grown the store past `at`
    pub fn set(&mut self, at: usize, value: T) {
        debug_assert!(at < self.len());
        match self {
            Self::Bits { values, init, .. } => {
                values.set(at, encode_bit(value));
                init.insert(at);
            }
            Self::Word32 { words, init } => {
                words[at] = encode32(value);
                init.insert(at);
            }
            Self::Word64 { words, init } => {
                words[at] = encode64(value);
                init.insert(at);
            }
            Self::Boxed { slots } => slots[at] = Some(value),
        }
    }

    /// The swap-and-pop rehoming hook.
    ///
    /// `last` is the element that now answers to identity `removed`; its
    /// slot contents move there and the tail slot is dropped. Slots past the
    /// stored length stand for elements that were never touched, so the
    /// cases degrade gracefully:
    ///
    /// * both beyond the stored length — nothing to do;
    /// * only `removed` stored — the reused slot must read as empty again;
    /// * both stored — move, then truncate.
    pub fn swap_remove(&mut self, removed: usize, last: usize) {
        debug_assert!(removed <= last);
        let len = self.len();
        if last < len {
            match self {
                Self::Bits { values, init, len } => {
                    if removed != last {
                        let bit = values.contains(last);
                        values.set(removed, bit);
                        let known = init.contains(last);
                        init.set(removed, known);
                    }
                    // Clear the dropped tail so a later regrow reads empty
                    values.set(last, false);
                    init.set(last, false);
                    *len = last;
                }
                Self::Word32 { words, init } => {
                    words.swap_remove(removed);
                    if removed != last {
                        let known = init.contains(last);
                        init.set(removed, known);
                    }
                    init.set(last, false);
                }
                Self::Word64 { words, init } => {
                    words.swap_remove(removed);
                    if removed != last {
                        let known = init.contains(last);
                        init.set(removed, known);
                    }
                    init.set(last, false);
                }
                Self::Boxed { slots } => {
                    slots.swap_remove(removed);
                }
            }
        } else if removed < len {
            self.clear_slot(removed);
        }
    }

    /// Marks the slot empty again
    fn clear_slot(&mut self, at: usize) {
        match self {
            Self::Bits { values, init, .. } => {
                values.set(at, false);
                init.set(at, false);
            }
            Self::Word32 { init, .. } => init.set(at, false),
            Self::Word64 { init, .. } => init.set(at, false),
            Self::Boxed { slots } => slots[at] = None,
        }
    }
}

/// Reinterprets a value as another type. The stores compare `TypeId`s
/// before dispatching here, making the transmute an identity.
///
/// # Safety
///
/// `Src` and `Dst` must be the same type.
#[inline]
unsafe fn same_type_cast<Src: 'static, Dst: 'static>(value: Src) -> Dst {
    debug_assert_eq!(TypeId::of::<Src>(), TypeId::of::<Dst>());
    let value = ManuallyDrop::new(value);
    // SAFETY: `Src` and `Dst` are the same type per the caller contract
    unsafe { mem::transmute_copy(&value) }
}

#[inline]
fn encode_bit<T: 'static>(value: T) -> bool {
    // SAFETY: the `Bits` arm is only constructed for `T = bool`
    unsafe { same_type_cast::<T, bool>(value) }
}

#[inline]
fn decode_bit<T: 'static>(bit: bool) -> T {
    // SAFETY: the `Bits` arm is only constructed for `T = bool`
    unsafe { same_type_cast::<bool, T>(bit) }
}

#[inline]
fn encode32<T: 'static>(value: T) -> u32 {
    if TypeId::of::<T>() == TypeId::of::<f32>() {
        // SAFETY: just checked `T = f32`
        unsafe { same_type_cast::<T, f32>(value) }.to_bits()
    } else {
        // SAFETY: the `Word32` arm is only constructed for `i32` and `f32`
        unsafe { same_type_cast::<T, i32>(value) as u32 }
    }
}

#[inline]
fn decode32<T: 'static>(word: u32) -> T {
    if TypeId::of::<T>() == TypeId::of::<f32>() {
        // SAFETY: just checked `T = f32`
        unsafe { same_type_cast::<f32, T>(f32::from_bits(word)) }
    } else {
        // SAFETY: the `Word32` arm is only constructed for `i32` and `f32`
        unsafe { same_type_cast::<i32, T>(word as i32) }
    }
}

#[inline]
fn encode64<T: 'static>(value: T) -> u64 {
    if TypeId::of::<T>() == TypeId::of::<f64>() {
        // SAFETY: just checked `T = f64`
        unsafe { same_type_cast::<T, f64>(value) }.to_bits()
    } else {
        // SAFETY: the `Word64` arm is only constructed for `i64` and `f64`
        unsafe { same_type_cast::<T, i64>(value) as u64 }
    }
}

#[inline]
fn decode64<T: 'static>(word: u64) -> T {
    if TypeId::of::<T>() == TypeId::of::<f64>() {
        // SAFETY: just checked `T = f64`
        unsafe { same_type_cast::<f64, T>(f64::from_bits(word)) }
    } else {
        // SAFETY: the `Word64` arm is only constructed for `i64` and `f64`
        unsafe { same_type_cast::<i64, T>(word as i64) }
    }
}
