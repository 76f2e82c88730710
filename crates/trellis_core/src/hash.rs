//! Provides replacements for `std::hash` items using [`foldhash`]

use core::hash::BuildHasher;
pub use foldhash::fast::{FixedState, FoldHasher as DefaultHasher};

const FIXED_HASHER: FixedState =
    FixedState::with_seed(0b0101000101111100110000011011011100100111001000100000101010010101);

/// Deterministic hasher based upon a random but fixed state
///
/// Container iteration order stays stable between mutations, at the cost of
/// the denial-of-service resistance an in-process store has no use for.
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHasher;

impl BuildHasher for FixedHasher {
    type Hasher = DefaultHasher<'static>;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        FIXED_HASHER.build_hasher()
    }
}
