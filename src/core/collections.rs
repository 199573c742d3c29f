//! Collection types tuned for the mesh algorithms.
//!
//! Hash maps and sets here use `rustc_hash::FxHasher`: the keys are internal
//! integer ids, never attacker-controlled, and the non-cryptographic hash is
//! markedly faster for them than the standard library default.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Fast `HashMap` for internal id-keyed mappings.
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Fast `HashSet` for internal id sets.
pub type FastHashSet<T> = FxHashSet<T>;

/// Small inline buffer: spills to the heap only past `N` elements.
///
/// Used for vertex fans and short work lists whose typical length is known.
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// Creates a [`FastHashMap`] with at least the given capacity.
#[must_use]
pub fn fast_hash_map_with_capacity<K, V>(capacity: usize) -> FastHashMap<K, V> {
    FastHashMap::with_capacity_and_hasher(capacity, rustc_hash::FxBuildHasher)
}

/// Creates a [`FastHashSet`] with at least the given capacity.
#[must_use]
pub fn fast_hash_set_with_capacity<T>(capacity: usize) -> FastHashSet<T> {
    FastHashSet::with_capacity_and_hasher(capacity, rustc_hash::FxBuildHasher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_are_usable() {
        let mut map: FastHashMap<u64, usize> = FastHashMap::default();
        map.insert(3, 4);
        assert_eq!(map.get(&3), Some(&4));

        let mut set: FastHashSet<u64> = FastHashSet::default();
        set.insert(11);
        assert!(set.contains(&11));

        let mut buffer: SmallBuffer<i32, 8> = SmallBuffer::new();
        buffer.push(1);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn capacity_helpers() {
        let map = fast_hash_map_with_capacity::<u64, usize>(100);
        assert!(map.capacity() >= 100);
        let set = fast_hash_set_with_capacity::<u64>(50);
        assert!(set.capacity() >= 50);
    }
}
