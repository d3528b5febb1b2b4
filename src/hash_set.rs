use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FusedIterator;

use crate::DefaultHashBuilder;
use crate::error::CuckooError;
use crate::error::TryInsertError;
use crate::hash_family::BuildHashFamily;
use crate::hash_family::MatrixFamilyBuilder;
use crate::table;
use crate::table::Table;

/// A hash set stored as the keys of a cuckoo [`Table`].
///
/// `HashSet<T, S, B, SLOTS>` stores values of type `T` where `T` implements
/// `Hash + Eq`. The hasher `S`, the hash family builder `B` and the bucket
/// width `SLOTS` mean the same as for [`Table`].
///
/// # Performance Characteristics
///
/// - **Lookup**: at most `tables × SLOTS` comparisons.
/// - **Memory**: 8 bytes of cached hash per slot, plus the size of `T`.
pub struct HashSet<
    T,
    S = DefaultHashBuilder,
    B = MatrixFamilyBuilder,
    const SLOTS: usize = 2,
> where
    B: BuildHashFamily,
{
    table: Table<T, (), S, B, SLOTS>,
}

impl<T, S, B, const SLOTS: usize> Clone for HashSet<T, S, B, SLOTS>
where
    T: Clone,
    S: Clone,
    B: BuildHashFamily + Clone,
    B::Family: Clone,
{
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<T, S, B, const SLOTS: usize> PartialEq for HashSet<T, S, B, SLOTS>
where
    T: Hash + Eq,
    S: BuildHasher,
    B: BuildHashFamily,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|v| other.contains(v))
    }
}

impl<T, S, B, const SLOTS: usize> Eq for HashSet<T, S, B, SLOTS>
where
    T: Hash + Eq,
    S: BuildHasher,
    B: BuildHashFamily,
{
}

impl<T, S, B, const SLOTS: usize> Debug for HashSet<T, S, B, SLOTS>
where
    T: Debug,
    B: BuildHashFamily,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S, B, const SLOTS: usize> HashSet<T, S, B, SLOTS>
where
    B: BuildHashFamily,
{
    /// Returns the number of elements in the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_table::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// assert_eq!(set.len(), 0);
    /// set.insert(1);
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of slots in the underlying table.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Clears the set, removing all values. The layout is kept.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Sets a ceiling on [`capacity`](Self::capacity).
    ///
    /// See [`Table::set_max_capacity`].
    pub fn set_max_capacity(&mut self, max_capacity: Option<usize>) {
        self.table.set_max_capacity(max_capacity);
    }

    /// An iterator visiting all elements in table order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_table::HashSet;
    ///
    /// let set: HashSet<i32> = [1, 2, 3].into_iter().collect();
    /// let mut values: Vec<_> = set.iter().copied().collect();
    /// values.sort();
    /// assert_eq!(values, [1, 2, 3]);
    /// ```
    pub fn iter(&self) -> Iter<'_, T, SLOTS> {
        Iter {
            inner: self.table.keys(),
        }
    }

    /// Clears the set, returning all elements as an iterator.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_table::HashSet;
    ///
    /// let mut set: HashSet<i32> = [1, 2].into_iter().collect();
    /// let mut drained: Vec<_> = set.drain().collect();
    /// drained.sort();
    /// assert_eq!(drained, [1, 2]);
    /// assert!(set.is_empty());
    /// ```
    pub fn drain(&mut self) -> Drain<'_, T, SLOTS> {
        Drain {
            inner: self.table.drain(),
        }
    }
}

impl<T, S, B, const SLOTS: usize> HashSet<T, S, B, SLOTS>
where
    T: Hash + Eq,
    S: BuildHasher,
    B: BuildHashFamily,
{
    /// Creates an empty set sized for about `requested` elements with
    /// `tables` subtables, using the given hashers.
    ///
    /// # Errors
    ///
    /// Returns [`CuckooError::TooFewTables`] if `tables < 2`.
    pub fn try_with_hashers(
        requested: usize,
        tables: usize,
        hash_builder: S,
        family_builder: B,
    ) -> Result<Self, CuckooError> {
        Ok(Self {
            table: Table::try_with_hashers(requested, tables, hash_builder, family_builder)?,
        })
    }

    /// Creates an empty set sized for about `requested` elements with
    /// `tables` subtables, using the given hashers.
    ///
    /// # Panics
    ///
    /// Panics if `tables < 2`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_table::DefaultHashBuilder;
    /// use cuckoo_table::HashSet;
    /// use cuckoo_table::MatrixFamilyBuilder;
    ///
    /// let set: HashSet<i32> = HashSet::with_hashers(
    ///     64,
    ///     3,
    ///     DefaultHashBuilder::default(),
    ///     MatrixFamilyBuilder::with_seed(7),
    /// );
    /// assert!(set.capacity() >= 64);
    /// ```
    pub fn with_hashers(
        requested: usize,
        tables: usize,
        hash_builder: S,
        family_builder: B,
    ) -> Self {
        Self {
            table: Table::with_hashers(requested, tables, hash_builder, family_builder),
        }
    }

    /// Makes room for at least `additional` more elements.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity exceeds the maximum capacity.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// Adds a value to the set.
    ///
    /// Returns whether the value was newly inserted. An equal value already in
    /// the set is kept and `value` is dropped.
    ///
    /// # Panics
    ///
    /// Panics if the table has to grow past its maximum capacity.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_table::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// assert_eq!(set.insert(37), true);
    /// assert_eq!(set.insert(37), false);
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn insert(&mut self, value: T) -> bool {
        self.table.insert(value, ()).is_none()
    }

    /// Adds a value to the set, reporting a failed grow instead of panicking.
    ///
    /// # Errors
    ///
    /// See [`Table::try_insert`]. The error's key is the homeless element.
    pub fn try_insert(&mut self, value: T) -> Result<bool, TryInsertError<T, ()>> {
        self.table.try_insert(value, ()).map(|previous| previous.is_none())
    }

    /// Returns `true` if the set contains a value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_table::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// assert!(set.contains(&1));
    /// assert!(!set.contains(&2));
    /// ```
    pub fn contains(&self, value: &T) -> bool {
        self.table.contains_key(value)
    }

    /// Returns a reference to the stored value equal to `value`, if any.
    pub fn get(&self, value: &T) -> Option<&T> {
        self.table.get_key_value(value).map(|(k, _)| k)
    }

    /// Removes a value from the set. Returns whether the value was
    /// present in the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_table::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// assert_eq!(set.remove(&1), true);
    /// assert_eq!(set.remove(&1), false);
    /// ```
    pub fn remove(&mut self, value: &T) -> bool {
        self.table.remove(value).is_some()
    }

    /// Removes and returns the value in the set, if any, that is equal to the
    /// given one.
    pub fn take(&mut self, value: &T) -> Option<T> {
        self.table.remove_entry(value).map(|(k, _)| k)
    }

    /// Returns `true` if `self` has no elements in common with `other`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_table::HashSet;
    ///
    /// let a: HashSet<i32> = [1, 2].into_iter().collect();
    /// let b: HashSet<i32> = [3, 4].into_iter().collect();
    /// assert!(a.is_disjoint(&b));
    /// ```
    pub fn is_disjoint(&self, other: &Self) -> bool {
        if self.len() <= other.len() {
            self.iter().all(|v| !other.contains(v))
        } else {
            other.iter().all(|v| !self.contains(v))
        }
    }

    /// Returns `true` if `other` contains at least all the elements in `self`.
    pub fn is_subset(&self, other: &Self) -> bool {
        if self.len() > other.len() {
            return false;
        }
        self.iter().all(|v| other.contains(v))
    }

    /// Returns `true` if `self` contains at least all the elements in `other`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_table::HashSet;
    ///
    /// let a: HashSet<i32> = [1, 2, 3].into_iter().collect();
    /// let b: HashSet<i32> = [1, 2].into_iter().collect();
    /// assert!(a.is_superset(&b));
    /// assert!(!b.is_superset(&a));
    /// ```
    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }
}

impl<T, S, B, const SLOTS: usize> HashSet<T, S, B, SLOTS>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
    B: BuildHashFamily + Default,
{
    /// Creates an empty set with the default size and two subtables.
    pub fn new() -> Self {
        Self { table: Table::new() }
    }

    /// Creates an empty set sized for about `requested` elements.
    pub fn with_capacity(requested: usize) -> Self {
        Self {
            table: Table::with_capacity(requested),
        }
    }

    /// Creates an empty set sized for about `requested` elements with
    /// `tables` subtables.
    ///
    /// # Panics
    ///
    /// Panics if `tables < 2`.
    pub fn with_capacity_and_tables(requested: usize, tables: usize) -> Self {
        Self {
            table: Table::with_capacity_and_tables(requested, tables),
        }
    }
}

impl<T, S, B, const SLOTS: usize> Default for HashSet<T, S, B, SLOTS>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
    B: BuildHashFamily + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

/// An iterator over the values of a `HashSet`.
pub struct Iter<'a, T, const SLOTS: usize> {
    inner: table::Keys<'a, T, (), SLOTS>,
}

impl<'a, T, const SLOTS: usize> Iterator for Iter<'a, T, SLOTS> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, const SLOTS: usize> ExactSizeIterator for Iter<'_, T, SLOTS> {}

impl<T, const SLOTS: usize> FusedIterator for Iter<'_, T, SLOTS> {}

/// A draining iterator over the values of a `HashSet`.
pub struct Drain<'a, T, const SLOTS: usize> {
    inner: table::Drain<'a, T, (), SLOTS>,
}

impl<T, const SLOTS: usize> Iterator for Drain<'_, T, SLOTS> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(v, _)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, const SLOTS: usize> ExactSizeIterator for Drain<'_, T, SLOTS> {}

impl<T, const SLOTS: usize> FusedIterator for Drain<'_, T, SLOTS> {}

impl<'a, T, S, B, const SLOTS: usize> IntoIterator for &'a HashSet<T, S, B, SLOTS>
where
    B: BuildHashFamily,
{
    type IntoIter = Iter<'a, T, SLOTS>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, S, B, const SLOTS: usize> FromIterator<T> for HashSet<T, S, B, SLOTS>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
    B: BuildHashFamily + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = HashSet::new();
        set.extend(iter);
        set
    }
}

impl<T, S, B, const SLOTS: usize> Extend<T> for HashSet<T, S, B, SLOTS>
where
    T: Hash + Eq,
    S: BuildHasher,
    B: BuildHashFamily,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeSet;
    use alloc::format;
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec::Vec;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k1: rng.try_next_u64().unwrap_or(0),
                k2: rng.try_next_u64().unwrap_or(0),
            }
        }
    }

    type SipSet<T> = HashSet<T, SipHashBuilder>;

    #[test]
    fn test_new_and_with_capacity() {
        let set: SipSet<i32> = HashSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);

        let set: SipSet<i32> = HashSet::with_capacity(200);
        assert!(set.capacity() >= 200);

        let set: SipSet<i32> = HashSet::with_capacity_and_tables(200, 4);
        assert!(set.capacity() >= 200);
        assert!(set.is_empty());
    }

    #[test]
    fn test_try_with_hashers_rejects_one_table() {
        let result = SipSet::<i32>::try_with_hashers(
            10,
            1,
            SipHashBuilder::default(),
            MatrixFamilyBuilder::default(),
        );
        assert_eq!(result.unwrap_err(), CuckooError::TooFewTables { tables: 1 });
    }

    #[test]
    fn test_insert_and_contains() {
        let mut set: SipSet<i32> = HashSet::new();

        assert!(set.insert(1));
        assert_eq!(set.len(), 1);
        assert!(set.contains(&1));

        assert!(!set.insert(1));
        assert_eq!(set.len(), 1);

        assert!(set.insert(2));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&2));
        assert!(!set.contains(&3));
    }

    #[test]
    fn test_try_insert() {
        let mut set: SipSet<i32> = HashSet::new();
        assert_eq!(set.try_insert(5), Ok(true));
        assert_eq!(set.try_insert(5), Ok(false));
    }

    #[test]
    fn test_remove_and_take() {
        let mut set: SipSet<String> = HashSet::new();
        set.insert("a".to_string());
        set.insert("b".to_string());

        assert!(set.remove(&"a".to_string()));
        assert!(!set.remove(&"a".to_string()));
        assert_eq!(set.take(&"b".to_string()), Some("b".to_string()));
        assert_eq!(set.take(&"b".to_string()), None);
        assert!(set.is_empty());
    }

    #[test]
    fn test_get() {
        let mut set: SipSet<i32> = HashSet::new();
        set.insert(42);
        assert_eq!(set.get(&42), Some(&42));
        assert_eq!(set.get(&7), None);
    }

    #[test]
    fn test_clear_and_reserve() {
        let mut set: SipSet<i32> = (0..100).collect();
        let capacity = set.capacity();
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.capacity(), capacity);

        set.reserve(5_000);
        assert!(set.capacity() >= 5_000);
    }

    #[test]
    fn test_iter_and_drain() {
        let mut set: SipSet<u32> = (0..1_000).collect();
        assert_eq!(set.iter().len(), 1_000);
        let seen: BTreeSet<u32> = set.iter().copied().collect();
        assert_eq!(seen, (0..1_000).collect::<BTreeSet<_>>());
        assert_eq!((&set).into_iter().count(), 1_000);

        let mut drained: Vec<u32> = set.drain().collect();
        drained.sort_unstable();
        assert_eq!(drained, (0..1_000).collect::<Vec<_>>());
        assert!(set.is_empty());
    }

    #[test]
    fn test_insert_remove_cycle() {
        let mut set: SipSet<u64> = HashSet::new();
        for round in 0..10 {
            for v in 0..500 {
                assert!(set.insert(v + round));
            }
            for v in 0..500 {
                assert!(set.remove(&(v + round)));
            }
            assert!(set.is_empty());
        }
    }

    #[test]
    fn test_set_relations() {
        let a: SipSet<i32> = [1, 2].into_iter().collect();
        let b: SipSet<i32> = [1, 2, 3].into_iter().collect();
        let c: SipSet<i32> = [4, 5, 6, 7].into_iter().collect();

        assert!(a.is_subset(&b));
        assert!(!b.is_subset(&a));
        assert!(b.is_superset(&a));
        assert!(a.is_disjoint(&c));
        assert!(c.is_disjoint(&a));
        assert!(!a.is_disjoint(&b));
    }

    #[test]
    fn test_eq_clone_and_debug() {
        let a: SipSet<i32> = [3, 1, 2].into_iter().collect();
        let mut b = a.clone();
        assert_eq!(a, b);

        b.insert(4);
        assert_ne!(a, b);

        let mut single: SipSet<i32> = HashSet::new();
        single.insert(9);
        assert_eq!(format!("{single:?}"), "{9}");
    }

    #[test]
    fn test_ceiling_reports_homeless_value() {
        let mut set: HashSet<u32> = HashSet::new();
        let capacity = set.capacity();
        set.set_max_capacity(Some(capacity));

        let mut inserted = 0;
        for v in 0..capacity as u32 * 2 {
            match set.try_insert(v) {
                Ok(true) => inserted += 1,
                Ok(false) => unreachable!(),
                Err(err) => {
                    assert!(!set.contains(&err.key));
                    break;
                }
            }
        }
        assert_eq!(set.len(), inserted);
        assert_eq!(set.capacity(), capacity);
    }
}
