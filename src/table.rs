use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FusedIterator;

use crate::DefaultHashBuilder;
use crate::bucket;
use crate::bucket::Bucket;
use crate::error::CuckooError;
use crate::error::TryInsertError;
use crate::hash_family::BuildHashFamily;
use crate::hash_family::HashFamily;
use crate::hash_family::MatrixFamilyBuilder;
use crate::prime;

/// Requested size used by [`Table::new`].
const DEFAULT_REQUESTED_SIZE: usize = 13;

/// Subtable count used when none is given.
const DEFAULT_TABLES: usize = 2;

/// One stored entry together with its scalar hash.
///
/// Caching the scalar means evictions and rehashes never call back into the
/// key's `Hash` impl.
#[derive(Clone)]
struct Slot<K, V> {
    hash: u64,
    key: K,
    value: V,
}

/// Shape of the bucket array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Layout {
    tables: usize,
    table_buckets: usize,
}

impl Layout {
    /// Sizes each subtable to the smallest prime of at least
    /// `requested / tables / slots + 1` buckets.
    ///
    /// `bucket_bytes` is the size of the largest bucket type that will be
    /// allocated for this layout; the whole array must stay within
    /// `isize::MAX` bytes.
    fn new(
        requested: usize,
        tables: usize,
        slots: usize,
        bucket_bytes: usize,
    ) -> Result<Self, CuckooError> {
        let minimum = requested / tables / slots + 1;
        // Reject layouts that cannot fit before searching for a huge prime.
        Self::check_size(minimum, tables, slots, bucket_bytes)?;

        let table_buckets = prime::next_prime(minimum).ok_or(CuckooError::CapacityOverflow)?;
        Self::check_size(table_buckets, tables, slots, bucket_bytes)?;
        Ok(Self {
            tables,
            table_buckets,
        })
    }

    fn check_size(
        table_buckets: usize,
        tables: usize,
        slots: usize,
        bucket_bytes: usize,
    ) -> Result<(), CuckooError> {
        let buckets = table_buckets
            .checked_mul(tables)
            .ok_or(CuckooError::CapacityOverflow)?;
        buckets
            .checked_mul(slots)
            .ok_or(CuckooError::CapacityOverflow)?;
        match buckets.checked_mul(bucket_bytes) {
            Some(bytes) if bytes <= isize::MAX as usize => Ok(()),
            _ => Err(CuckooError::CapacityOverflow),
        }
    }

    fn checked_capacity(&self, slots: usize) -> Result<usize, CuckooError> {
        self.tables
            .checked_mul(self.table_buckets)
            .and_then(|buckets| buckets.checked_mul(slots))
            .ok_or(CuckooError::CapacityOverflow)
    }

    #[inline(always)]
    fn total_buckets(&self) -> usize {
        self.tables * self.table_buckets
    }

    /// Turns a subtable number and its hash into an index into the flat
    /// bucket array.
    #[inline(always)]
    fn index(&self, table: usize, hash: u64) -> usize {
        table * self.table_buckets + (hash % self.table_buckets as u64) as usize
    }
}

/// Size of the largest bucket array element a table of this shape allocates:
/// its own buckets, or the scratch buckets used while planning a grow.
fn bucket_bytes<K, V, const SLOTS: usize>() -> usize {
    let entries = core::mem::size_of::<Bucket<Slot<K, V>, SLOTS>>();
    let scratch = core::mem::size_of::<Bucket<usize, SLOTS>>();
    entries.max(scratch)
}

fn empty_buckets<T, const SLOTS: usize>(
    count: usize,
) -> Result<Vec<Bucket<T, SLOTS>>, CuckooError> {
    let mut buckets = Vec::new();
    buckets
        .try_reserve_exact(count)
        .map_err(|_| CuckooError::CapacityOverflow)?;
    buckets.extend(core::iter::repeat_with(Bucket::new).take(count));
    Ok(buckets)
}

/// Places `item` with cuckoo eviction, starting at subtable 0.
///
/// `locate` maps an item and a subtable number to a bucket index. On failure
/// the item left without a bucket is returned; every other item remains
/// stored. Failure means the item being inserted was pushed back out of its
/// bucket `tables + 1` times, or the chain ran past its step limit.
fn place_evicting<T, const SLOTS: usize>(
    buckets: &mut [Bucket<T, SLOTS>],
    tables: usize,
    mut carried: T,
    locate: impl Fn(&T, usize) -> usize,
) -> Result<(), T> {
    let mut retries = tables + 1;
    let mut steps = buckets.len().saturating_mul(tables + 1);
    // Bucket currently holding the item being inserted, or `None` while it is
    // the one carried. Only slot 0 of full buckets changes during the chain,
    // so the item stays at slot 0 of that bucket until the chain returns.
    let mut home: Option<usize> = None;
    let mut table = 0;

    loop {
        let index = locate(&carried, table);
        let bucket = &mut buckets[index];
        carried = match bucket.insert(carried) {
            Ok(_) => return Ok(()),
            Err(carried) => bucket.exchange_front(carried),
        };

        match home {
            None => home = Some(index),
            Some(home_index) if home_index == index => {
                home = None;
                retries -= 1;
                if retries == 0 {
                    return Err(carried);
                }
            }
            Some(_) => {}
        }

        steps -= 1;
        if steps == 0 {
            return Err(carried);
        }

        table += 1;
        if table == tables {
            table = 0;
        }
    }
}

/// Debug statistics for table analysis.
///
/// Compiled with the `stats` feature or under `cfg(test)`.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of entries in the table
    pub len: usize,
    /// Total number of slots
    pub capacity: usize,
    /// Number of subtables
    pub tables: usize,
    /// Buckets in each subtable
    pub table_buckets: usize,
    /// Buckets across all subtables
    pub total_buckets: usize,
    /// Load factor (len / capacity)
    pub load_factor: f64,
    /// Entries stored in each subtable
    pub per_table: Vec<usize>,
    /// `occupancy[n]` is the number of buckets holding exactly `n` entries
    pub occupancy: Vec<usize>,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Cuckoo Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.len,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Layout: {} subtables x {} buckets ({} buckets)",
            self.tables, self.table_buckets, self.total_buckets
        );
        for (table, count) in self.per_table.iter().enumerate() {
            println!("Subtable {table}: {count} entries");
        }
        for (entries, buckets) in self.occupancy.iter().enumerate() {
            println!("Buckets with {entries} entries: {buckets}");
        }
    }
}

/// A multi-table bucketized cuckoo hash table.
///
/// `Table<K, V, S, B, SLOTS>` maps keys of type `K` to values of type `V`.
/// `S` computes the scalar hash of a key, `B` builds the per-subtable hash
/// family, and `SLOTS` is the number of entries per bucket.
///
/// ## Performance Characteristics
///
/// - **Lookup and removal**: at most `tables × SLOTS` slot comparisons.
/// - **Insertion**: amortized O(1); an insertion that runs into an eviction
///   cycle rebuilds the whole table at a larger size.
/// - **Memory**: a `u64` cached hash per slot plus the size of `(K, V)`, for
///   every slot including empty ones.
///
/// ## Example
///
/// ```rust
/// use cuckoo_table::Table;
///
/// let mut table: Table<u32, &str> = Table::new();
/// table.insert(5, "five");
/// table.insert(19, "nineteen");
///
/// assert_eq!(table.get(&5), Some(&"five"));
/// assert_eq!(table.remove(&19), Some("nineteen"));
/// assert_eq!(table.get(&19), None);
/// assert_eq!(table.len(), 1);
/// ```
pub struct Table<
    K,
    V,
    S = DefaultHashBuilder,
    B = MatrixFamilyBuilder,
    const SLOTS: usize = 2,
> where
    B: BuildHashFamily,
{
    buckets: Vec<Bucket<Slot<K, V>, SLOTS>>,
    layout: Layout,
    len: usize,
    max_capacity: Option<usize>,

    family: B::Family,
    family_builder: B,
    hash_builder: S,
}

impl<K, V, S, B, const SLOTS: usize> Debug for Table<K, V, S, B, SLOTS>
where
    K: Debug,
    V: Debug,
    B: BuildHashFamily,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S, B, const SLOTS: usize> Clone for Table<K, V, S, B, SLOTS>
where
    K: Clone,
    V: Clone,
    S: Clone,
    B: BuildHashFamily + Clone,
    B::Family: Clone,
{
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            layout: self.layout,
            len: self.len,
            max_capacity: self.max_capacity,
            family: self.family.clone(),
            family_builder: self.family_builder.clone(),
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<K, V, S, B, const SLOTS: usize> Table<K, V, S, B, SLOTS>
where
    B: BuildHashFamily,
{
    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table contains no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots, occupied or not.
    ///
    /// This is `tables × table_buckets × SLOTS`. Eviction cycles usually force
    /// a grow well before every slot is used, so treat it as an upper bound on
    /// [`len`](Self::len), not as a promise that this many entries fit.
    pub fn capacity(&self) -> usize {
        self.layout.total_buckets() * SLOTS
    }

    /// Number of subtables.
    pub fn tables(&self) -> usize {
        self.layout.tables
    }

    /// Number of buckets in each subtable. Always prime.
    pub fn table_buckets(&self) -> usize {
        self.layout.table_buckets
    }

    /// Fraction of slots occupied.
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.capacity() as f64
    }

    /// The growth ceiling, if one is set.
    pub fn max_capacity(&self) -> Option<usize> {
        self.max_capacity
    }

    /// Sets a ceiling on [`capacity`](Self::capacity).
    ///
    /// With a ceiling, an insertion that would need to grow past it fails
    /// with [`CuckooError::CapacityExceeded`] instead. `None` removes the
    /// ceiling. The current layout is not changed even if it already exceeds
    /// the new ceiling.
    pub fn set_max_capacity(&mut self, max_capacity: Option<usize>) {
        self.max_capacity = max_capacity;
    }

    /// Returns a reference to the scalar hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns a reference to the hash family builder.
    pub fn family_builder(&self) -> &B {
        &self.family_builder
    }

    /// Removes all entries, keeping the current layout.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.len = 0;
    }

    /// Returns an iterator over the entries.
    ///
    /// Entries are visited bucket by bucket in index order and, within a
    /// bucket, in slot order. Any insertion or removal can reorder entries,
    /// so start a new iterator after mutating the table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_table::Table;
    ///
    /// let table: Table<u32, u32> = (0..10).map(|k| (k, k * k)).collect();
    /// let mut sum = 0;
    /// for (k, v) in table.iter() {
    ///     assert_eq!(*v, k * k);
    ///     sum += k;
    /// }
    /// assert_eq!(sum, 45);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V, SLOTS> {
        Iter {
            buckets: &self.buckets,
            bucket_index: 0,
            slot_index: 0,
            remaining: self.len,
        }
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> Keys<'_, K, V, SLOTS> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> Values<'_, K, V, SLOTS> {
        Values { inner: self.iter() }
    }

    /// Removes every entry and yields it by value.
    ///
    /// The table keeps its layout. Entries not consumed before the iterator
    /// is dropped are dropped with it. If the iterator is leaked instead, the
    /// entries of buckets it had not started on stay in the table, and `len`
    /// still counts exactly those.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_table::Table;
    ///
    /// let mut table: Table<u32, u32> = (0..10).map(|k| (k, k)).collect();
    /// let capacity = table.capacity();
    ///
    /// assert_eq!(table.drain().count(), 10);
    /// assert!(table.is_empty());
    /// assert_eq!(table.capacity(), capacity);
    /// ```
    pub fn drain(&mut self) -> Drain<'_, K, V, SLOTS> {
        Drain {
            buckets: self.buckets.iter_mut(),
            current: None,
            len: &mut self.len,
        }
    }

    /// Returns detailed occupancy statistics for debugging.
    ///
    /// Compiled with the `stats` feature or under `cfg(test)`.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let mut per_table = vec![0usize; self.layout.tables];
        let mut occupancy = vec![0usize; SLOTS + 1];
        for (index, bucket) in self.buckets.iter().enumerate() {
            per_table[index / self.layout.table_buckets] += bucket.len();
            occupancy[bucket.len()] += 1;
        }

        DebugStats {
            len: self.len,
            capacity: self.capacity(),
            tables: self.layout.tables,
            table_buckets: self.layout.table_buckets,
            total_buckets: self.layout.total_buckets(),
            load_factor: self.load_factor(),
            per_table,
            occupancy,
        }
    }
}

impl<K, V, S, B, const SLOTS: usize> Table<K, V, S, B, SLOTS>
where
    K: Hash + Eq,
    S: BuildHasher,
    B: BuildHashFamily,
{
    /// Creates a table sized for about `requested` entries with `tables`
    /// subtables, using the given hashers.
    ///
    /// Each subtable gets the smallest prime number of buckets that is at
    /// least `requested / tables / SLOTS + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`CuckooError::TooFewTables`] if `tables < 2`, and
    /// [`CuckooError::CapacityOverflow`] if the layout does not fit in
    /// memory.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_table::CuckooError;
    /// use cuckoo_table::DefaultHashBuilder;
    /// use cuckoo_table::MatrixFamilyBuilder;
    /// use cuckoo_table::Table;
    ///
    /// let table: Result<Table<u32, u32>, _> = Table::try_with_hashers(
    ///     100,
    ///     3,
    ///     DefaultHashBuilder::default(),
    ///     MatrixFamilyBuilder::with_seed(42),
    /// );
    /// assert_eq!(table.unwrap().tables(), 3);
    ///
    /// let table: Result<Table<u32, u32>, _> = Table::try_with_hashers(
    ///     100,
    ///     1,
    ///     DefaultHashBuilder::default(),
    ///     MatrixFamilyBuilder::with_seed(42),
    /// );
    /// assert_eq!(table.unwrap_err(), CuckooError::TooFewTables { tables: 1 });
    /// ```
    pub fn try_with_hashers(
        requested: usize,
        tables: usize,
        hash_builder: S,
        family_builder: B,
    ) -> Result<Self, CuckooError> {
        const { assert!(SLOTS > 0, "a bucket needs at least one slot") };

        if tables < 2 {
            return Err(CuckooError::TooFewTables { tables });
        }

        let layout = Layout::new(requested, tables, SLOTS, bucket_bytes::<K, V, SLOTS>())?;
        let family = family_builder.build_family(tables, layout.table_buckets as u64);

        Ok(Self {
            buckets: empty_buckets(layout.total_buckets())?,
            layout,
            len: 0,
            max_capacity: None,
            family,
            family_builder,
            hash_builder,
        })
    }

    /// Creates a table sized for about `requested` entries with `tables`
    /// subtables, using the given hashers.
    ///
    /// # Panics
    ///
    /// Panics if `tables < 2` or the layout overflows `usize`. See
    /// [`try_with_hashers`](Self::try_with_hashers) for a fallible version.
    pub fn with_hashers(
        requested: usize,
        tables: usize,
        hash_builder: S,
        family_builder: B,
    ) -> Self {
        match Self::try_with_hashers(requested, tables, hash_builder, family_builder) {
            Ok(table) => table,
            Err(err) => panic!("{err}"),
        }
    }

    /// Returns a reference to the value stored for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_table::Table;
    ///
    /// let mut table: Table<u32, u32> = Table::new();
    /// table.insert(1, 0);
    /// assert_eq!(table.get(&1), Some(&0));
    /// assert_eq!(table.get(&2), None);
    /// ```
    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the stored key and value for `key`.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        if self.len == 0 {
            return None;
        }

        let hash = self.hash_builder.hash_one(key);
        let (bucket, slot) = self.locate(hash, key)?;
        let slot = &self.buckets[bucket].as_slice()[slot];
        Some((&slot.key, &slot.value))
    }

    /// Returns a mutable reference to the value stored for `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        if self.len == 0 {
            return None;
        }

        let hash = self.hash_builder.hash_one(key);
        let (bucket, slot) = self.locate(hash, key)?;
        Some(&mut self.buckets[bucket].as_mut_slice()[slot].value)
    }

    /// Returns `true` if the table holds `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get_key_value(key).is_some()
    }

    /// Inserts a key-value pair, returning the previous value for the key.
    ///
    /// # Panics
    ///
    /// Panics if the table has to grow past its
    /// [maximum capacity](Self::set_max_capacity) or past `usize`. Use
    /// [`try_insert`](Self::try_insert) to handle that case.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_table::Table;
    ///
    /// let mut table: Table<u32, &str> = Table::new();
    /// assert_eq!(table.insert(37, "a"), None);
    /// assert_eq!(table.insert(37, "b"), Some("a"));
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.try_insert(key, value) {
            Ok(previous) => previous,
            Err(err) => panic!("{}", err.error),
        }
    }

    /// Inserts a key-value pair, returning the previous value for the key.
    ///
    /// An existing key has its value replaced in place. A new key is placed
    /// with cuckoo eviction; if that runs into a cycle the table grows and the
    /// placement is retried until it succeeds.
    ///
    /// # Errors
    ///
    /// Fails when growing would exceed the maximum capacity or overflow
    /// `usize`. The error carries the entry left without a slot, which may be
    /// a previously stored entry displaced by eviction; see
    /// [`TryInsertError`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_table::Table;
    ///
    /// let mut table: Table<u32, u32> = Table::new();
    /// let capacity = table.capacity();
    /// table.set_max_capacity(Some(capacity));
    ///
    /// let mut stored = 0;
    /// for k in 0..capacity as u32 * 2 {
    ///     match table.try_insert(k, k) {
    ///         Ok(_) => stored += 1,
    ///         Err(err) => {
    ///             // One entry is homeless, all others are still there.
    ///             assert!(table.get(&err.key).is_none());
    ///             break;
    ///         }
    ///     }
    /// }
    /// assert_eq!(table.len(), stored);
    /// assert_eq!(table.capacity(), capacity);
    /// ```
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>, TryInsertError<K, V>> {
        let hash = self.hash_builder.hash_one(&key);
        if let Some((bucket, slot)) = self.locate(hash, &key) {
            let slot = &mut self.buckets[bucket].as_mut_slice()[slot];
            return Ok(Some(core::mem::replace(&mut slot.value, value)));
        }

        let mut pending = Slot { hash, key, value };
        loop {
            match self.place(pending) {
                Ok(()) => {
                    self.len += 1;
                    return Ok(None);
                }
                Err(homeless) => pending = homeless,
            }

            let capacity = self.capacity();
            if let Err(error) = self.resize(capacity.saturating_mul(2), capacity) {
                return Err(TryInsertError {
                    key: pending.key,
                    value: pending.value,
                    error,
                });
            }
        }
    }

    /// Removes `key`, returning its value if it was present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_table::Table;
    ///
    /// let mut table: Table<u32, u32> = Table::new();
    /// table.insert(42, 1);
    /// assert_eq!(table.remove(&42), Some(1));
    /// assert_eq!(table.remove(&42), None);
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes `key`, returning the stored key and value if it was present.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        if self.len == 0 {
            return None;
        }

        let hash = self.hash_builder.hash_one(key);
        for table in 0..self.layout.tables {
            let index = self.layout.index(table, self.family.hash(table, hash));
            if let Some(slot) =
                self.buckets[index].remove_where(|slot| slot.hash == hash && slot.key == *key)
            {
                self.len -= 1;
                return Some((slot.key, slot.value));
            }
        }

        None
    }

    /// Makes room for at least `additional` more entries.
    ///
    /// After this returns, [`capacity`](Self::capacity) is at least
    /// `len + additional`. Like every rebuild, this reseeds the hash family.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`insert`](Self::insert).
    pub fn reserve(&mut self, additional: usize) {
        if let Err(err) = self.try_reserve(additional) {
            panic!("{err}");
        }
    }

    /// Fallible version of [`reserve`](Self::reserve).
    ///
    /// # Errors
    ///
    /// Fails if the required capacity exceeds the maximum capacity or the
    /// larger bucket array cannot be allocated. The table is left unchanged in
    /// that case.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), CuckooError> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or(CuckooError::CapacityOverflow)?;
        if required <= self.capacity() {
            return Ok(());
        }

        self.resize(required, self.capacity())
    }

    /// Finds the bucket and slot holding `key`.
    #[inline]
    fn locate(&self, hash: u64, key: &K) -> Option<(usize, usize)> {
        (0..self.layout.tables).find_map(|table| {
            let index = self.layout.index(table, self.family.hash(table, hash));
            self.buckets[index]
                .position(|slot| slot.hash == hash && slot.key == *key)
                .map(|slot| (index, slot))
        })
    }

    /// Runs cuckoo placement on the live bucket array.
    fn place(&mut self, slot: Slot<K, V>) -> Result<(), Slot<K, V>> {
        let layout = self.layout;
        let family = &self.family;
        place_evicting(&mut self.buckets, layout.tables, slot, |slot, table| {
            layout.index(table, family.hash(table, slot.hash))
        })
    }

    /// Rebuilds the table with room for at least `requested` entries.
    ///
    /// If the entries cannot all be placed at that size, the next attempt asks
    /// for `step` more slots, until an attempt succeeds or the size limit is
    /// hit. The table is untouched unless an attempt succeeds.
    #[cold]
    fn resize(&mut self, mut requested: usize, step: usize) -> Result<(), CuckooError> {
        log_debug!(
            "growing cuckoo table: {} entries in {} slots, requesting {}",
            self.len,
            self.capacity(),
            requested
        );

        loop {
            let layout = Layout::new(
                requested,
                self.layout.tables,
                SLOTS,
                bucket_bytes::<K, V, SLOTS>(),
            )?;
            let capacity = layout.checked_capacity(SLOTS)?;
            if let Some(max) = self.max_capacity
                && capacity > max
            {
                log_warn!(
                    "cuckoo table cannot grow to {} slots, maximum is {}",
                    capacity,
                    max
                );
                return Err(CuckooError::CapacityExceeded {
                    requested: capacity,
                    max,
                });
            }

            let family = self
                .family_builder
                .build_family(layout.tables, layout.table_buckets as u64);
            if let Some(destinations) = self.plan(&layout, &family)? {
                let buckets = empty_buckets(layout.total_buckets())?;
                self.relocate(layout, family, buckets, destinations);
                log_debug!("cuckoo table rebuilt with {} slots", capacity);
                return Ok(());
            }

            log_debug!("eviction cycle while rehashing into {} slots", capacity);
            requested = requested
                .checked_add(step)
                .ok_or(CuckooError::CapacityOverflow)?;
        }
    }

    /// Works out a placement of every entry in `layout` without moving any.
    ///
    /// Entries are numbered in iteration order and placed by number into a
    /// scratch bucket array, so a failed attempt costs nothing but time. On
    /// success returns the destination bucket of every entry, in iteration
    /// order, and `None` if the entries do not fit.
    fn plan(
        &self,
        layout: &Layout,
        family: &B::Family,
    ) -> Result<Option<Vec<usize>>, CuckooError> {
        let hashes: Vec<u64> = self
            .buckets
            .iter()
            .flat_map(Bucket::iter)
            .map(|slot| slot.hash)
            .collect();

        let mut scratch: Vec<Bucket<usize, SLOTS>> = empty_buckets(layout.total_buckets())?;
        for id in 0..hashes.len() {
            let placed = place_evicting(&mut scratch, layout.tables, id, |&id, table| {
                layout.index(table, family.hash(table, hashes[id]))
            });
            if placed.is_err() {
                return Ok(None);
            }
        }

        let mut destinations = vec![0; hashes.len()];
        for (index, bucket) in scratch.iter().enumerate() {
            for &id in bucket.iter() {
                destinations[id] = index;
            }
        }
        Ok(Some(destinations))
    }

    /// Moves every entry into `buckets`, an empty array for `layout`, following
    /// a placement computed by [`plan`](Self::plan).
    fn relocate(
        &mut self,
        layout: Layout,
        family: B::Family,
        buckets: Vec<Bucket<Slot<K, V>, SLOTS>>,
        destinations: Vec<usize>,
    ) {
        let mut old = core::mem::replace(&mut self.buckets, buckets);
        let slots = old.iter_mut().flat_map(Bucket::drain);
        for (slot, destination) in slots.zip(destinations) {
            let placed = self.buckets[destination].insert(slot);
            debug_assert!(placed.is_ok(), "planned bucket {destination} is full");
        }

        self.layout = layout;
        self.family = family;
    }
}

impl<K, V, S, B, const SLOTS: usize> Table<K, V, S, B, SLOTS>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    B: BuildHashFamily + Default,
{
    /// Creates an empty table with the default size (13) and two subtables.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_REQUESTED_SIZE)
    }

    /// Creates an empty table sized for about `requested` entries, with two
    /// subtables.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_table::Table;
    ///
    /// let table: Table<u32, u32> = Table::with_capacity(100);
    /// assert!(table.capacity() >= 100);
    /// assert_eq!(table.tables(), 2);
    /// ```
    pub fn with_capacity(requested: usize) -> Self {
        Self::with_capacity_and_tables(requested, DEFAULT_TABLES)
    }

    /// Creates an empty table sized for about `requested` entries, with
    /// `tables` subtables.
    ///
    /// # Panics
    ///
    /// Panics if `tables < 2`.
    pub fn with_capacity_and_tables(requested: usize, tables: usize) -> Self {
        Self::with_hashers(requested, tables, S::default(), B::default())
    }
}

impl<K, V, S, B, const SLOTS: usize> Default for Table<K, V, S, B, SLOTS>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    B: BuildHashFamily + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, B, const SLOTS: usize> PartialEq for Table<K, V, S, B, SLOTS>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
    B: BuildHashFamily,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S, B, const SLOTS: usize> Eq for Table<K, V, S, B, SLOTS>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
    B: BuildHashFamily,
{
}

impl<K, V, S, B, const SLOTS: usize> Extend<(K, V)> for Table<K, V, S, B, SLOTS>
where
    K: Hash + Eq,
    S: BuildHasher,
    B: BuildHashFamily,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S, B, const SLOTS: usize> FromIterator<(K, V)> for Table<K, V, S, B, SLOTS>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    B: BuildHashFamily + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

impl<'a, K, V, S, B, const SLOTS: usize> IntoIterator for &'a Table<K, V, S, B, SLOTS>
where
    B: BuildHashFamily,
{
    type IntoIter = Iter<'a, K, V, SLOTS>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the entries of a [`Table`].
///
/// A cursor over `(bucket index, slot index)` positions, visiting buckets in
/// index order and the occupied slots of each bucket in slot order.
///
/// This struct is created by [`Table::iter`].
pub struct Iter<'a, K, V, const SLOTS: usize> {
    buckets: &'a [Bucket<Slot<K, V>, SLOTS>],
    bucket_index: usize,
    slot_index: usize,
    remaining: usize,
}

impl<K, V, const SLOTS: usize> Clone for Iter<'_, K, V, SLOTS> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets,
            bucket_index: self.bucket_index,
            slot_index: self.slot_index,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V, const SLOTS: usize> Iterator for Iter<'a, K, V, SLOTS> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let buckets = self.buckets;
        while let Some(bucket) = buckets.get(self.bucket_index) {
            if let Some(slot) = bucket.as_slice().get(self.slot_index) {
                self.slot_index += 1;
                self.remaining -= 1;
                return Some((&slot.key, &slot.value));
            }

            self.bucket_index += 1;
            self.slot_index = 0;
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, const SLOTS: usize> ExactSizeIterator for Iter<'_, K, V, SLOTS> {}

impl<K, V, const SLOTS: usize> FusedIterator for Iter<'_, K, V, SLOTS> {}

/// An iterator over the keys of a [`Table`].
pub struct Keys<'a, K, V, const SLOTS: usize> {
    inner: Iter<'a, K, V, SLOTS>,
}

impl<'a, K, V, const SLOTS: usize> Iterator for Keys<'a, K, V, SLOTS> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, const SLOTS: usize> ExactSizeIterator for Keys<'_, K, V, SLOTS> {}

impl<K, V, const SLOTS: usize> FusedIterator for Keys<'_, K, V, SLOTS> {}

/// An iterator over the values of a [`Table`].
pub struct Values<'a, K, V, const SLOTS: usize> {
    inner: Iter<'a, K, V, SLOTS>,
}

impl<'a, K, V, const SLOTS: usize> Iterator for Values<'a, K, V, SLOTS> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, const SLOTS: usize> ExactSizeIterator for Values<'_, K, V, SLOTS> {}

impl<K, V, const SLOTS: usize> FusedIterator for Values<'_, K, V, SLOTS> {}

/// A draining iterator over the entries of a [`Table`].
///
/// This struct is created by [`Table::drain`].
pub struct Drain<'a, K, V, const SLOTS: usize> {
    buckets: core::slice::IterMut<'a, Bucket<Slot<K, V>, SLOTS>>,
    current: Option<bucket::Drain<'a, Slot<K, V>, SLOTS>>,
    // The table's entry count, kept equal to the entries still in its buckets.
    len: &'a mut usize,
}

impl<K, V, const SLOTS: usize> Iterator for Drain<'_, K, V, SLOTS> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(slot) = self.current.as_mut().and_then(Iterator::next) {
                return Some((slot.key, slot.value));
            }

            let bucket = self.buckets.next()?;
            *self.len -= bucket.len();
            self.current = Some(bucket.drain());
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = *self.len + self.current.as_ref().map_or(0, |current| current.len());
        (remaining, Some(remaining))
    }
}

impl<K, V, const SLOTS: usize> ExactSizeIterator for Drain<'_, K, V, SLOTS> {}

impl<K, V, const SLOTS: usize> FusedIterator for Drain<'_, K, V, SLOTS> {}

impl<K, V, const SLOTS: usize> Drop for Drain<'_, K, V, SLOTS> {
    fn drop(&mut self) {
        for _ in &mut *self {}
    }
}
