use core::fmt::Debug;
use core::iter::FusedIterator;
use core::mem::MaybeUninit;

/// A fixed-capacity, unordered group of `SLOTS` entries.
///
/// Occupied slots are always packed into the prefix `[0, len)`. Removal moves
/// the last occupant into the vacated slot, so slot order is not stable
/// across removals.
///
/// # Examples
///
/// ```rust
/// use cuckoo_table::bucket::Bucket;
///
/// let mut bucket: Bucket<u32, 2> = Bucket::new();
/// assert!(bucket.insert(1).is_ok());
/// assert!(bucket.insert(2).is_ok());
/// assert_eq!(bucket.insert(3), Err(3));
///
/// assert_eq!(bucket.remove_where(|&v| v == 1), Some(1));
/// assert_eq!(bucket.as_slice(), &[2]);
/// ```
pub struct Bucket<T, const SLOTS: usize> {
    len: usize,
    slots: [MaybeUninit<T>; SLOTS],
}

impl<T, const SLOTS: usize> Bucket<T, SLOTS> {
    /// Creates an empty bucket.
    pub const fn new() -> Self {
        Self {
            len: 0,
            slots: [const { MaybeUninit::uninit() }; SLOTS],
        }
    }

    /// Number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no slot is occupied.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if every slot is occupied.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == SLOTS
    }

    /// The occupied slots, in slot order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: The first `len` slots are initialized, and `MaybeUninit<T>` has
        // the same layout as `T`.
        unsafe { core::slice::from_raw_parts(self.slots.as_ptr().cast::<T>(), self.len) }
    }

    /// The occupied slots, in slot order.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: The first `len` slots are initialized, and `MaybeUninit<T>` has
        // the same layout as `T`.
        unsafe { core::slice::from_raw_parts_mut(self.slots.as_mut_ptr().cast::<T>(), self.len) }
    }

    /// Iterates over the occupied slots.
    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Index of the first occupied slot matching `eq`.
    #[inline]
    pub fn position(&self, eq: impl Fn(&T) -> bool) -> Option<usize> {
        self.as_slice().iter().position(eq)
    }

    /// Appends `item` after the occupied slots.
    ///
    /// Returns `item` back if the bucket is full.
    #[inline]
    pub fn insert(&mut self, item: T) -> Result<&mut T, T> {
        if self.is_full() {
            return Err(item);
        }

        let index = self.len;
        self.len += 1;
        Ok(self.slots[index].write(item))
    }

    /// Puts `item` into slot 0 and returns the previous occupant.
    ///
    /// This is the eviction step of cuckoo insertion: ownership of the old
    /// occupant passes to the caller in the same operation that stores the
    /// incoming entry.
    ///
    /// # Panics
    ///
    /// Panics if the bucket is empty.
    #[inline]
    pub fn exchange_front(&mut self, item: T) -> T {
        core::mem::replace(&mut self.as_mut_slice()[0], item)
    }

    /// Removes the entry at `index`, moving the last occupant into its slot.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn swap_remove(&mut self, index: usize) -> T {
        let last = self.len - 1;
        self.as_mut_slice().swap(index, last);
        self.len = last;
        // SAFETY: Slot `last` was initialized and now lies outside the occupied
        // prefix, so reading it moves the value out exactly once.
        unsafe { self.slots[last].assume_init_read() }
    }

    /// Removes and returns the first entry matching `eq`.
    pub fn remove_where(&mut self, eq: impl Fn(&T) -> bool) -> Option<T> {
        let index = self.position(eq)?;
        Some(self.swap_remove(index))
    }

    /// Removes the last occupied entry.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: Slot `len` was the last initialized slot and is no longer part
        // of the occupied prefix.
        Some(unsafe { self.slots[self.len].assume_init_read() })
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        let len = core::mem::replace(&mut self.len, 0);
        // SAFETY: The first `len` slots were initialized. `self.len` is already
        // zero, so a panicking destructor cannot cause a double drop.
        unsafe {
            core::ptr::drop_in_place(core::slice::from_raw_parts_mut(
                self.slots.as_mut_ptr().cast::<T>(),
                len,
            ));
        }
    }

    /// Moves every entry out, in slot order.
    ///
    /// The bucket is empty as soon as this returns; entries the iterator does
    /// not yield are dropped with it.
    pub fn drain(&mut self) -> Drain<'_, T, SLOTS> {
        let end = core::mem::replace(&mut self.len, 0);
        Drain {
            slots: &mut self.slots,
            front: 0,
            end,
        }
    }
}

impl<T, const SLOTS: usize> Default for Bucket<T, SLOTS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const SLOTS: usize> Drop for Bucket<T, SLOTS> {
    fn drop(&mut self) {
        if core::mem::needs_drop::<T>() {
            self.clear();
        }
    }
}

impl<T: Clone, const SLOTS: usize> Clone for Bucket<T, SLOTS> {
    fn clone(&self) -> Self {
        let mut bucket = Self::new();
        for (index, item) in self.iter().enumerate() {
            bucket.slots[index].write(item.clone());
            bucket.len = index + 1;
        }
        bucket
    }
}

impl<T: Debug, const SLOTS: usize> Debug for Bucket<T, SLOTS> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// A draining iterator over the entries of a [`Bucket`].
///
/// Created by [`Bucket::drain`].
pub struct Drain<'a, T, const SLOTS: usize> {
    slots: &'a mut [MaybeUninit<T>; SLOTS],
    front: usize,
    end: usize,
}

impl<T, const SLOTS: usize> Iterator for Drain<'_, T, SLOTS> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front == self.end {
            return None;
        }

        let index = self.front;
        self.front += 1;
        // SAFETY: Slots `[front, end)` are initialized and owned by the drain;
        // advancing `front` first hands this one out exactly once.
        Some(unsafe { self.slots[index].assume_init_read() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.front;
        (remaining, Some(remaining))
    }
}

impl<T, const SLOTS: usize> ExactSizeIterator for Drain<'_, T, SLOTS> {}

impl<T, const SLOTS: usize> FusedIterator for Drain<'_, T, SLOTS> {}

impl<T, const SLOTS: usize> Drop for Drain<'_, T, SLOTS> {
    fn drop(&mut self) {
        for _ in &mut *self {}
    }
}
