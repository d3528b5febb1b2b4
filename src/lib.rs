#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*)
    };
}

#[cfg(feature = "logging")]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        log::warn!($($arg)*)
    };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "logging"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

/// Fixed-capacity slot groups used as the storage cells of a [`Table`].
pub mod bucket;

/// Errors reported by table construction and insertion.
pub mod error;

/// Families of per-subtable hash functions.
///
/// A cuckoo table needs one hash function per subtable, and the functions
/// must behave independently on the same key. The table computes one scalar
/// hash per key with its [`BuildHasher`](core::hash::BuildHasher) and asks a
/// [`HashFamily`] to turn that scalar into a per-subtable value. Families are
/// created through a [`BuildHashFamily`] each time the table changes size, so
/// a larger layout also gets new functions.
pub mod hash_family;

/// A hash set implemented on top of the cuckoo [`Table`].
///
/// This module provides a `HashSet` that stores its elements as keys of a
/// `Table` with unit values.
pub mod hash_set;

/// Random linear hashing over GF(2).
///
/// A [`BitMatrixHash`] multiplies the 64-bit input vector by a random 64×64
/// boolean matrix. Drawing the matrix uniformly at random gives a 2-universal
/// family: two distinct inputs collide with probability about `2^-64`.
pub mod matrix_hash;

/// Prime sizing for subtables.
///
/// Bucket selection folds the per-subtable hash with `%`, and a prime modulus
/// keeps every output bit of the hash relevant to the chosen bucket.
mod prime;

/// The cuckoo hash table.
///
/// [`Table`] keeps `tables` subtables of `table_buckets` buckets each in one
/// contiguous array, every bucket holding up to `SLOTS` entries. A key lives
/// in exactly one of its `tables` candidate buckets, one per subtable, so a
/// lookup inspects at most `tables × SLOTS` slots no matter how large the
/// table grows.
///
/// Insertion into a full candidate bucket evicts the bucket's first entry,
/// which moves on to its candidate in the next subtable, and so on. When the
/// eviction chain keeps returning the new entry to the front, the table is
/// rebuilt at a larger size with fresh hash functions.
pub mod table;

pub use error::CuckooError;
pub use error::TryInsertError;
pub use hash_family::BuildHashFamily;
pub use hash_family::HashFamily;
pub use hash_family::MatrixFamilyBuilder;
pub use hash_family::MatrixHashFamily;
pub use hash_set::HashSet;
pub use matrix_hash::BitMatrixHash;
pub use table::Table;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The scalar hasher used when none is given explicitly.
        ///
        /// Deterministic, so two default tables fed the same operations end up
        /// with the same layout.
        pub type DefaultHashBuilder = foldhash::fast::FixedState;
    } else if #[cfg(feature = "std")] {
        /// The scalar hasher used when none is given explicitly.
        ///
        /// Deterministic, so two default tables fed the same operations end up
        /// with the same layout.
        pub type DefaultHashBuilder =
            core::hash::BuildHasherDefault<std::hash::DefaultHasher>;
    } else {
        compile_error!("cuckoo-table needs either the `foldhash` or the `std` feature for its default hasher");
    }
}
