use alloc::vec::Vec;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::matrix_hash::BitMatrixHash;

/// A set of hash functions indexed by subtable.
pub trait HashFamily {
    /// Derives the hash for `table` from the key's scalar hash.
    ///
    /// The table reduces the result modulo its bucket count, so every output
    /// bit should matter.
    fn hash(&self, table: usize, scalar: u64) -> u64;
}

/// Builds a [`HashFamily`] for a given table shape.
///
/// This is to `HashFamily` what `BuildHasher` is to `Hasher`: the table keeps
/// the builder and asks it for a new family whenever its layout changes.
pub trait BuildHashFamily {
    /// The family produced by this builder.
    type Family: HashFamily;

    /// Builds a family with `tables` functions.
    ///
    /// `modulus_seed` is the bucket count per subtable of the layout the
    /// family is built for. Builders should fold it into their randomness so
    /// differently sized layouts do not share functions.
    fn build_family(&self, tables: usize, modulus_seed: u64) -> Self::Family;
}

/// The default family: one random [`BitMatrixHash`] per subtable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatrixHashFamily {
    matrices: Vec<BitMatrixHash>,
}

impl MatrixHashFamily {
    /// Draws `tables` matrices from a single generator seeded with `seed`.
    pub fn with_seed(tables: usize, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        Self {
            matrices: (0..tables)
                .map(|_| BitMatrixHash::generate(&mut rng))
                .collect(),
        }
    }

    /// Number of functions in the family.
    pub fn tables(&self) -> usize {
        self.matrices.len()
    }
}

impl HashFamily for MatrixHashFamily {
    #[inline]
    fn hash(&self, table: usize, scalar: u64) -> u64 {
        self.matrices[table].hash(scalar)
    }
}

/// Builds [`MatrixHashFamily`] instances from a caller-chosen seed.
///
/// The same seed always produces the same matrices for the same layout, which
/// keeps table behavior reproducible across runs.
///
/// # Examples
///
/// ```rust
/// use cuckoo_table::BuildHashFamily;
/// use cuckoo_table::HashFamily;
/// use cuckoo_table::MatrixFamilyBuilder;
///
/// let builder = MatrixFamilyBuilder::with_seed(0x5eed);
/// let a = builder.build_family(2, 13);
/// let b = builder.build_family(2, 13);
/// assert_eq!(a.hash(1, 99), b.hash(1, 99));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatrixFamilyBuilder {
    seed: u64,
}

impl MatrixFamilyBuilder {
    /// Creates a builder drawing from `seed`.
    pub const fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    /// The caller-chosen seed.
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

impl BuildHashFamily for MatrixFamilyBuilder {
    type Family = MatrixHashFamily;

    fn build_family(&self, tables: usize, modulus_seed: u64) -> MatrixHashFamily {
        // Fibonacci multiplier; spreads small bucket counts across the word.
        let seed = self.seed ^ modulus_seed.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        MatrixHashFamily::with_seed(tables, seed)
    }
}

#[cfg(test)]
mod tests {
    use rand::TryRngCore;
    use rand::rngs::OsRng;

    use super::*;

    #[test]
    fn one_function_per_table() {
        let family = MatrixFamilyBuilder::default().build_family(4, 13);
        assert_eq!(family.tables(), 4);
    }

    #[test]
    fn subtables_are_independent() {
        let seed = OsRng.try_next_u64().unwrap();
        let family = MatrixFamilyBuilder::with_seed(seed).build_family(3, 101);
        let mut agree = 0;
        for scalar in 1..=512u64 {
            let h0 = family.hash(0, scalar) % 101;
            let h1 = family.hash(1, scalar) % 101;
            let h2 = family.hash(2, scalar) % 101;
            if h0 == h1 && h1 == h2 {
                agree += 1;
            }
        }
        // Independent functions agree on a bucket for ~1/101^2 of keys.
        assert!(agree < 8, "{agree} keys landed in the same bucket everywhere");
    }

    #[test]
    fn reproducible_for_same_seed_and_layout() {
        let builder = MatrixFamilyBuilder::with_seed(99);
        assert_eq!(builder.build_family(2, 17), builder.build_family(2, 17));
    }

    #[test]
    fn layout_changes_functions() {
        let builder = MatrixFamilyBuilder::with_seed(99);
        assert_ne!(builder.build_family(2, 17), builder.build_family(2, 37));
    }

    #[test]
    fn seed_changes_functions() {
        assert_ne!(
            MatrixFamilyBuilder::with_seed(1).build_family(2, 17),
            MatrixFamilyBuilder::with_seed(2).build_family(2, 17)
        );
    }

    #[test]
    fn buckets_spread_evenly() {
        let family = MatrixFamilyBuilder::with_seed(7).build_family(2, 0);
        let mut counts = [0usize; 31];
        for key in 0..31_000u64 {
            counts[(family.hash(0, key) % 31) as usize] += 1;
        }
        for (bucket, &count) in counts.iter().enumerate() {
            assert!(
                (600..1400).contains(&count),
                "bucket {bucket} got {count} of 31000 keys"
            );
        }
    }
}
