use core::fmt::Debug;

use rand::RngCore;

/// Width of the input word in bits, one matrix column per bit.
const INPUT_BITS: usize = u64::BITS as usize;

/// Width of the output word in bits.
const OUTPUT_BITS: u32 = u64::BITS;

/// A hash function computing `input · M` over GF(2) for a random matrix `M`.
///
/// Column `i` is the output contribution of input bit `i`, so evaluating the
/// hash XORs together the columns of all set input bits. The map is linear:
/// `h(a ^ b) == h(a) ^ h(b)` and `h(0) == 0`. It is meant to spread an already
/// hashed key, not to stand in for a keyed hash of its own.
///
/// # Examples
///
/// ```rust
/// use cuckoo_table::BitMatrixHash;
/// use rand::SeedableRng;
/// use rand::rngs::SmallRng;
///
/// let mut rng = SmallRng::seed_from_u64(7);
/// let hash = BitMatrixHash::generate(&mut rng);
///
/// assert_eq!(hash.hash(0), 0);
/// assert_eq!(hash.hash(3 ^ 5), hash.hash(3) ^ hash.hash(5));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct BitMatrixHash {
    columns: [u64; INPUT_BITS],
}

impl Debug for BitMatrixHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.columns.iter().map(|c| alloc::format!("{c:016x}")))
            .finish()
    }
}

/// Parity of a generator draw, one random matrix bit.
#[inline(always)]
fn parity(word: u32) -> u64 {
    u64::from(word.count_ones() & 1)
}

impl BitMatrixHash {
    /// Draws a fresh random matrix from `rng`.
    ///
    /// Every matrix bit is the parity of one 32-bit draw, so a full matrix
    /// consumes `64 × 64` draws.
    pub fn generate<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut columns = [0u64; INPUT_BITS];
        for column in columns.iter_mut() {
            for _ in 0..OUTPUT_BITS {
                *column = (*column << 1) | parity(rng.next_u32());
            }
        }
        Self { columns }
    }

    /// Builds a hash from explicit columns. Column `i` is the output for the
    /// input with only bit `i` set.
    pub const fn from_columns(columns: [u64; INPUT_BITS]) -> Self {
        Self { columns }
    }

    /// The matrix columns, indexed by input bit.
    pub fn columns(&self) -> &[u64; INPUT_BITS] {
        &self.columns
    }

    /// Evaluates the hash.
    #[inline]
    pub fn hash(&self, input: u64) -> u64 {
        let mut sum = 0;
        let mut bits = input;
        while bits != 0 {
            sum ^= self.columns[bits.trailing_zeros() as usize];
            bits &= bits - 1;
        }
        sum
    }
}
