//! Attribute value → codeword mapping (superimposed coding).

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::common::config::WILDCARD;
use crate::relation::Tuple;

use super::Bits;

/// Build the `m`-bit codeword for one attribute value, with exactly `k`
/// bits set.
///
/// The bit positions come from a generator seeded with the CRC32 of the
/// value, created fresh for every call, so equal values always produce equal
/// codewords regardless of call order. The [`WILDCARD`] value maps to the
/// all-zero vector.
///
/// # Panics
/// Panics if `k > m`. [`RelationConfig::validate`](crate::RelationConfig::validate)
/// rejects such widths before a relation is created.
///
/// # Example
/// ```
/// use sigfile::signature::codeword;
///
/// let a = codeword("abc", 32, 3);
/// assert_eq!(a.count_ones(), 3);
/// assert_eq!(a, codeword("abc", 32, 3));
/// assert!(codeword("?", 32, 3).is_zero());
/// ```
pub fn codeword(value: &str, m: usize, k: usize) -> Bits {
    assert!(k <= m, "codeword needs {} bits but is only {} wide", k, m);

    let mut cword = Bits::new(m);
    if value == WILDCARD {
        return cword;
    }

    let seed = crc32fast::hash(value.as_bytes()) as u64;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut nset = 0;
    while nset < k {
        let bit = rng.random_range(0..m);
        if !cword.is_set(bit) {
            cword.set(bit);
            nset += 1;
        }
    }
    cword
}

/// OR together the codewords of every attribute of `tuple`.
pub fn superimpose(tuple: &Tuple, m: usize, k: usize) -> Bits {
    let mut sig = Bits::new(m);
    for value in tuple.values() {
        sig.or_assign(&codeword(value, m, k));
    }
    sig
}
