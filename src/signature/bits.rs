//! Fixed-width packed bit vectors.

use std::fmt;

/// A fixed-width bit vector, packed little-endian (bit `i` lives in byte
/// `i / 8` under mask `1 << (i % 8)`).
///
/// Signatures, codewords, bit-slices and query result sets are all `Bits`.
/// Binary operations require both operands to have the same width.
///
/// # Example
/// ```
/// use sigfile::signature::Bits;
///
/// let mut a = Bits::new(16);
/// a.set(3);
/// let mut b = Bits::new(16);
/// b.set(3);
/// b.set(9);
/// assert!(a.is_subset_of(&b));
/// assert!(!b.is_subset_of(&a));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Bits {
    nbits: usize,
    bytes: Vec<u8>,
}

impl Bits {
    /// Create an all-zero vector of `nbits` bits.
    pub fn new(nbits: usize) -> Self {
        Self {
            nbits,
            bytes: vec![0u8; nbits.div_ceil(8)],
        }
    }

    /// Rebuild a vector from its packed bytes.
    ///
    /// # Panics
    /// Panics if `bytes` is not exactly the packed size of `nbits`.
    pub fn from_bytes(nbits: usize, bytes: &[u8]) -> Self {
        assert_eq!(
            bytes.len(),
            nbits.div_ceil(8),
            "packed length does not match width"
        );
        let mut bits = Self {
            nbits,
            bytes: bytes.to_vec(),
        };
        bits.clear_tail();
        bits
    }

    /// Width in bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.nbits
    }

    /// True for a zero-width vector.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nbits == 0
    }

    /// Packed bytes, suitable for storing in a page slot.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    fn index_of(&self, bit: usize) -> (usize, u8) {
        assert!(bit < self.nbits, "bit {} out of range for width {}", bit, self.nbits);
        (bit >> 3, 1u8 << (bit & 7))
    }

    /// Set bit `bit`.
    #[inline]
    pub fn set(&mut self, bit: usize) {
        let (byte, mask) = self.index_of(bit);
        self.bytes[byte] |= mask;
    }

    /// Test bit `bit`.
    #[inline]
    pub fn is_set(&self, bit: usize) -> bool {
        let (byte, mask) = self.index_of(bit);
        self.bytes[byte] & mask != 0
    }

    /// Set every bit.
    pub fn set_all(&mut self) {
        self.bytes.fill(0xFF);
        self.clear_tail();
    }

    /// Clear every bit.
    pub fn clear_all(&mut self) {
        self.bytes.fill(0);
    }

    /// `self |= other`.
    pub fn or_assign(&mut self, other: &Bits) {
        self.check_width(other);
        for (a, b) in self.bytes.iter_mut().zip(&other.bytes) {
            *a |= b;
        }
    }

    /// `self &= other`.
    pub fn and_assign(&mut self, other: &Bits) {
        self.check_width(other);
        for (a, b) in self.bytes.iter_mut().zip(&other.bytes) {
            *a &= b;
        }
    }

    /// True if every bit set in `self` is also set in `other`.
    pub fn is_subset_of(&self, other: &Bits) -> bool {
        self.check_width(other);
        self.bytes
            .iter()
            .zip(&other.bytes)
            .all(|(a, b)| a & !b == 0)
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// True if no bit is set.
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    /// Positions of the set bits, ascending.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bytes.iter().enumerate().flat_map(|(i, &byte)| {
            (0..8)
                .filter(move |bit| byte & (1 << bit) != 0)
                .map(move |bit| i * 8 + bit)
        })
    }

    fn check_width(&self, other: &Bits) {
        assert_eq!(
            self.nbits, other.nbits,
            "bit vector width mismatch ({} vs {})",
            self.nbits, other.nbits
        );
    }

    // Bits past `nbits` in the last byte stay zero so byte-wise ops and
    // `count_ones` never see them.
    fn clear_tail(&mut self) {
        let rem = self.nbits % 8;
        if rem != 0 {
            if let Some(last) = self.bytes.last_mut() {
                *last &= (1u8 << rem) - 1;
            }
        }
    }
}

impl fmt::Debug for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bits({})", self)
    }
}

/// Renders bit 0 first, as a run of `0`/`1`.
impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.nbits {
            f.write_str(if self.is_set(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}
