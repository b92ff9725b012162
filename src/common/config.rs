//! Configuration constants and relation creation parameters.

use crate::common::{Error, Result};

/// Size of a page in bytes (4KB).
///
/// Every one of the paged relation files (`.data`, `.tsig`, `.psig`,
/// `.bsig`) is a sequence of pages of exactly this size.
pub const PAGE_SIZE: usize = 4096;

/// Attribute value meaning "don't care" in a query tuple.
///
/// Its codeword is the all-zero vector.
pub const WILDCARD: &str = "?";

/// Separator between attribute values in an encoded tuple record.
pub const ATTR_SEPARATOR: char = ',';

/// Longest attribute value (in bytes) a tuple record reserves room for.
pub const MAX_ATTR_BYTES: usize = 15;

/// Upper bound on attributes per relation. A record of this many
/// attributes could never fit on a data page anyway.
pub const MAX_ATTRS: u32 = PAGE_SIZE as u32;

/// File suffixes, one per relation file.
pub const INFO_SUFFIX: &str = "info";
pub const DATA_SUFFIX: &str = "data";
pub const TSIG_SUFFIX: &str = "tsig";
pub const PSIG_SUFFIX: &str = "psig";
pub const BSIG_SUFFIX: &str = "bsig";

/// Parameters supplied when a relation is created.
///
/// Widths are given in bits and rounded up to a byte boundary when the
/// relation layout is derived.
///
/// # Example
/// ```
/// use sigfile::RelationConfig;
///
/// let config = RelationConfig::new(2, 0.01, 3, 30, 20, 64);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelationConfig {
    /// Number of attributes per tuple.
    pub nattrs: u32,
    /// Page fill factor / target false-match probability.
    pub false_match_prob: f32,
    /// Bits set per attribute codeword (`tk`).
    pub code_bits: u32,
    /// Tuple signature width in bits (`tm`).
    pub tsig_bits: u32,
    /// Page signature width in bits (`pm`).
    pub psig_bits: u32,
    /// Bit-slice width in bits (`bm`): how many data pages a slice can describe.
    pub bsig_bits: u32,
}

impl RelationConfig {
    /// Create a config from explicit widths.
    pub fn new(
        nattrs: u32,
        false_match_prob: f32,
        code_bits: u32,
        tsig_bits: u32,
        psig_bits: u32,
        bsig_bits: u32,
    ) -> Self {
        Self {
            nattrs,
            false_match_prob,
            code_bits,
            tsig_bits,
            psig_bits,
            bsig_bits,
        }
    }

    /// Derive signature widths from a target false-match probability.
    ///
    /// Uses the usual superimposed-coding sizing: each codeword sets
    /// `k = ln(1/pF) / ln 2` bits and a signature over `n` values is
    /// `m = k * n / ln 2` bits wide. Tuple signatures cover `nattrs` values,
    /// page signatures cover `nattrs * tuples_per_page` values. The bit-slice
    /// width is sized for `expected_pages` data pages.
    pub fn from_false_match_probability(
        nattrs: u32,
        false_match_prob: f32,
        tuples_per_page: u32,
        expected_pages: u32,
    ) -> Result<Self> {
        if !(false_match_prob > 0.0 && false_match_prob < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "false match probability must be in (0, 1), got {}",
                false_match_prob
            )));
        }
        if nattrs == 0 || tuples_per_page == 0 {
            return Err(Error::InvalidConfig(
                "nattrs and tuples_per_page must be > 0".to_string(),
            ));
        }

        let ln2 = std::f64::consts::LN_2;
        let k = ((1.0 / false_match_prob as f64).ln() / ln2).ceil().max(1.0);
        let width = |values: f64| ((k * values) / ln2).ceil() as u32;

        Ok(Self {
            nattrs,
            false_match_prob,
            code_bits: k as u32,
            tsig_bits: width(nattrs as f64),
            psig_bits: width(nattrs as f64 * tuples_per_page as f64),
            bsig_bits: expected_pages.max(1),
        })
    }

    /// Check the parameters that do not depend on the page layout.
    ///
    /// `code_bits` must not exceed either signature width, otherwise codeword
    /// generation could never set enough distinct bits.
    pub fn validate(&self) -> Result<()> {
        if self.nattrs == 0 {
            return Err(Error::InvalidConfig("nattrs must be > 0".to_string()));
        }
        if self.nattrs > MAX_ATTRS {
            return Err(Error::InvalidConfig(format!(
                "nattrs ({}) exceeds {}",
                self.nattrs, MAX_ATTRS
            )));
        }
        if self.code_bits == 0 {
            return Err(Error::InvalidConfig("code_bits must be > 0".to_string()));
        }
        if self.tsig_bits == 0 || self.psig_bits == 0 || self.bsig_bits == 0 {
            return Err(Error::InvalidConfig(
                "signature widths must be > 0".to_string(),
            ));
        }
        if self.code_bits > self.tsig_bits {
            return Err(Error::InvalidConfig(format!(
                "code_bits ({}) exceeds tuple signature width ({})",
                self.code_bits, self.tsig_bits
            )));
        }
        if self.code_bits > self.psig_bits {
            return Err(Error::InvalidConfig(format!(
                "code_bits ({}) exceeds page signature width ({})",
                self.code_bits, self.psig_bits
            )));
        }
        Ok(())
    }
}

/// Round a width in bits up to the next byte boundary.
#[inline]
pub fn round_up_to_byte(bits: u32) -> u32 {
    bits.div_ceil(8) * 8
}
