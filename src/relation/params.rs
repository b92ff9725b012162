//! Relation parameters and the `.info` parameter block.

use std::fmt;

use crate::common::config::{round_up_to_byte, RelationConfig};
use crate::common::{Error, Result};
use crate::storage::page::Page;

use super::tuple::{max_record_len, Tuple};

/// Static layout and dynamic counters of one relation.
///
/// The static half is derived once by [`from_config`](Self::from_config);
/// the dynamic half is updated by every insert and persisted only when the
/// relation is closed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelationParameters {
    // --- static ---
    /// Attributes per tuple.
    pub nattrs: u32,
    /// Page fill factor / false-match probability the relation was sized for.
    pub false_match_prob: f32,
    /// Largest tuple record in bytes.
    pub tuple_size: u32,
    /// Tuples per data page.
    pub tuples_per_page: u32,
    /// Bits set per attribute codeword.
    pub code_bits: u32,
    /// Tuple signature width in bits / bytes, and signatures per page.
    pub tsig_bits: u32,
    pub tsig_bytes: u32,
    pub tsigs_per_page: u32,
    /// Page signature width in bits / bytes, and signatures per page.
    pub psig_bits: u32,
    pub psig_bytes: u32,
    pub psigs_per_page: u32,
    /// Bit-slice width in bits / bytes, and slices per page.
    pub bsig_bits: u32,
    pub bsig_bytes: u32,
    pub bsigs_per_page: u32,

    // --- dynamic ---
    /// Tuples in the data file.
    pub ntuples: u32,
    /// Pages in the data file.
    pub npages: u32,
    /// Tuple signatures, and pages of the tuple signature file.
    pub ntsigs: u32,
    pub tsig_npages: u32,
    /// Page signatures, and pages of the page signature file.
    pub npsigs: u32,
    pub psig_npages: u32,
    /// Bit-slices, and pages of the bit-slice file.
    pub nbsigs: u32,
    pub bsig_npages: u32,
}

impl RelationParameters {
    /// Magic bytes at the start of every `.info` file.
    pub const MAGIC: [u8; 4] = *b"SIGF";
    /// Parameter block format version.
    pub const VERSION: u32 = 1;

    const NFIELDS: usize = 22;

    /// Serialized size: magic + version + fields + CRC32.
    pub const ENCODED_SIZE: usize = 4 + 4 + Self::NFIELDS * 4 + 4;

    /// Derive the relation layout from creation parameters.
    ///
    /// Every signature width is rounded up to a whole number of bytes before
    /// the per-page capacities are computed.
    ///
    /// # Errors
    /// - `Error::InvalidConfig` if `config.validate()` fails
    /// - `Error::InvalidLayout` if a data page cannot hold one tuple or one
    ///   tuple signature, or cannot hold two page signatures or two
    ///   bit-slices
    pub fn from_config(config: &RelationConfig) -> Result<Self> {
        config.validate()?;

        let tuple_size = max_record_len(config.nattrs);
        let tuples_per_page = Page::capacity(Tuple::LEN_PREFIX + tuple_size as usize) as u32;

        let tsig_bits = round_up_to_byte(config.tsig_bits);
        let psig_bits = round_up_to_byte(config.psig_bits);
        let bsig_bits = round_up_to_byte(config.bsig_bits);
        let tsig_bytes = tsig_bits / 8;
        let psig_bytes = psig_bits / 8;
        let bsig_bytes = bsig_bits / 8;

        let params = Self {
            nattrs: config.nattrs,
            false_match_prob: config.false_match_prob,
            tuple_size,
            tuples_per_page,
            code_bits: config.code_bits,
            tsig_bits,
            tsig_bytes,
            tsigs_per_page: Page::capacity(tsig_bytes as usize) as u32,
            psig_bits,
            psig_bytes,
            psigs_per_page: Page::capacity(psig_bytes as usize) as u32,
            bsig_bits,
            bsig_bytes,
            bsigs_per_page: Page::capacity(bsig_bytes as usize) as u32,
            ntuples: 0,
            npages: 0,
            ntsigs: 0,
            tsig_npages: 0,
            npsigs: 0,
            psig_npages: 0,
            nbsigs: 0,
            bsig_npages: 0,
        };

        require("tuple", params.tuples_per_page, 1)?;
        require("tuple signature", params.tsigs_per_page, 1)?;
        require("page signature", params.psigs_per_page, 2)?;
        require("bit-slice", params.bsigs_per_page, 2)?;

        Ok(params)
    }

    /// Bytes of one data page slot.
    #[inline]
    pub fn record_slot_size(&self) -> usize {
        Tuple::LEN_PREFIX + self.tuple_size as usize
    }

    /// True if the next insert has to start a new data page.
    #[inline]
    pub fn next_insert_starts_page(&self) -> bool {
        self.ntuples > 0 && self.ntuples % self.tuples_per_page == 0
    }

    /// Data page holding tuple number `tuple_index`.
    #[inline]
    pub fn page_of_tuple(&self, tuple_index: u32) -> u32 {
        tuple_index / self.tuples_per_page
    }

    fn fields(&self) -> [u32; Self::NFIELDS] {
        [
            self.nattrs,
            self.false_match_prob.to_bits(),
            self.tuple_size,
            self.tuples_per_page,
            self.code_bits,
            self.tsig_bits,
            self.tsig_bytes,
            self.tsigs_per_page,
            self.psig_bits,
            self.psig_bytes,
            self.psigs_per_page,
            self.bsig_bits,
            self.bsig_bytes,
            self.bsigs_per_page,
            self.ntuples,
            self.npages,
            self.ntsigs,
            self.tsig_npages,
            self.npsigs,
            self.psig_npages,
            self.nbsigs,
            self.bsig_npages,
        ]
    }

    fn from_fields(f: [u32; Self::NFIELDS]) -> Self {
        Self {
            nattrs: f[0],
            false_match_prob: f32::from_bits(f[1]),
            tuple_size: f[2],
            tuples_per_page: f[3],
            code_bits: f[4],
            tsig_bits: f[5],
            tsig_bytes: f[6],
            tsigs_per_page: f[7],
            psig_bits: f[8],
            psig_bytes: f[9],
            psigs_per_page: f[10],
            bsig_bits: f[11],
            bsig_bytes: f[12],
            bsigs_per_page: f[13],
            ntuples: f[14],
            npages: f[15],
            ntsigs: f[16],
            tsig_npages: f[17],
            npsigs: f[18],
            psig_npages: f[19],
            nbsigs: f[20],
            bsig_npages: f[21],
        }
    }

    /// Serialize to the fixed-size `.info` block.
    ///
    /// # Layout
    /// ```text
    /// Offset  Size  Field
    /// ------  ----  -----
    /// 0       4     magic "SIGF"
    /// 4       4     version (u32 LE)
    /// 8       88    22 parameter fields (u32 LE each)
    /// 96      4     CRC32 of bytes 0..96
    /// ```
    pub fn to_bytes(&self) -> [u8; Self::ENCODED_SIZE] {
        let mut buf = [0u8; Self::ENCODED_SIZE];
        buf[0..4].copy_from_slice(&Self::MAGIC);
        buf[4..8].copy_from_slice(&Self::VERSION.to_le_bytes());
        for (i, value) in self.fields().iter().enumerate() {
            let offset = 8 + i * 4;
            buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        }
        let crc_offset = Self::ENCODED_SIZE - 4;
        let crc = crc32fast::hash(&buf[..crc_offset]);
        buf[crc_offset..].copy_from_slice(&crc.to_le_bytes());
        buf
    }

    /// Parse an `.info` block written by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    /// Returns `Error::CorruptParameters` on a short buffer, bad magic,
    /// unknown version or checksum mismatch.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::ENCODED_SIZE {
            return Err(Error::CorruptParameters(format!(
                "expected {} bytes, found {}",
                Self::ENCODED_SIZE,
                buf.len()
            )));
        }
        if buf[0..4] != Self::MAGIC {
            return Err(Error::CorruptParameters("bad magic".to_string()));
        }
        let u32_at = |offset: usize| {
            u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
        };
        let version = u32_at(4);
        if version != Self::VERSION {
            return Err(Error::CorruptParameters(format!(
                "unsupported version {}",
                version
            )));
        }
        let crc_offset = Self::ENCODED_SIZE - 4;
        if crc32fast::hash(&buf[..crc_offset]) != u32_at(crc_offset) {
            return Err(Error::CorruptParameters("checksum mismatch".to_string()));
        }

        let mut fields = [0u32; Self::NFIELDS];
        for (i, field) in fields.iter_mut().enumerate() {
            *field = u32_at(8 + i * 4);
        }
        Ok(Self::from_fields(fields))
    }
}

fn require(kind: &'static str, per_page: u32, required: u32) -> Result<()> {
    if per_page < required {
        return Err(Error::InvalidLayout {
            kind,
            per_page,
            required,
        });
    }
    Ok(())
}

/// Relation report in the layout of the classic `stats` command.
impl fmt::Display for RelationParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Global Info:")?;
        writeln!(f, "Dynamic:")?;
        writeln!(
            f,
            "  #items:  tuples: {}  tsigs: {}  psigs: {}  bsigs: {}",
            self.ntuples, self.ntsigs, self.npsigs, self.nbsigs
        )?;
        writeln!(
            f,
            "  #pages:  tuples: {}  tsigs: {}  psigs: {}  bsigs: {}",
            self.npages, self.tsig_npages, self.psig_npages, self.bsig_npages
        )?;
        writeln!(f, "Static:")?;
        writeln!(
            f,
            "  tups   #attrs: {}  size: {} bytes  max/page: {}",
            self.nattrs, self.tuple_size, self.tuples_per_page
        )?;
        writeln!(
            f,
            "  sigs   bits/attr: {}  pF: {}",
            self.code_bits, self.false_match_prob
        )?;
        writeln!(
            f,
            "  tsigs  size: {} bits ({} bytes)  max/page: {}",
            self.tsig_bits, self.tsig_bytes, self.tsigs_per_page
        )?;
        writeln!(
            f,
            "  psigs  size: {} bits ({} bytes)  max/page: {}",
            self.psig_bits, self.psig_bytes, self.psigs_per_page
        )?;
        write!(
            f,
            "  bsigs  size: {} bits ({} bytes)  max/page: {}",
            self.bsig_bits, self.bsig_bytes, self.bsigs_per_page
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> RelationConfig {
        RelationConfig::new(2, 0.01, 3, 30, 20, 64)
    }

    #[test]
    fn test_from_config_rounds_widths() {
        let params = RelationParameters::from_config(&small_config()).unwrap();

        assert_eq!(params.tsig_bits, 32);
        assert_eq!(params.tsig_bytes, 4);
        assert_eq!(params.psig_bits, 24);
        assert_eq!(params.psig_bytes, 3);
        assert_eq!(params.bsig_bits, 64);
        assert_eq!(params.bsig_bytes, 8);

        assert_eq!(params.tsigs_per_page, (Page::BODY_SIZE / 4) as u32);
        assert_eq!(params.psigs_per_page, (Page::BODY_SIZE / 3) as u32);
        assert_eq!(params.bsigs_per_page, (Page::BODY_SIZE / 8) as u32);
    }

    #[test]
    fn test_from_config_tuple_layout() {
        let params = RelationParameters::from_config(&small_config()).unwrap();
        assert_eq!(params.tuple_size, 31);
        assert_eq!(params.record_slot_size(), 33);
        assert_eq!(params.tuples_per_page, (Page::BODY_SIZE / 33) as u32);
    }

    #[test]
    fn test_from_config_rejects_wide_bit_slices() {
        // 2100 bytes per slice: only one fits in a page
        let config = RelationConfig::new(2, 0.01, 3, 30, 20, 2100 * 8);
        assert!(matches!(
            RelationParameters::from_config(&config),
            Err(Error::InvalidLayout {
                kind: "bit-slice",
                per_page: 1,
                required: 2
            })
        ));
    }

    #[test]
    fn test_from_config_rejects_wide_page_signatures() {
        let config = RelationConfig::new(2, 0.01, 3, 30, 3000 * 8, 64);
        assert!(matches!(
            RelationParameters::from_config(&config),
            Err(Error::InvalidLayout {
                kind: "page signature",
                ..
            })
        ));
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let config = RelationConfig::new(2, 0.01, 40, 30, 20, 64);
        assert!(matches!(
            RelationParameters::from_config(&config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_config_rejects_huge_attribute_count() {
        let config = RelationConfig::new(300_000_000, 0.01, 3, 32, 24, 64);
        assert!(matches!(
            RelationParameters::from_config(&config),
            Err(Error::InvalidConfig(_))
        ));

        // accepted by validate, but one record is larger than a page
        let config = RelationConfig::new(300, 0.01, 3, 32, 24, 64);
        assert!(matches!(
            RelationParameters::from_config(&config),
            Err(Error::InvalidLayout { kind: "tuple", .. })
        ));
    }

    #[test]
    fn test_next_insert_starts_page() {
        let mut params = RelationParameters::from_config(&small_config()).unwrap();
        assert!(!params.next_insert_starts_page());

        params.ntuples = params.tuples_per_page - 1;
        assert!(!params.next_insert_starts_page());

        params.ntuples = params.tuples_per_page;
        assert!(params.next_insert_starts_page());
        assert_eq!(params.page_of_tuple(params.ntuples), 1);
    }

    #[test]
    fn test_bytes_roundtrip() {
        let mut params = RelationParameters::from_config(&small_config()).unwrap();
        params.ntuples = 1234;
        params.npages = 11;
        params.nbsigs = 24;

        let bytes = params.to_bytes();
        assert_eq!(&bytes[0..4], b"SIGF");
        assert_eq!(RelationParameters::from_bytes(&bytes).unwrap(), params);
    }

    #[test]
    fn test_from_bytes_detects_corruption() {
        let params = RelationParameters::from_config(&small_config()).unwrap();
        let mut bytes = params.to_bytes();
        bytes[20] ^= 0x01;
        assert!(matches!(
            RelationParameters::from_bytes(&bytes),
            Err(Error::CorruptParameters(_))
        ));

        assert!(RelationParameters::from_bytes(&bytes[..10]).is_err());

        let mut bad_magic = params.to_bytes();
        bad_magic[0] = b'X';
        assert!(RelationParameters::from_bytes(&bad_magic).is_err());
    }

    #[test]
    fn test_display() {
        let params = RelationParameters::from_config(&small_config()).unwrap();
        let report = params.to_string();
        assert!(report.starts_with("Global Info:"));
        assert!(report.contains("#attrs: 2"));
        assert!(report.contains("psigs  size: 24 bits (3 bytes)"));
    }
}
