//! Tuples and their on-disk record format.

use std::fmt;
use std::str::FromStr;

use crate::common::config::{ATTR_SEPARATOR, MAX_ATTR_BYTES, WILDCARD};
use crate::common::{Error, Result};

/// A tuple: an ordered list of attribute values, held as one
/// separator-joined record (`"abc,xyz"`).
///
/// Query tuples use the same type, with [`WILDCARD`] standing in for
/// unconstrained attributes.
///
/// # Record Layout
/// On a data page every tuple occupies one fixed-size slot:
/// ```text
/// Offset  Size      Field
/// ------  ----      -----
/// 0       2         record length (u16, little-endian)
/// 2       len       record bytes
/// 2+len   ...       zero padding up to the slot size
/// ```
///
/// # Example
/// ```
/// use sigfile::Tuple;
///
/// let t = Tuple::from_values(&["abc", "xyz"]);
/// assert_eq!(t.values().collect::<Vec<_>>(), vec!["abc", "xyz"]);
/// assert_eq!(t.to_string(), "abc,xyz");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tuple {
    record: String,
}

impl Tuple {
    /// Bytes taken by the length prefix of a stored record.
    pub const LEN_PREFIX: usize = 2;

    /// Build a tuple from attribute values.
    ///
    /// # Panics
    /// Panics if a value contains the attribute separator.
    pub fn from_values<S: AsRef<str>>(values: &[S]) -> Self {
        let mut record = String::new();
        for (i, value) in values.iter().map(AsRef::as_ref).enumerate() {
            assert!(
                !value.contains(ATTR_SEPARATOR),
                "attribute value {:?} contains the separator",
                value
            );
            if i > 0 {
                record.push(ATTR_SEPARATOR);
            }
            record.push_str(value);
        }
        Self { record }
    }

    /// A query tuple with every attribute unconstrained.
    pub fn wildcard(nattrs: usize) -> Self {
        Self::from_values(vec![WILDCARD; nattrs].as_slice())
    }

    /// Split the record into its attribute values.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.record.split(ATTR_SEPARATOR)
    }

    /// Number of attribute values.
    pub fn nattrs(&self) -> usize {
        self.values().count()
    }

    /// Length of the record in bytes (without the length prefix).
    pub fn len(&self) -> usize {
        self.record.len()
    }

    /// True for an empty record.
    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    /// Record bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.record.as_bytes()
    }

    /// Encode into a `slot_size`-byte, length-prefixed data page slot.
    ///
    /// # Panics
    /// Panics if the record does not fit in the slot.
    pub fn encode_record(&self, slot_size: usize) -> Vec<u8> {
        let len = self.record.len();
        assert!(
            Self::LEN_PREFIX + len <= slot_size,
            "record of {} bytes does not fit a {}-byte slot",
            len,
            slot_size
        );

        let mut slot = vec![0u8; slot_size];
        slot[..Self::LEN_PREFIX].copy_from_slice(&(len as u16).to_le_bytes());
        slot[Self::LEN_PREFIX..Self::LEN_PREFIX + len].copy_from_slice(self.record.as_bytes());
        slot
    }

    /// Decode a data page slot written by [`encode_record`](Self::encode_record).
    pub fn decode_record(slot: &[u8]) -> Result<Self> {
        if slot.len() < Self::LEN_PREFIX {
            return Err(Error::CorruptRecord(format!(
                "slot of {} bytes has no length prefix",
                slot.len()
            )));
        }
        let len = u16::from_le_bytes([slot[0], slot[1]]) as usize;
        let body = slot
            .get(Self::LEN_PREFIX..Self::LEN_PREFIX + len)
            .ok_or_else(|| Error::CorruptRecord(format!("length {} exceeds slot", len)))?;
        let record = std::str::from_utf8(body)
            .map_err(|e| Error::CorruptRecord(e.to_string()))?
            .to_string();
        Ok(Self { record })
    }
}

/// Largest record, in bytes, a tuple of `nattrs` attributes may have.
///
/// Saturates instead of overflowing; such a length never fits on a page.
pub fn max_record_len(nattrs: u32) -> u32 {
    nattrs
        .saturating_mul(MAX_ATTR_BYTES as u32 + 1)
        .saturating_sub(1)
}

impl FromStr for Tuple {
    type Err = std::convert::Infallible;

    /// Parse a separator-joined record, e.g. `"abc,?"`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self {
            record: s.to_string(),
        })
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.record)
    }
}
