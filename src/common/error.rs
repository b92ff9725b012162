//! Error types for sigfile.

use std::path::PathBuf;

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in sigfile.
///
/// Contract violations (a tuple with the wrong number of attributes, a record
/// longer than the relation's tuple size) are not represented here; they
/// panic at the call site.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page does not exist in the file.
    #[error("Page {0} not found")]
    PageNotFound(u32),

    /// Stored page checksum does not match its contents.
    #[error("Checksum mismatch on page {0}")]
    ChecksumMismatch(u32),

    /// A page was read from the wrong kind of file.
    #[error("Page {page} has type {found:?}, expected {expected:?}")]
    PageTypeMismatch {
        page: u32,
        expected: crate::storage::page::PageType,
        found: crate::storage::page::PageType,
    },

    /// Relation creation parameters are out of range.
    #[error("Invalid relation config: {0}")]
    InvalidConfig(String),

    /// The derived page layout cannot hold enough items per page.
    #[error("Invalid layout: {kind} capacity is {per_page} per page, need at least {required}")]
    InvalidLayout {
        kind: &'static str,
        per_page: u32,
        required: u32,
    },

    /// Tried to create a relation whose files already exist.
    #[error("Relation already exists: {0}")]
    RelationExists(PathBuf),

    /// The `.info` parameter block is unreadable.
    #[error("Corrupt parameter block: {0}")]
    CorruptParameters(String),

    /// A stored tuple record cannot be decoded.
    #[error("Corrupt tuple record: {0}")]
    CorruptRecord(String),

    /// A new data page would not fit in the bit-slices.
    #[error("Bit-slice capacity exceeded: page {page} but slices hold {capacity} pages")]
    BitSliceCapacityExceeded { page: u32, capacity: u32 },
}
