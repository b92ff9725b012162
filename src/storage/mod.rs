//! Storage layer - paged file I/O and page formats.
//!
//! This module handles persistent storage:
//! - [`PagedFile`] - Fixed-size page I/O over one relation file
//! - [`page`] - Page types and layouts

pub mod page;
mod paged_file;

pub use paged_file::PagedFile;
