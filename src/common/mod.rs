//! Common types and utilities shared across sigfile.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and [`RelationConfig`](config::RelationConfig)
//! - Error types
//! - Identifiers (PageId)

pub mod config;
pub mod error;
mod page_id;

pub use error::{Error, Result};
pub use page_id::PageId;
