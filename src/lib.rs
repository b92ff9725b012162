//! sigfile - Superimposed-coding signature files for relations.
//!
//! Every tuple's attribute values are hashed into k-of-m codewords that are
//! ORed into signatures at three granularities. A partial-match query is
//! encoded the same way and tested as a subset of the stored signatures,
//! giving a candidate page set with no false negatives.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            sigfile                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                 Query Layer (query/)                     │   │
//! │  │   Query + ScanStrategy { tuple | page | bit-slice }      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Signatures (signature/)                     │   │
//! │  │   codeword → tsig (per tuple) → psig (per page)          │   │
//! │  │                               → bsig (bit-slices)        │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Relations (relation/)                      │   │
//! │  │   Relation: .info .data .tsig .psig .bsig + insert path  │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Storage Layer (storage/)                   │   │
//! │  │          PagedFile + Page + PageHeader                   │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, Error, config)
//! - [`storage`] - Paged file I/O and page formats
//! - [`signature`] - Bit vectors, codewords and the three signature indexes
//! - [`relation`] - Tuples, relation parameters and the relation store
//! - [`query`] - Partial-match query evaluation
//!
//! # Quick Start
//! ```no_run
//! use sigfile::{Query, Relation, RelationConfig, ScanStrategy, Tuple};
//!
//! let config = RelationConfig::new(2, 0.01, 3, 30, 20, 64);
//! let mut relation = Relation::create("people", config)?;
//! relation.insert(&Tuple::from_values(&["abc", "xyz"]))?;
//!
//! let mut query = Query::new(&relation, Tuple::from_values(&["abc", "?"]));
//! query.evaluate(ScanStrategy::BitSlices)?;
//! assert_eq!(query.candidate_pages().len(), 1);
//! drop(query);
//!
//! relation.close()?;
//! # Ok::<(), sigfile::Error>(())
//! ```

pub mod common;
pub mod query;
pub mod relation;
pub mod signature;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::{RelationConfig, PAGE_SIZE, WILDCARD};
pub use common::{Error, PageId, Result};

pub use query::{Query, ScanCost, ScanStrategy};
pub use relation::{Relation, RelationParameters, Tuple};
pub use signature::Bits;
pub use storage::page::{Page, PageHeader, PageType};
pub use storage::PagedFile;
