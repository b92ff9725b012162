//! Superimposed-coding signatures.
//!
//! # Components
//! - [`Bits`] - Fixed-width packed bit vector
//! - [`codeword`] - Attribute value → k-of-m codeword
//! - [`tsig`] - Tuple signatures, one per tuple
//! - [`psig`] - Page signatures, one per data page
//! - [`bsig`] - Bit-slices, the transposed page signatures
//!
//! Each index module exposes the signature builder used on insert and the
//! `find_pages_using_*` scan used by [`Query`](crate::query::Query).

mod bits;
pub mod bsig;
mod codeword;
pub mod psig;
pub mod tsig;

pub use bits::Bits;
pub use codeword::{codeword, superimpose};
