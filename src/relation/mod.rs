//! Relations: tuples, parameters and the five-file store.
//!
//! - [`Relation`] - An open relation and its insert path
//! - [`RelationParameters`] - Layout and counters, persisted in `.info`
//! - [`Tuple`] - Attribute values and their record encoding

mod params;
#[allow(clippy::module_inception)]
mod relation;
mod tuple;

pub use params::RelationParameters;
pub use relation::Relation;
pub use tuple::Tuple;
