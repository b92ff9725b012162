//! Query evaluation against the signature indexes.
//!
//! A [`Query`] pairs a relation with a partially specified tuple and runs
//! exactly one [`ScanStrategy`] to produce a candidate page set. The set is
//! conservative: every page holding a matching tuple is included, and pages
//! without one may be included too. Exact verification against the data
//! file is the caller's job.

mod cost;

use std::fmt;
use std::str::FromStr;

use tracing::trace;

use crate::common::{Error, PageId, Result};
use crate::relation::{Relation, Tuple};
use crate::signature::{bsig, psig, tsig, Bits};

pub use cost::ScanCost;

/// Which stored signatures a query is answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanStrategy {
    /// Scan every tuple signature (`t`).
    TupleSignatures,
    /// Scan every page signature (`p`).
    PageSignatures,
    /// AND the bit-slices selected by the query signature (`b`).
    BitSlices,
}

impl ScanStrategy {
    /// All strategies, in file order.
    pub const ALL: [ScanStrategy; 3] = [
        ScanStrategy::TupleSignatures,
        ScanStrategy::PageSignatures,
        ScanStrategy::BitSlices,
    ];
}

impl FromStr for ScanStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "t" | "tuple" => Ok(ScanStrategy::TupleSignatures),
            "p" | "page" => Ok(ScanStrategy::PageSignatures),
            "b" | "bit" => Ok(ScanStrategy::BitSlices),
            other => Err(Error::InvalidConfig(format!(
                "unknown scan strategy {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for ScanStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanStrategy::TupleSignatures => "tuple signatures",
            ScanStrategy::PageSignatures => "page signatures",
            ScanStrategy::BitSlices => "bit-slices",
        };
        f.write_str(name)
    }
}

/// A partial-match query over one relation.
///
/// # Example
/// ```no_run
/// use sigfile::{Query, Relation, ScanStrategy, Tuple};
///
/// let relation = Relation::open("data/people")?;
/// let mut query = Query::new(&relation, "abc,?".parse().unwrap());
/// query.evaluate(ScanStrategy::BitSlices)?;
/// for page in query.candidate_pages() {
///     // verify tuples on `page` exactly
/// }
/// println!("{}", query.cost());
/// # Ok::<(), sigfile::Error>(())
/// ```
pub struct Query<'r> {
    pub(crate) relation: &'r Relation,
    pub(crate) tuple: Tuple,
    /// Candidate data pages, one bit per page id.
    pub(crate) pages: Bits,
    pub(crate) cost: ScanCost,
}

impl<'r> Query<'r> {
    /// Create a query. Unconstrained attributes hold the wildcard `?`.
    ///
    /// # Panics
    /// Panics if the tuple's attribute count differs from the relation's.
    pub fn new(relation: &'r Relation, tuple: Tuple) -> Self {
        assert_eq!(
            tuple.nattrs(),
            relation.params().nattrs as usize,
            "query has {} attributes, relation has {}",
            tuple.nattrs(),
            relation.params().nattrs
        );
        let pages = Bits::new(relation.params().bsig_bits as usize);
        Self {
            relation,
            tuple,
            pages,
            cost: ScanCost::new(),
        }
    }

    /// Compute the candidate page set with `strategy`.
    ///
    /// The page set and cost counters are reset first, so a query can be
    /// evaluated repeatedly with different strategies.
    pub fn evaluate(&mut self, strategy: ScanStrategy) -> Result<()> {
        self.pages.clear_all();
        self.cost.reset();

        match strategy {
            ScanStrategy::TupleSignatures => tsig::find_pages_using_tuple_sigs(self)?,
            ScanStrategy::PageSignatures => psig::find_pages_using_page_sigs(self)?,
            ScanStrategy::BitSlices => bsig::find_pages_using_bit_slices(self)?,
        }

        trace!(
            %strategy,
            query = %self.tuple,
            candidates = self.pages.count_ones(),
            sigs = self.cost.sigs,
            sig_pages = self.cost.sig_pages,
            sigs_per_page = self.cost.sigs_per_page(),
            "query evaluated"
        );
        Ok(())
    }

    /// The query tuple.
    pub fn tuple(&self) -> &Tuple {
        &self.tuple
    }

    /// Candidate pages as a bit set indexed by page id.
    pub fn pages(&self) -> &Bits {
        &self.pages
    }

    /// Candidate page ids, ascending.
    pub fn candidate_pages(&self) -> Vec<PageId> {
        self.pages
            .iter_ones()
            .map(|page| PageId::new(page as u32))
            .collect()
    }

    /// Counters of the last evaluation.
    pub fn cost(&self) -> ScanCost {
        self.cost
    }
}
