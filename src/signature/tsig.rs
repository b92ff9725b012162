//! Tuple signatures (`.tsig`).
//!
//! One signature per tuple, stored in insertion order, so signature `i`
//! describes tuple `i`.

use crate::common::{PageId, Result};
use crate::query::Query;
use crate::relation::{RelationParameters, Tuple};
use crate::storage::PagedFile;

use super::{superimpose, Bits};

/// Tuple signature of `tuple`: the OR of its attribute codewords at the
/// tuple signature width.
pub fn make_tuple_signature(params: &RelationParameters, tuple: &Tuple) -> Bits {
    superimpose(tuple, params.tsig_bits as usize, params.code_bits as usize)
}

/// Append `sig` to the tuple signature file.
pub(crate) fn append_tuple_signature(
    file: &mut PagedFile,
    params: &mut RelationParameters,
    sig: &Bits,
) -> Result<()> {
    let (_, new_page) = file.append_item(sig.as_bytes(), params.tsigs_per_page)?;
    if new_page {
        params.tsig_npages += 1;
    }
    params.ntsigs += 1;
    Ok(())
}

/// Mark every data page holding a tuple whose signature contains the query
/// signature.
pub fn find_pages_using_tuple_sigs(query: &mut Query<'_>) -> Result<()> {
    let relation = query.relation;
    let params = relation.params();
    let file = relation.tsig_file();

    let qsig = make_tuple_signature(params, &query.tuple);
    let slot_size = params.tsig_bytes as usize;

    let mut tuple_index = 0u32;
    for pid in 0..file.page_count() {
        let page = file.read_page(PageId::new(pid))?;
        for slot in 0..page.item_count() as usize {
            let tsig = Bits::from_bytes(params.tsig_bits as usize, page.slot(slot, slot_size));
            if qsig.is_subset_of(&tsig) {
                query.pages.set(params.page_of_tuple(tuple_index) as usize);
            }
            tuple_index += 1;
            query.cost.sigs += 1;
        }
        query.cost.sig_pages += 1;
    }
    Ok(())
}
