//! Page signatures (`.psig`).
//!
//! One signature per data page, equal to the OR of the page-width
//! signatures of the tuples on that page. Entry `i` describes data page `i`.

use crate::common::{PageId, Result};
use crate::query::Query;
use crate::relation::{RelationParameters, Tuple};
use crate::storage::PagedFile;

use super::{superimpose, Bits};

/// Page-width signature of a single tuple.
pub fn make_page_signature(params: &RelationParameters, tuple: &Tuple) -> Bits {
    superimpose(tuple, params.psig_bits as usize, params.code_bits as usize)
}

/// Locate entry `index` of an array packed `per_page` to a page.
#[inline]
pub(crate) fn locate(index: u32, per_page: u32) -> (PageId, usize) {
    (PageId::new(index / per_page), (index % per_page) as usize)
}

/// Fold the page-width signature of a newly inserted tuple into the page
/// signature of `data_page`.
///
/// A tuple that started a new data page gets a fresh entry appended; a
/// tuple that landed on the page of the last entry is ORed into that entry
/// in place. Returns the page signature as stored after the update.
///
/// Stored bits are only ever ORed in, never cleared. The bit-slices rely on
/// this: they are maintained by setting bits only.
pub(crate) fn update_page_signature(
    file: &mut PagedFile,
    params: &mut RelationParameters,
    data_page: PageId,
    starts_page: bool,
    sig: &Bits,
) -> Result<Bits> {
    if starts_page || params.npsigs == 0 {
        let (_, new_page) = file.append_item(sig.as_bytes(), params.psigs_per_page)?;
        if new_page {
            params.psig_npages += 1;
        }
        params.npsigs += 1;
        debug_assert_eq!(params.npsigs, data_page.0 + 1);
        return Ok(sig.clone());
    }

    let index = params.npsigs - 1;
    debug_assert_eq!(index, data_page.0);
    overwrite_page_signature(file, params, index, sig)
}

/// OR `sig` into stored entry `index`, overwriting the slot in place.
fn overwrite_page_signature(
    file: &mut PagedFile,
    params: &RelationParameters,
    index: u32,
    sig: &Bits,
) -> Result<Bits> {
    let (pid, slot) = locate(index, params.psigs_per_page);
    let slot_size = params.psig_bytes as usize;
    let nbits = params.psig_bits as usize;

    file.update_page(pid, |page| {
        let stored = page.slot_mut(slot, slot_size);
        let mut psig = Bits::from_bytes(nbits, stored);
        psig.or_assign(sig);
        stored.copy_from_slice(psig.as_bytes());
        psig
    })
}

/// Read the stored page signature of data page `data_page`.
pub fn read_page_signature(
    file: &PagedFile,
    params: &RelationParameters,
    data_page: PageId,
) -> Result<Bits> {
    let (pid, slot) = locate(data_page.0, params.psigs_per_page);
    let page = file.read_page(pid)?;
    Ok(Bits::from_bytes(
        params.psig_bits as usize,
        page.slot(slot, params.psig_bytes as usize),
    ))
}

/// Mark every data page whose page signature contains the query signature.
pub fn find_pages_using_page_sigs(query: &mut Query<'_>) -> Result<()> {
    let relation = query.relation;
    let params = relation.params();
    let file = relation.psig_file();

    let qsig = make_page_signature(params, &query.tuple);
    let slot_size = params.psig_bytes as usize;

    for pid in 0..file.page_count() {
        let page = file.read_page(PageId::new(pid))?;
        for slot in 0..page.item_count() {
            let psig = Bits::from_bytes(params.psig_bits as usize, page.slot(slot as usize, slot_size));
            if qsig.is_subset_of(&psig) {
                let data_page = pid * params.psigs_per_page + slot;
                query.pages.set(data_page as usize);
            }
            query.cost.sigs += 1;
        }
        query.cost.sig_pages += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate() {
        assert_eq!(locate(0, 10), (PageId::new(0), 0));
        assert_eq!(locate(9, 10), (PageId::new(0), 9));
        assert_eq!(locate(10, 10), (PageId::new(1), 0));
        assert_eq!(locate(25, 10), (PageId::new(2), 5));
    }
}
