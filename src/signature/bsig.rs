//! Bit-sliced page signatures (`.bsig`).
//!
//! The page signature matrix transposed: one slice per page signature bit
//! position, each `bsig_bits` wide and indexed by data page id. Slice `i`
//! has bit `p` set iff the page signature of data page `p` has bit `i` set.
//!
//! ```text
//!            page 0  page 1  page 2 ...
//! slice 0      1       0       1
//! slice 1      0       0       1
//! ...
//! ```
//!
//! Slice `i` is stored at slot `i % bsigs_per_page` of page
//! `i / bsigs_per_page`.

use tracing::trace;

use crate::common::{PageId, Result};
use crate::query::Query;
use crate::relation::RelationParameters;
use crate::storage::page::Page;
use crate::storage::PagedFile;

use super::psig::{locate, make_page_signature};
use super::Bits;

/// Fill a fresh bit-slice file with `psig_bits` all-zero slices.
pub(crate) fn initialize_slices(file: &mut PagedFile, params: &mut RelationParameters) -> Result<()> {
    let zero = Bits::new(params.bsig_bits as usize);
    for _ in 0..params.psig_bits {
        let (_, new_page) = file.append_item(zero.as_bytes(), params.bsigs_per_page)?;
        if new_page {
            params.bsig_npages += 1;
        }
        params.nbsigs += 1;
    }
    Ok(())
}

/// Record `data_page` in every slice whose bit is set in `psig`.
///
/// Only the slices for set bits are touched; bits of other slices keep
/// whatever they held, which is correct because page signature bits are
/// never cleared. Slices sharing a page are updated with one read and one
/// write. Returns the number of slices updated.
pub(crate) fn set_page_in_slices(
    file: &mut PagedFile,
    params: &RelationParameters,
    data_page: PageId,
    psig: &Bits,
) -> Result<usize> {
    let slot_size = params.bsig_bytes as usize;
    let nbits = params.bsig_bits as usize;

    let mut current: Option<(PageId, Page)> = None;
    let mut touched = 0;

    for bit in psig.iter_ones() {
        let (pid, slot) = locate(bit as u32, params.bsigs_per_page);

        if current.as_ref().map(|(id, _)| *id) != Some(pid) {
            if let Some((id, mut page)) = current.take() {
                file.write_page(id, &mut page)?;
            }
            current = Some((pid, file.read_page(pid)?));
        }

        if let Some((_, page)) = current.as_mut() {
            let stored = page.slot_mut(slot, slot_size);
            let mut slice = Bits::from_bytes(nbits, stored);
            slice.set(data_page.index());
            stored.copy_from_slice(slice.as_bytes());
            touched += 1;
        }
    }

    if let Some((id, mut page)) = current {
        file.write_page(id, &mut page)?;
    }
    Ok(touched)
}

/// Read slice `index`.
pub fn read_slice(file: &PagedFile, params: &RelationParameters, index: u32) -> Result<Bits> {
    let (pid, slot) = locate(index, params.bsigs_per_page);
    let page = file.read_page(pid)?;
    Ok(Bits::from_bytes(
        params.bsig_bits as usize,
        page.slot(slot, params.bsig_bytes as usize),
    ))
}

/// Mark every data page present in all slices selected by the query
/// signature.
///
/// Work is proportional to the number of bits set in the query signature:
/// a fully unconstrained query reads no slices and matches every page.
pub fn find_pages_using_bit_slices(query: &mut Query<'_>) -> Result<()> {
    let relation = query.relation;
    let params = relation.params();
    let file = relation.bsig_file();

    let qsig = make_page_signature(params, &query.tuple);
    let slot_size = params.bsig_bytes as usize;
    let nbits = params.bsig_bits as usize;

    let mut matches = Bits::new(nbits);
    matches.set_all();

    let mut current: Option<(PageId, Page)> = None;
    for bit in qsig.iter_ones() {
        let (pid, slot) = locate(bit as u32, params.bsigs_per_page);
        if current.as_ref().map(|(id, _)| *id) != Some(pid) {
            current = Some((pid, file.read_page(pid)?));
            query.cost.sig_pages += 1;
        }
        if let Some((_, page)) = current.as_ref() {
            matches.and_assign(&Bits::from_bytes(nbits, page.slot(slot, slot_size)));
            query.cost.sigs += 1;
        }
    }

    trace!(
        slices = query.cost.sigs,
        qsig_bits = qsig.count_ones(),
        "bit-slice scan"
    );

    // Only pages that have a page signature can be candidates
    for page in 0..params.npsigs as usize {
        if matches.is_set(page) {
            query.pages.set(page);
        }
    }
    Ok(())
}
