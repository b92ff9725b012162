//! Page - the fundamental 4KB unit of storage.
//!
//! A [`Page`] is a raw 4KB byte array that serves as the unit of I/O for
//! every relation file. After the [`PageHeader`] the page body is treated as
//! an array of fixed-size slots; the slot size depends on the file (tuple
//! record, tuple signature, page signature or bit-slice).

use crate::common::config::PAGE_SIZE;

use super::page_header::{PageHeader, PageType};

/// A page of data (4KB, 4KB-aligned).
///
/// Pages returned by reads are owned copies: callers mutate them and hand
/// them back to [`PagedFile::write_page`](crate::storage::PagedFile::write_page).
///
/// # Clone Implementation
/// `Page` does NOT implement `Clone` in production code (copying 4KB should
/// be explicit). A `#[cfg(test)]` Clone is provided for tests.
///
/// # Example
/// ```
/// use sigfile::storage::page::{Page, PageType};
///
/// let mut page = Page::with_type(PageType::TupleSig);
/// let slot = page.append_slot(&[0xAB, 0xCD]);
/// assert_eq!(slot, 0);
/// assert_eq!(page.item_count(), 1);
/// assert_eq!(page.slot(0, 2), &[0xAB, 0xCD]);
/// ```
#[repr(align(4096))]
pub struct Page {
    data: [u8; PAGE_SIZE],
}

impl Page {
    /// Bytes available for slots after the header.
    pub const BODY_SIZE: usize = PAGE_SIZE - PageHeader::SIZE;

    /// Create a new zeroed page.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    /// Create an empty page of the given type.
    pub fn with_type(page_type: PageType) -> Self {
        let mut page = Self::new();
        page.set_header(&PageHeader::new(page_type));
        page
    }

    /// Number of `item_size`-byte slots that fit in one page.
    #[inline]
    pub const fn capacity(item_size: usize) -> usize {
        Self::BODY_SIZE / item_size
    }

    /// Get immutable slice of page data.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get mutable slice of page data.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Read the page header.
    pub fn header(&self) -> PageHeader {
        PageHeader::from_bytes(&self.data)
    }

    /// Write a page header.
    pub fn set_header(&mut self, header: &PageHeader) {
        header.write_to(&mut self.data);
    }

    /// Page type from the header.
    #[inline]
    pub fn page_type(&self) -> PageType {
        PageType::from_u8(self.data[PageHeader::OFFSET_PAGE_TYPE])
    }

    /// Number of items currently stored on the page.
    pub fn item_count(&self) -> u32 {
        self.header().item_count
    }

    /// Overwrite the item count.
    pub fn set_item_count(&mut self, count: u32) {
        let offset = PageHeader::OFFSET_ITEM_COUNT;
        self.data[offset..offset + 4].copy_from_slice(&count.to_le_bytes());
    }

    /// Borrow slot `index` of an `item_size`-byte slot array.
    ///
    /// # Panics
    /// Panics if the slot lies outside the page.
    pub fn slot(&self, index: usize, item_size: usize) -> &[u8] {
        let start = Self::slot_offset(index, item_size);
        &self.data[start..start + item_size]
    }

    /// Mutably borrow slot `index` of an `item_size`-byte slot array.
    ///
    /// # Panics
    /// Panics if the slot lies outside the page.
    pub fn slot_mut(&mut self, index: usize, item_size: usize) -> &mut [u8] {
        let start = Self::slot_offset(index, item_size);
        &mut self.data[start..start + item_size]
    }

    /// Overwrite slot `index` in place. The item count is unchanged.
    ///
    /// # Panics
    /// Panics if the slot lies outside the page.
    pub fn put_slot(&mut self, index: usize, bytes: &[u8]) {
        let start = Self::slot_offset(index, bytes.len());
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
    }

    /// Write `bytes` into the next free slot and bump the item count.
    ///
    /// Returns the slot index used.
    pub fn append_slot(&mut self, bytes: &[u8]) -> usize {
        let index = self.item_count() as usize;
        self.put_slot(index, bytes);
        self.set_item_count(index as u32 + 1);
        index
    }

    /// True if another `item_size`-byte slot does not fit.
    pub fn is_full(&self, item_size: usize) -> bool {
        self.item_count() as usize >= Self::capacity(item_size)
    }

    /// Compute and store checksum in the header.
    ///
    /// Call this after all modifications to the page are complete.
    pub fn update_checksum(&mut self) {
        let checksum = PageHeader::compute_checksum(&self.data);
        let checksum_bytes = checksum.to_le_bytes();
        self.data[PageHeader::OFFSET_CHECKSUM..PageHeader::OFFSET_CHECKSUM + 4]
            .copy_from_slice(&checksum_bytes);
    }

    /// Verify the page checksum is valid.
    pub fn verify_checksum(&self) -> bool {
        self.header().verify_checksum(&self.data)
    }

    fn slot_offset(index: usize, item_size: usize) -> usize {
        assert!(
            (index + 1) * item_size <= Self::BODY_SIZE,
            "slot {} of size {} is outside the page",
            index,
            item_size
        );
        PageHeader::SIZE + index * item_size
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

// Clone only available in tests - forces explicit copying in production
#[cfg(test)]
impl Clone for Page {
    fn clone(&self) -> Self {
        let mut new_page = Page::new();
        new_page.data.copy_from_slice(&self.data);
        new_page
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_and_alignment() {
        assert_eq!(std::mem::size_of::<Page>(), PAGE_SIZE);
        assert_eq!(std::mem::align_of::<Page>(), 4096);
    }

    #[test]
    fn test_with_type() {
        let page = Page::with_type(PageType::BitSlice);
        assert_eq!(page.page_type(), PageType::BitSlice);
        assert_eq!(page.item_count(), 0);
    }

    #[test]
    fn test_capacity() {
        assert_eq!(Page::BODY_SIZE, 4087);
        assert_eq!(Page::capacity(3), 1362);
        assert_eq!(Page::capacity(4087), 1);
        assert_eq!(Page::capacity(4088), 0);
    }

    #[test]
    fn test_append_and_put_slot() {
        let mut page = Page::with_type(PageType::PageSig);
        assert_eq!(page.append_slot(&[1, 2, 3]), 0);
        assert_eq!(page.append_slot(&[4, 5, 6]), 1);
        assert_eq!(page.item_count(), 2);

        page.put_slot(0, &[9, 9, 9]);
        assert_eq!(page.item_count(), 2);
        assert_eq!(page.slot(0, 3), &[9, 9, 9]);
        assert_eq!(page.slot(1, 3), &[4, 5, 6]);
    }

    #[test]
    fn test_is_full() {
        let mut page = Page::with_type(PageType::BitSlice);
        let item = vec![0u8; 2000];
        assert!(!page.is_full(item.len()));
        page.append_slot(&item);
        page.append_slot(&item);
        assert!(page.is_full(item.len()));
    }

    #[test]
    #[should_panic(expected = "outside the page")]
    fn test_slot_out_of_bounds() {
        let page = Page::new();
        page.slot(Page::capacity(8), 8);
    }

    #[test]
    fn test_checksum_roundtrip() {
        let mut page = Page::with_type(PageType::Data);
        page.append_slot(b"hello");
        page.update_checksum();
        assert!(page.verify_checksum());

        page.as_mut_slice()[PageHeader::SIZE] ^= 0xFF;
        assert!(!page.verify_checksum());
    }

    #[test]
    fn test_page_clone_in_tests() {
        let mut page = Page::new();
        page.as_mut_slice()[0] = 0xAB;

        let cloned = page.clone();
        assert_eq!(cloned.as_slice()[0], 0xAB);
    }
}
