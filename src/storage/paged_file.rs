//! Paged file - fixed-size page I/O for one relation file.
//!
//! The [`PagedFile`] handles all direct file operations:
//! - Reading and writing pages (with checksum verification)
//! - Allocating new pages
//! - Read-modify-write updates of a single page

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::{Page, PageType};

/// Manages page I/O for a single relation file.
///
/// # File Layout
/// Pages are laid out sequentially:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// Every page in the file carries the same [`PageType`]; reads of a page
/// with a different type or a bad checksum fail.
///
/// # Durability
/// All writes are followed by `fsync()`, so after every completed write the
/// page contents are durable.
#[derive(Debug)]
pub struct PagedFile {
    file: File,
    page_type: PageType,
    /// Number of pages in the file.
    page_count: u32,
}

impl PagedFile {
    /// Create a new, empty paged file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P, page_type: PageType) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self {
            file,
            page_type,
            page_count: 0,
        })
    }

    /// Open an existing paged file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P, page_type: PageType) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        // Calculate page count from file size
        let file_size = file.metadata()?.len();
        let page_count = (file_size / PAGE_SIZE as u64) as u32;

        Ok(Self {
            file,
            page_type,
            page_count,
        })
    }

    /// Read a page from disk into an owned buffer.
    ///
    /// # Errors
    /// - `Error::PageNotFound` if the page doesn't exist
    /// - `Error::ChecksumMismatch` if the stored checksum is wrong
    /// - `Error::PageTypeMismatch` if the page belongs to another kind of file
    pub fn read_page(&self, page_id: PageId) -> Result<Page> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset))?;

        let mut page = Page::new();
        file.read_exact(page.as_mut_slice())?;

        if !page.verify_checksum() {
            return Err(Error::ChecksumMismatch(page_id.0));
        }
        if page.page_type() != self.page_type {
            return Err(Error::PageTypeMismatch {
                page: page_id.0,
                expected: self.page_type,
                found: page.page_type(),
            });
        }

        Ok(page)
    }

    /// Write a page to disk.
    ///
    /// The page must have been previously allocated with `allocate_page()`.
    /// The checksum is recomputed before writing.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page hasn't been allocated.
    pub fn write_page(&mut self, page_id: PageId, page: &mut Page) -> Result<()> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        page.update_checksum();
        self.write_at(page_id, page)
    }

    /// Read a page, let `f` modify it, and write it back.
    ///
    /// The page buffer is released when this returns, on success or failure.
    pub fn update_page<R>(&mut self, page_id: PageId, f: impl FnOnce(&mut Page) -> R) -> Result<R> {
        let mut page = self.read_page(page_id)?;
        let result = f(&mut page);
        self.write_page(page_id, &mut page)?;
        Ok(result)
    }

    /// Append one item to the last page, starting a new page when the last
    /// one already holds `per_page` items.
    ///
    /// Returns the page the item landed on and whether that page was newly
    /// allocated by this call.
    pub fn append_item(&mut self, bytes: &[u8], per_page: u32) -> Result<(PageId, bool)> {
        let last = self.last_page_id().ok_or(Error::PageNotFound(0))?;
        let mut page = self.read_page(last)?;

        if page.item_count() < per_page && !page.is_full(bytes.len()) {
            page.append_slot(bytes);
            self.write_page(last, &mut page)?;
            return Ok((last, false));
        }

        let page_id = self.allocate_page()?;
        let mut page = Page::with_type(self.page_type);
        page.append_slot(bytes);
        self.write_page(page_id, &mut page)?;
        Ok((page_id, true))
    }

    /// Allocate a new, empty page at the end of the file.
    ///
    /// Returns the `PageId` of the newly allocated page. The page is
    /// initialized with this file's page type and zero items.
    pub fn allocate_page(&mut self) -> Result<PageId> {
        let page_id = PageId::new(self.page_count);

        let mut page = Page::with_type(self.page_type);
        page.update_checksum();
        self.write_at(page_id, &page)?;

        self.page_count += 1;
        Ok(page_id)
    }

    /// Get the number of pages in the file.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Id of the last page, if any.
    #[inline]
    pub fn last_page_id(&self) -> Option<PageId> {
        self.page_count.checked_sub(1).map(PageId::new)
    }

    /// Get the page type stored in this file.
    #[inline]
    pub fn page_type(&self) -> PageType {
        self.page_type
    }

    fn write_at(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(page.as_slice())?;
        self.file.sync_data()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_new_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.tsig");

        let pf = PagedFile::create(&path, PageType::TupleSig).unwrap();
        assert_eq!(pf.page_count(), 0);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
        assert_eq!(pf.last_page_id(), None);
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.tsig");

        PagedFile::create(&path, PageType::TupleSig).unwrap();
        assert!(PagedFile::create(&path, PageType::TupleSig).is_err());
    }

    #[test]
    fn test_open_nonexistent_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nonexistent.data");

        assert!(PagedFile::open(&path, PageType::Data).is_err());
    }

    #[test]
    fn test_allocate_and_read_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.psig");

        let mut pf = PagedFile::create(&path, PageType::PageSig).unwrap();

        let page_id = pf.allocate_page().unwrap();
        assert_eq!(page_id, PageId::new(0));
        assert_eq!(pf.page_count(), 1);

        let page = pf.read_page(page_id).unwrap();
        assert_eq!(page.page_type(), PageType::PageSig);
        assert_eq!(page.item_count(), 0);
    }

    #[test]
    fn test_write_and_read_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.data");

        let mut pf = PagedFile::create(&path, PageType::Data).unwrap();
        let page_id = pf.allocate_page().unwrap();

        let mut page = pf.read_page(page_id).unwrap();
        page.append_slot(&[0xAB, 0xCD]);
        pf.write_page(page_id, &mut page).unwrap();

        let read_page = pf.read_page(page_id).unwrap();
        assert_eq!(read_page.item_count(), 1);
        assert_eq!(read_page.slot(0, 2), &[0xAB, 0xCD]);
    }

    #[test]
    fn test_update_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.bsig");

        let mut pf = PagedFile::create(&path, PageType::BitSlice).unwrap();
        let page_id = pf.allocate_page().unwrap();

        let slot = pf.update_page(page_id, |page| page.append_slot(&[7])).unwrap();
        assert_eq!(slot, 0);
        pf.update_page(page_id, |page| page.put_slot(0, &[8])).unwrap();

        let page = pf.read_page(page_id).unwrap();
        assert_eq!(page.item_count(), 1);
        assert_eq!(page.slot(0, 1), &[8]);
    }

    #[test]
    fn test_append_item_spills_to_new_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.tsig");

        let mut pf = PagedFile::create(&path, PageType::TupleSig).unwrap();
        pf.allocate_page().unwrap();

        assert_eq!(pf.append_item(&[1], 2).unwrap(), (PageId::new(0), false));
        assert_eq!(pf.append_item(&[2], 2).unwrap(), (PageId::new(0), false));
        assert_eq!(pf.append_item(&[3], 2).unwrap(), (PageId::new(1), true));
        assert_eq!(pf.page_count(), 2);

        let page = pf.read_page(PageId::new(1)).unwrap();
        assert_eq!(page.item_count(), 1);
        assert_eq!(page.slot(0, 1), &[3]);
    }

    #[test]
    fn test_append_item_respects_page_capacity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.bsig");

        let mut pf = PagedFile::create(&path, PageType::BitSlice).unwrap();
        pf.allocate_page().unwrap();

        // two 2000-byte items fill a page even though 10 are allowed
        let item = [7u8; 2000];
        assert_eq!(pf.append_item(&item, 10).unwrap(), (PageId::new(0), false));
        assert_eq!(pf.append_item(&item, 10).unwrap(), (PageId::new(0), false));
        assert_eq!(pf.append_item(&item, 10).unwrap(), (PageId::new(1), true));
    }

    #[test]
    fn test_append_item_without_pages_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.tsig");

        let mut pf = PagedFile::create(&path, PageType::TupleSig).unwrap();
        assert!(pf.append_item(&[1], 2).is_err());
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.data");

        {
            let mut pf = PagedFile::create(&path, PageType::Data).unwrap();
            let page_id = pf.allocate_page().unwrap();
            pf.update_page(page_id, |page| page.append_slot(&[0x42])).unwrap();
        }

        {
            let pf = PagedFile::open(&path, PageType::Data).unwrap();
            assert_eq!(pf.page_count(), 1);

            let page = pf.read_page(PageId::new(0)).unwrap();
            assert_eq!(page.slot(0, 1), &[0x42]);
        }
    }

    #[test]
    fn test_read_invalid_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.data");

        let mut pf = PagedFile::create(&path, PageType::Data).unwrap();
        pf.allocate_page().unwrap();

        assert!(matches!(
            pf.read_page(PageId::new(1)),
            Err(Error::PageNotFound(1))
        ));
    }

    #[test]
    fn test_write_invalid_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.data");

        let mut pf = PagedFile::create(&path, PageType::Data).unwrap();

        let mut page = Page::with_type(PageType::Data);
        assert!(pf.write_page(PageId::new(0), &mut page).is_err());
    }

    #[test]
    fn test_corrupted_page_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.data");

        {
            let mut pf = PagedFile::create(&path, PageType::Data).unwrap();
            pf.allocate_page().unwrap();
        }

        // Flip a byte in the page body behind the file's back
        {
            let mut file = OpenOptions::new().write(true).open(&path).unwrap();
            file.seek(SeekFrom::Start(100)).unwrap();
            file.write_all(&[0xFF]).unwrap();
        }

        let pf = PagedFile::open(&path, PageType::Data).unwrap();
        assert!(matches!(
            pf.read_page(PageId::new(0)),
            Err(Error::ChecksumMismatch(0))
        ));
    }

    #[test]
    fn test_page_type_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.psig");

        {
            let mut pf = PagedFile::create(&path, PageType::PageSig).unwrap();
            pf.allocate_page().unwrap();
        }

        let pf = PagedFile::open(&path, PageType::TupleSig).unwrap();
        assert!(matches!(
            pf.read_page(PageId::new(0)),
            Err(Error::PageTypeMismatch { .. })
        ));
    }
}
