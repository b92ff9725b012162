//! Relation - the five relation files and the single write path.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::common::config::{
    RelationConfig, BSIG_SUFFIX, DATA_SUFFIX, INFO_SUFFIX, PSIG_SUFFIX, TSIG_SUFFIX,
};
use crate::common::{Error, PageId, Result};
use crate::signature::{bsig, psig, tsig, Bits};
use crate::storage::page::PageType;
use crate::storage::PagedFile;

use super::{RelationParameters, Tuple};

/// An open relation.
///
/// # Files
/// A relation named `<name>` lives in five files:
/// ```text
/// <name>.info   parameter block (rewritten at close)
/// <name>.data   tuple records
/// <name>.tsig   tuple signatures
/// <name>.psig   page signatures
/// <name>.bsig   bit-slices
/// ```
///
/// Every page write is durable as soon as it completes. The parameter block
/// is the exception: it is written by [`create`](Self::create) and
/// [`close`](Self::close) only, so a relation must be closed to keep the
/// counters of a session.
///
/// # Thread Safety
/// `Relation` is single-threaded; queries borrow it shared, inserts borrow it
/// exclusively.
///
/// # Example
/// ```no_run
/// use sigfile::{Relation, RelationConfig, Tuple};
///
/// let config = RelationConfig::new(2, 0.01, 3, 30, 20, 64);
/// let mut relation = Relation::create("people", config)?;
/// let page = relation.insert(&Tuple::from_values(&["abc", "xyz"]))?;
/// relation.close()?;
/// # Ok::<(), sigfile::Error>(())
/// ```
pub struct Relation {
    path: PathBuf,
    info: File,
    data: PagedFile,
    tsig: PagedFile,
    psig: PagedFile,
    bsig: PagedFile,
    params: RelationParameters,
    closed: bool,
}

/// `<base>.<suffix>`, keeping any dots already in `base`.
fn file_path(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Overwrite the `.info` file with `params`.
fn write_param_block(info: &mut File, params: &RelationParameters) -> Result<()> {
    info.seek(SeekFrom::Start(0))?;
    info.write_all(&params.to_bytes())?;
    info.sync_data()?;
    Ok(())
}

impl Relation {
    /// Create a new relation and return it open.
    ///
    /// The layout is derived and validated before any file is touched. If
    /// creating or initializing any file fails, the files created so far are
    /// removed again.
    ///
    /// # Errors
    /// - `Error::InvalidConfig` / `Error::InvalidLayout` for bad parameters
    /// - `Error::RelationExists` if the `.info` file already exists
    /// - I/O errors from file creation
    pub fn create<P: AsRef<Path>>(path: P, config: RelationConfig) -> Result<Self> {
        let path = path.as_ref();
        let params = RelationParameters::from_config(&config)?;

        if Self::exists(path) {
            return Err(Error::RelationExists(file_path(path, INFO_SUFFIX)));
        }

        let mut created = Vec::new();
        match Self::create_files(path, params, &mut created) {
            Ok(relation) => {
                debug!(
                    path = %path.display(),
                    nattrs = params.nattrs,
                    tsig_bits = params.tsig_bits,
                    psig_bits = params.psig_bits,
                    bsig_bits = params.bsig_bits,
                    "created relation"
                );
                Ok(relation)
            }
            Err(err) => {
                for file in &created {
                    let _ = fs::remove_file(file);
                }
                Err(err)
            }
        }
    }

    fn create_files(
        path: &Path,
        mut params: RelationParameters,
        created: &mut Vec<PathBuf>,
    ) -> Result<Self> {
        let info_path = file_path(path, INFO_SUFFIX);
        let mut info = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&info_path)?;
        created.push(info_path);

        let mut create_paged = |suffix: &str, page_type: PageType| -> Result<PagedFile> {
            let file_path = file_path(path, suffix);
            let file = PagedFile::create(&file_path, page_type)?;
            created.push(file_path);
            Ok(file)
        };
        let mut data = create_paged(DATA_SUFFIX, PageType::Data)?;
        let mut tsig = create_paged(TSIG_SUFFIX, PageType::TupleSig)?;
        let mut psig = create_paged(PSIG_SUFFIX, PageType::PageSig)?;
        let mut bsig = create_paged(BSIG_SUFFIX, PageType::BitSlice)?;

        data.allocate_page()?;
        params.npages = 1;
        tsig.allocate_page()?;
        params.tsig_npages = 1;
        psig.allocate_page()?;
        params.psig_npages = 1;
        bsig.allocate_page()?;
        params.bsig_npages = 1;
        bsig::initialize_slices(&mut bsig, &mut params)?;

        // Written before the handle exists, so a failure here never reaches
        // the drop warning.
        write_param_block(&mut info, &params)?;

        Ok(Self {
            path: path.to_path_buf(),
            info,
            data,
            tsig,
            psig,
            bsig,
            params,
            closed: false,
        })
    }

    /// Check whether a relation exists (its `.info` file is present).
    pub fn exists<P: AsRef<Path>>(path: P) -> bool {
        file_path(path.as_ref(), INFO_SUFFIX).exists()
    }

    /// Open an existing relation, loading its parameter block.
    ///
    /// # Errors
    /// - I/O errors if any of the five files is missing
    /// - `Error::CorruptParameters` if the `.info` block is unreadable
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let mut info = OpenOptions::new()
            .read(true)
            .write(true)
            .open(file_path(path, INFO_SUFFIX))?;
        let mut buf = Vec::with_capacity(RelationParameters::ENCODED_SIZE);
        info.read_to_end(&mut buf)?;
        let params = RelationParameters::from_bytes(&buf)?;

        let data = PagedFile::open(file_path(path, DATA_SUFFIX), PageType::Data)?;
        let tsig = PagedFile::open(file_path(path, TSIG_SUFFIX), PageType::TupleSig)?;
        let psig = PagedFile::open(file_path(path, PSIG_SUFFIX), PageType::PageSig)?;
        let bsig = PagedFile::open(file_path(path, BSIG_SUFFIX), PageType::BitSlice)?;

        if data.page_count() != params.npages || psig.page_count() != params.psig_npages {
            warn!(
                path = %path.display(),
                data_pages = data.page_count(),
                expected = params.npages,
                "relation files disagree with parameter block; was it closed?"
            );
        }

        debug!(path = %path.display(), ntuples = params.ntuples, "opened relation");

        Ok(Self {
            path: path.to_path_buf(),
            info,
            data,
            tsig,
            psig,
            bsig,
            params,
            closed: false,
        })
    }

    /// Persist the parameter block and close all five files.
    pub fn close(mut self) -> Result<()> {
        self.write_params()?;
        self.closed = true;
        debug!(path = %self.path.display(), ntuples = self.params.ntuples, "closed relation");
        Ok(())
    }

    fn write_params(&mut self) -> Result<()> {
        write_param_block(&mut self.info, &self.params)
    }

    /// Insert a tuple, returning the data page it was stored on.
    ///
    /// Steps, in order:
    /// 1. append the record to the data file, starting a new page if the
    ///    last one is full
    /// 2. append the tuple signature
    /// 3. OR the tuple into its page signature, or append a new page
    ///    signature for a new data page
    /// 4. set the data page's bit in every slice selected by the updated
    ///    page signature
    ///
    /// # Record size
    /// The relation's tuple size (`16 * nattrs - 1` bytes, room for
    /// [`MAX_ATTR_BYTES`](crate::common::config::MAX_ATTR_BYTES) per value
    /// plus separators) is an upper bound, not an exact length. Records are
    /// stored with a length prefix, so any record up to the tuple size is
    /// accepted and shorter ones are zero padded in their slot.
    ///
    /// # Errors
    /// - `Error::BitSliceCapacityExceeded` if a new data page would not fit
    ///   in the bit-slices; nothing is written in that case
    /// - I/O and allocation errors. Files updated by earlier steps of the
    ///   same call are not rolled back.
    ///
    /// # Panics
    /// Panics if the tuple has the wrong number of attributes or its record
    /// is longer than the relation's tuple size.
    pub fn insert(&mut self, tuple: &Tuple) -> Result<PageId> {
        assert_eq!(
            tuple.nattrs(),
            self.params.nattrs as usize,
            "tuple has {} attributes, relation has {}",
            tuple.nattrs(),
            self.params.nattrs
        );
        assert!(
            tuple.len() <= self.params.tuple_size as usize,
            "tuple record of {} bytes exceeds tuple size {}",
            tuple.len(),
            self.params.tuple_size
        );

        if self.params.next_insert_starts_page() && self.params.npages >= self.params.bsig_bits {
            return Err(Error::BitSliceCapacityExceeded {
                page: self.params.npages,
                capacity: self.params.bsig_bits,
            });
        }

        // (a) data file
        let record = tuple.encode_record(self.params.record_slot_size());
        let (page_id, new_page) = self.data.append_item(&record, self.params.tuples_per_page)?;
        if new_page {
            self.params.npages += 1;
            debug!(page = %page_id, "started data page");
        }
        self.params.ntuples += 1;

        // (b) tuple signature
        let tsig = tsig::make_tuple_signature(&self.params, tuple);
        tsig::append_tuple_signature(&mut self.tsig, &mut self.params, &tsig)?;

        // (c) page signature
        let sig = psig::make_page_signature(&self.params, tuple);
        let page_sig =
            psig::update_page_signature(&mut self.psig, &mut self.params, page_id, new_page, &sig)?;

        // (d) bit-slices
        bsig::set_page_in_slices(&mut self.bsig, &self.params, page_id, &page_sig)?;

        Ok(page_id)
    }

    /// Tuples stored on data page `page_id`, in insertion order.
    pub fn page_tuples(&self, page_id: PageId) -> Result<Vec<Tuple>> {
        let page = self.data.read_page(page_id)?;
        let slot_size = self.params.record_slot_size();
        (0..page.item_count() as usize)
            .map(|slot| Tuple::decode_record(page.slot(slot, slot_size)))
            .collect()
    }

    /// Snapshot of the relation's parameters and counters.
    pub fn stats(&self) -> RelationParameters {
        self.params
    }

    /// Base path of the relation files.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of attributes per tuple.
    pub fn nattrs(&self) -> u32 {
        self.params.nattrs
    }

    /// Number of tuples stored.
    pub fn ntuples(&self) -> u32 {
        self.params.ntuples
    }

    /// Number of data pages.
    pub fn npages(&self) -> u32 {
        self.params.npages
    }

    /// Stored page signature of data page `page_id`.
    pub fn page_signature(&self, page_id: PageId) -> Result<Bits> {
        if page_id.0 >= self.params.npsigs {
            return Err(Error::PageNotFound(page_id.0));
        }
        psig::read_page_signature(&self.psig, &self.params, page_id)
    }

    /// Bit-slice `index`: bit `p` is set when page signature `p` has bit
    /// `index` set.
    pub fn bit_slice(&self, index: u32) -> Result<Bits> {
        if index >= self.params.nbsigs {
            return Err(Error::PageNotFound(index));
        }
        bsig::read_slice(&self.bsig, &self.params, index)
    }

    pub(crate) fn params(&self) -> &RelationParameters {
        &self.params
    }

    pub(crate) fn tsig_file(&self) -> &PagedFile {
        &self.tsig
    }

    pub(crate) fn psig_file(&self) -> &PagedFile {
        &self.psig
    }

    pub(crate) fn bsig_file(&self) -> &PagedFile {
        &self.bsig
    }
}

impl Drop for Relation {
    fn drop(&mut self) {
        if !self.closed {
            warn!(
                path = %self.path.display(),
                "relation dropped without close; parameter block not updated"
            );
        }
    }
}
