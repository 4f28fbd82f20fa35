//! reln — C7: a relation, the engine's top-level handle. Owns the
//! three on-disk files (`.info`, `.data`, `.ovflow`), the in-memory
//! global counters (`depth`, `sp`, `npages`, `ntups`), and the bucket
//! addressing, insertion and split protocol that make linear hashing
//! work.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::bits::get_lower;
use crate::chvec::ChoiceVector;
use crate::config::MalhConfig;
use crate::consts::{DATA_EXT, INFO_EXT, NO_PAGE, OVFLOW_EXT, PAGESIZE, PAGE_HDR_SIZE};
use crate::error::{MalhError, Result};
use crate::meta::{read_meta, write_meta_new, write_meta_overwrite, RelnMeta};
use crate::page::Page;
use crate::pager::PageFile;
use crate::tuple::tuple_hash;

fn path_with_ext(base: &Path, ext: &str) -> PathBuf {
    let mut s = base.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

fn display_name(base: &Path) -> String {
    base.display().to_string()
}

/// Number of inserts between mandatory splits:
/// `C = floor(1024 / (10 * nattrs))`. A relation whose `nattrs` drives
/// this to zero would split on every insert forever, so
/// `Relation::create` rejects such schemas up front rather than
/// guessing a fallback threshold.
fn split_threshold(nattrs: u32) -> u32 {
    1024 / (10 * nattrs.max(1))
}

/// An open multi-attribute linear-hashed relation.
pub struct Relation {
    info_file: File,
    data: PageFile,
    ovflow: PageFile,
    nattrs: u32,
    depth: u32,
    sp: u32,
    npages: u32,
    ntups: u32,
    cv: ChoiceVector,
    writable: bool,
    closed: bool,
    config: MalhConfig,
}

impl Relation {
    /// Create a fresh relation on disk: a `.info` file with the given
    /// schema and an empty counters block, `npages` empty primary
    /// pages in `.data`, and an empty `.ovflow` file. Does not return an
    /// open handle — callers `open()` it afterwards.
    pub fn create(
        base: &Path,
        nattrs: u32,
        npages: u32,
        depth: u32,
        cv_descriptor: &str,
        config: &MalhConfig,
    ) -> Result<()> {
        if nattrs == 0 {
            return Err(MalhError::InvalidConfiguration {
                reason: "nattrs must be greater than 0".to_string(),
            });
        }
        if split_threshold(nattrs) == 0 {
            return Err(MalhError::InvalidConfiguration {
                reason: format!(
                    "nattrs {} is unsupported: the split threshold floor(1024/(10*nattrs)) \
                     would be 0, splitting on every insert forever (require nattrs <= 25)",
                    nattrs
                ),
            });
        }
        if npages == 0 || (npages as u64) > (1u64 << depth.min(32)) {
            return Err(MalhError::InvalidConfiguration {
                reason: format!(
                    "npages {} is inconsistent with depth {} (expected 1..=2^depth)",
                    npages, depth
                ),
            });
        }

        let info_path = path_with_ext(base, INFO_EXT);
        if info_path.exists() {
            return Err(MalhError::RelationExists {
                name: display_name(base),
            });
        }

        let cv = ChoiceVector::parse(cv_descriptor, nattrs)?;
        let meta = RelnMeta {
            nattrs,
            depth,
            sp: 0,
            npages,
            ntups: 0,
            cv,
        };
        write_meta_new(&info_path, &meta)?;

        let mut data = PageFile::create(&path_with_ext(base, DATA_EXT))?;
        for _ in 0..npages {
            data.add_page()?;
        }
        data.sync()?;

        let ovflow = PageFile::create(&path_with_ext(base, OVFLOW_EXT))?;
        ovflow.sync()?;

        let _ = config;
        Ok(())
    }

    /// Open an existing relation. `writable` controls both whether
    /// inserts/splits are permitted and whether `close` writes the
    /// counters back; attempting to write through a read-only handle
    /// fails naturally at the OS level, since the underlying files are
    /// opened without write permission.
    pub fn open(base: &Path, writable: bool, config: MalhConfig) -> Result<Relation> {
        let info_path = path_with_ext(base, INFO_EXT);
        if !info_path.exists() {
            return Err(MalhError::RelationMissing {
                name: display_name(base),
            });
        }

        let mut info_file = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(&info_path)?;
        let meta = read_meta(&mut info_file)?;

        let data = PageFile::open(&path_with_ext(base, DATA_EXT), writable)?;
        let ovflow = PageFile::open(&path_with_ext(base, OVFLOW_EXT), writable)?;

        Ok(Relation {
            info_file,
            data,
            ovflow,
            nattrs: meta.nattrs,
            depth: meta.depth,
            sp: meta.sp,
            npages: meta.npages,
            ntups: meta.ntups,
            cv: meta.cv,
            writable,
            closed: false,
            config,
        })
    }

    /// Write the counters back to `.info` (if opened writable) and
    /// fsync all three files if the config asks for it.
    pub fn close(mut self) -> Result<()> {
        self.flush()?;
        self.closed = true;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.writable {
            let meta = RelnMeta {
                nattrs: self.nattrs,
                depth: self.depth,
                sp: self.sp,
                npages: self.npages,
                ntups: self.ntups,
                cv: self.cv.clone(),
            };
            write_meta_overwrite(&mut self.info_file, &meta)?;
            if self.config.fsync_on_close {
                self.info_file.sync_all()?;
                self.data.sync()?;
                self.ovflow.sync()?;
            }
        }
        Ok(())
    }

    pub fn nattrs(&self) -> u32 {
        self.nattrs
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn sp(&self) -> u32 {
        self.sp
    }

    pub fn npages(&self) -> u32 {
        self.npages
    }

    pub fn ntups(&self) -> u32 {
        self.ntups
    }

    pub fn cv(&self) -> &ChoiceVector {
        &self.cv
    }

    pub fn data_page(&mut self, id: u32) -> Result<Page> {
        self.data.get_page(id)
    }

    pub fn ovflow_page(&mut self, id: u32) -> Result<Page> {
        self.ovflow.get_page(id)
    }

    /// Bucket addressing rule: take the low `depth` bits of `h`; if
    /// that address has already split (is below `sp`), take the low
    /// `depth + 1` bits instead.
    pub fn bucket_for_hash(&self, h: u32) -> u32 {
        if self.depth == 0 {
            return 0;
        }
        let p = get_lower(h, self.depth);
        if p < self.sp {
            get_lower(h, self.depth + 1)
        } else {
            p
        }
    }

    /// Insert a tuple, splitting a bucket afterwards if the trigger
    /// count is reached. Returns the bucket the tuple was routed to.
    pub fn insert(&mut self, tuple: &str) -> Result<u32> {
        if tuple.len() + 1 > self.config.max_tuple_len {
            return Err(MalhError::OversizedTuple {
                len: tuple.len() + 1,
                max: self.config.max_tuple_len,
            });
        }

        let h = tuple_hash(tuple, &self.cv, self.nattrs as usize)?;
        let bucket = self.bucket_for_hash(h);
        self.insert_into_chain(bucket, tuple)?;
        self.ntups += 1;

        let c = split_threshold(self.nattrs);
        if self.ntups % c == 0 {
            self.split()?;
        }
        Ok(bucket)
    }

    /// Insert `tuple` into the page chain rooted at `bucket`'s primary
    /// page: try the primary, then walk the overflow chain, then
    /// allocate a fresh overflow page and link it onto the tail.
    fn insert_into_chain(&mut self, bucket: u32, tuple: &str) -> Result<()> {
        let mut primary = self.data.get_page(bucket)?;
        if primary.add_tuple(tuple) {
            self.data.put_page(bucket, &primary)?;
            return Ok(());
        }

        let mut prev_in_data = true;
        let mut prev_id = bucket;
        let mut prev_page = primary.clone();
        let mut cur_id = primary.ovflow();

        loop {
            if cur_id == NO_PAGE {
                let new_id = self.ovflow.add_page()?;
                let mut new_page = self.ovflow.get_page(new_id)?;
                if !new_page.add_tuple(tuple) {
                    return Err(MalhError::OversizedTuple {
                        len: tuple.len() + 1,
                        max: PAGESIZE - PAGE_HDR_SIZE,
                    });
                }
                self.ovflow.put_page(new_id, &new_page)?;

                prev_page.set_ovflow(new_id);
                if prev_in_data {
                    self.data.put_page(prev_id, &prev_page)?;
                } else {
                    self.ovflow.put_page(prev_id, &prev_page)?;
                }
                return Ok(());
            }

            let mut cur_page = self.ovflow.get_page(cur_id)?;
            if cur_page.add_tuple(tuple) {
                self.ovflow.put_page(cur_id, &cur_page)?;
                return Ok(());
            }

            prev_in_data = false;
            prev_id = cur_id;
            cur_id = cur_page.ovflow();
            prev_page = cur_page;
        }
    }

    /// Split bucket `sp`: append a fresh primary page at the next
    /// address, redistribute every tuple currently chained off `sp`
    /// between `sp` and the new bucket by rehashing at `depth + 1`
    /// bits, then advance `sp`/`depth`. The old bucket's overflow chain
    /// is abandoned rather than reused (see DESIGN.md), so the rebuilt
    /// primary's `ovflow` pointer always starts at `NO_PAGE`. There is
    /// no free-list to reclaim those pages onto, so they become
    /// permanently unreachable garbage in the `.ovflow` file; this
    /// engine never reclaims space in place, so that cost is accepted.
    fn split(&mut self) -> Result<()> {
        let old_bucket = self.sp;
        let new_bucket = self.sp + (1u32 << self.depth);

        let old_primary = self.data.get_page(old_bucket)?;
        let mut tuples = old_primary.tuples_owned();
        let mut cur = old_primary.ovflow();
        while cur != NO_PAGE {
            let p = self.ovflow.get_page(cur)?;
            tuples.extend(p.tuples_owned());
            cur = p.ovflow();
        }

        let new_id = self.data.add_page()?;
        debug_assert_eq!(new_id, new_bucket, "pages must be allocated densely");
        self.npages += 1;

        self.data.put_page(old_bucket, &Page::new())?;

        for t in &tuples {
            let h = tuple_hash(t, &self.cv, self.nattrs as usize)?;
            let target = get_lower(h, self.depth + 1);
            self.insert_into_chain(target, t)?;
        }

        self.sp += 1;
        if self.sp == (1u32 << self.depth) {
            self.depth += 1;
            self.sp = 0;
        }
        Ok(())
    }
}

impl Drop for Relation {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.flush();
        }
    }
}
