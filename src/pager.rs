//! pager — C4: the file pair. Each of a relation's `.data` and
//! `.ovflow` files is a dense, 0-based array of `PAGESIZE`-byte pages;
//! `PageFile` is the synchronous, unbuffered reader/writer shared by
//! both. No buffer pool, no caching, no WAL: this engine is strictly
//! single-threaded and synchronous, so a trivial per-call read/write is
//! the right implementation here, not a cut corner.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::consts::PAGESIZE;
use crate::error::Result;
use crate::page::Page;

/// One of a relation's two page files (primary data, or overflow).
pub struct PageFile {
    path: PathBuf,
    file: File,
    /// Number of pages currently in the file; PageIDs are dense and
    /// monotonically assigned by `add_page`.
    npages: u32,
}

impl PageFile {
    /// Create a new, empty page file.
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create_new(true)
            .read(true)
            .write(true)
            .open(path)?;
        Ok(PageFile {
            path: path.to_path_buf(),
            file,
            npages: 0,
        })
    }

    /// Open an existing page file for read or read-write access.
    pub fn open(path: &Path, writable: bool) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(writable).open(path)?;
        let len = file.metadata()?.len();
        let npages = (len / PAGESIZE as u64) as u32;
        Ok(PageFile {
            path: path.to_path_buf(),
            file,
            npages,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn npages(&self) -> u32 {
        self.npages
    }

    /// Append a fresh, empty page at the end of the file and return
    /// its new PageID.
    pub fn add_page(&mut self) -> Result<u32> {
        let id = self.npages;
        self.put_page(id, &Page::new())?;
        self.npages += 1;
        Ok(id)
    }

    /// Load the page at `id` (byte offset `id * PAGESIZE`).
    pub fn get_page(&mut self, id: u32) -> Result<Page> {
        let mut buf = vec![0u8; PAGESIZE];
        self.file.seek(SeekFrom::Start(id as u64 * PAGESIZE as u64))?;
        self.file.read_exact(&mut buf)?;
        Ok(Page::from_bytes(buf))
    }

    /// Write `page` back to `id`.
    pub fn put_page(&mut self, id: u32, page: &Page) -> Result<()> {
        self.file.seek(SeekFrom::Start(id as u64 * PAGESIZE as u64))?;
        self.file.write_all(page.as_bytes())?;
        Ok(())
    }

    pub fn sync(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_path(name: &str) -> PathBuf {
        let pid = std::process::id();
        let t = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("malh-pager-{}-{}-{}", name, pid, t))
    }

    #[test]
    fn add_get_put_roundtrip() {
        let path = unique_path("roundtrip");
        let mut pf = PageFile::create(&path).unwrap();
        let id0 = pf.add_page().unwrap();
        let id1 = pf.add_page().unwrap();
        assert_eq!(id0, 0);
        assert_eq!(id1, 1);
        assert_eq!(pf.npages(), 2);

        let mut p = pf.get_page(id1).unwrap();
        p.add_tuple("x,y,z");
        pf.put_page(id1, &p).unwrap();

        let p2 = pf.get_page(id1).unwrap();
        assert_eq!(p2.n_tuples(), 1);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn reopen_recovers_npages() {
        let path = unique_path("reopen");
        {
            let mut pf = PageFile::create(&path).unwrap();
            pf.add_page().unwrap();
            pf.add_page().unwrap();
            pf.add_page().unwrap();
            pf.sync().unwrap();
        }
        let pf2 = PageFile::open(&path, false).unwrap();
        assert_eq!(pf2.npages(), 3);
        std::fs::remove_file(&path).ok();
    }
}
