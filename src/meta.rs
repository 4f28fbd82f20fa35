//! meta — the `.info` file: a relation's persistent global state.
//!
//! Fixed, unversioned layout: `nattrs: u32, depth: u32, sp: u32,
//! npages: u32, ntups: u32`, little-endian, followed by `MAXCHVEC`
//! `(att: u32, bit: u32)` records. The file is rewritten with a single
//! write from offset 0 and no tmp-file/rename step; a write that is
//! interrupted mid-flight corrupts the relation, which this engine
//! accepts since it makes no crash-recovery guarantees in the first
//! place. See DESIGN.md.

use byteorder::{ByteOrder, LittleEndian};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::chvec::{ChoiceEntry, ChoiceVector};
use crate::consts::MAXCHVEC;
use crate::error::Result;

pub const META_RECORD_SIZE: usize = 5 * 4 + MAXCHVEC * 8;

#[derive(Debug, Clone)]
pub struct RelnMeta {
    pub nattrs: u32,
    pub depth: u32,
    pub sp: u32,
    pub npages: u32,
    pub ntups: u32,
    pub cv: ChoiceVector,
}

impl RelnMeta {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; META_RECORD_SIZE];
        LittleEndian::write_u32(&mut buf[0..4], self.nattrs);
        LittleEndian::write_u32(&mut buf[4..8], self.depth);
        LittleEndian::write_u32(&mut buf[8..12], self.sp);
        LittleEndian::write_u32(&mut buf[12..16], self.npages);
        LittleEndian::write_u32(&mut buf[16..20], self.ntups);
        let mut off = 20;
        for entry in self.cv.entries() {
            LittleEndian::write_u32(&mut buf[off..off + 4], entry.att);
            LittleEndian::write_u32(&mut buf[off + 4..off + 8], entry.bit);
            off += 8;
        }
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Self {
        debug_assert_eq!(buf.len(), META_RECORD_SIZE);
        let nattrs = LittleEndian::read_u32(&buf[0..4]);
        let depth = LittleEndian::read_u32(&buf[4..8]);
        let sp = LittleEndian::read_u32(&buf[8..12]);
        let npages = LittleEndian::read_u32(&buf[12..16]);
        let ntups = LittleEndian::read_u32(&buf[16..20]);
        let mut entries = [ChoiceEntry::default(); MAXCHVEC];
        let mut off = 20;
        for entry in entries.iter_mut() {
            entry.att = LittleEndian::read_u32(&buf[off..off + 4]);
            entry.bit = LittleEndian::read_u32(&buf[off + 4..off + 8]);
            off += 8;
        }
        RelnMeta {
            nattrs,
            depth,
            sp,
            npages,
            ntups,
            cv: ChoiceVector(entries),
        }
    }
}

/// Create a brand-new `.info` file. Errors if it already exists.
pub fn write_meta_new(path: &Path, meta: &RelnMeta) -> Result<()> {
    let mut f = OpenOptions::new().create_new(true).write(true).open(path)?;
    f.write_all(&meta.to_bytes())?;
    Ok(())
}

/// Overwrite an existing `.info` file from offset 0 in a single write.
/// A partial write (e.g. a crash mid-write) leaves the file corrupt;
/// this engine has no recovery path for that and does not try to build
/// one here.
pub fn write_meta_overwrite(f: &mut File, meta: &RelnMeta) -> Result<()> {
    f.seek(SeekFrom::Start(0))?;
    f.write_all(&meta.to_bytes())?;
    Ok(())
}

pub fn read_meta(f: &mut File) -> Result<RelnMeta> {
    let mut buf = vec![0u8; META_RECORD_SIZE];
    f.seek(SeekFrom::Start(0))?;
    f.read_exact(&mut buf)?;
    Ok(RelnMeta::from_bytes(&buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chvec::ChoiceVector;

    fn unique_path(name: &str) -> std::path::PathBuf {
        let pid = std::process::id();
        let t = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("malh-meta-{}-{}-{}", name, pid, t))
    }

    #[test]
    fn roundtrip() {
        let path = unique_path("roundtrip");
        let cv = ChoiceVector::parse("0:0,1:0,2:0", 3).unwrap();
        let meta = RelnMeta {
            nattrs: 3,
            depth: 2,
            sp: 1,
            npages: 5,
            ntups: 64,
            cv,
        };
        write_meta_new(&path, &meta).unwrap();

        let mut f = OpenOptions::new().read(true).write(true).open(&path).unwrap();
        let read_back = read_meta(&mut f).unwrap();
        assert_eq!(read_back.nattrs, 3);
        assert_eq!(read_back.depth, 2);
        assert_eq!(read_back.sp, 1);
        assert_eq!(read_back.npages, 5);
        assert_eq!(read_back.ntups, 64);
        assert_eq!(read_back.cv.entries()[0].att, 0);

        let mut meta2 = read_back;
        meta2.ntups = 100;
        write_meta_overwrite(&mut f, &meta2).unwrap();
        let read_back2 = read_meta(&mut f).unwrap();
        assert_eq!(read_back2.ntups, 100);

        std::fs::remove_file(&path).ok();
    }
}
