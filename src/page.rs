//! page — C3: a fixed-size container of packed NUL-terminated tuples,
//! with free-space accounting and a forward overflow pointer.
//!
//! Binary layout: header `[n: u32][free: u32][ovflow: u32]` followed by
//! tuples packed back-to-back, each NUL-terminated. `free` is the byte
//! offset of the first unused payload byte; the invariant
//! `sum(len(t_i)+1) + PAGE_HDR_SIZE == free` holds after every
//! successful `add_to_page`.

use byteorder::{ByteOrder, LittleEndian};

use crate::consts::{NO_PAGE, PAGESIZE, PAGE_HDR_SIZE};

const OFF_N: usize = 0;
const OFF_FREE: usize = 4;
const OFF_OVFLOW: usize = 8;

/// In-memory view of one on-disk page. Exactly `PAGESIZE` bytes.
#[derive(Clone)]
pub struct Page {
    buf: Vec<u8>,
}

impl Page {
    /// A freshly-initialised, empty page: no tuples, no overflow.
    pub fn new() -> Self {
        let mut buf = vec![0u8; PAGESIZE];
        LittleEndian::write_u32(&mut buf[OFF_N..OFF_N + 4], 0);
        LittleEndian::write_u32(&mut buf[OFF_FREE..OFF_FREE + 4], PAGE_HDR_SIZE as u32);
        LittleEndian::write_u32(&mut buf[OFF_OVFLOW..OFF_OVFLOW + 4], NO_PAGE);
        Page { buf }
    }

    /// Wrap an already-loaded `PAGESIZE`-byte buffer (as read from
    /// disk by `pager::FilePair::get_page`).
    pub fn from_bytes(buf: Vec<u8>) -> Self {
        debug_assert_eq!(buf.len(), PAGESIZE);
        Page { buf }
    }

    /// Borrow the raw page bytes, for writing back to disk.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn n_tuples(&self) -> u32 {
        LittleEndian::read_u32(&self.buf[OFF_N..OFF_N + 4])
    }

    fn set_n_tuples(&mut self, n: u32) {
        LittleEndian::write_u32(&mut self.buf[OFF_N..OFF_N + 4], n);
    }

    fn free_offset(&self) -> usize {
        LittleEndian::read_u32(&self.buf[OFF_FREE..OFF_FREE + 4]) as usize
    }

    fn set_free_offset(&mut self, off: usize) {
        LittleEndian::write_u32(&mut self.buf[OFF_FREE..OFF_FREE + 4], off as u32);
    }

    /// Free bytes remaining for tuple storage.
    pub fn free_space(&self) -> usize {
        PAGESIZE - self.free_offset()
    }

    pub fn ovflow(&self) -> u32 {
        LittleEndian::read_u32(&self.buf[OFF_OVFLOW..OFF_OVFLOW + 4])
    }

    pub fn set_ovflow(&mut self, page_id: u32) {
        LittleEndian::write_u32(&mut self.buf[OFF_OVFLOW..OFF_OVFLOW + 4], page_id);
    }

    /// Append `tuple` (its bytes plus a terminating NUL) if there is
    /// room. Never overwrites existing data. Returns `true` on success,
    /// `false` if the page is full (caller tries the next page in
    /// chain, or allocates a new one).
    pub fn add_tuple(&mut self, tuple: &str) -> bool {
        let needed = tuple.len() + 1;
        if self.free_space() < needed {
            return false;
        }
        let off = self.free_offset();
        self.buf[off..off + tuple.len()].copy_from_slice(tuple.as_bytes());
        self.buf[off + tuple.len()] = 0;
        self.set_free_offset(off + needed);
        self.set_n_tuples(self.n_tuples() + 1);
        true
    }

    /// Iterate the tuples stored on this page, in storage order, as
    /// `(offset_within_payload, &str)` pairs. `offset` is relative to
    /// the start of the payload (i.e. to `PAGE_HDR_SIZE`); a scan
    /// cursor can resume from it without re-walking earlier tuples.
    pub fn iter_tuples(&self) -> PageTupleIter<'_> {
        PageTupleIter {
            buf: &self.buf,
            remaining: self.n_tuples(),
            offset: 0,
        }
    }

    /// Collect all stored tuples as owned strings, in storage order.
    /// Used when a bucket's chain needs to be snapshotted before being
    /// rewritten, e.g. during a split.
    pub fn tuples_owned(&self) -> Vec<String> {
        self.iter_tuples().map(|(_, t)| t.to_string()).collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

pub struct PageTupleIter<'a> {
    buf: &'a [u8],
    remaining: u32,
    offset: usize,
}

impl<'a> Iterator for PageTupleIter<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let start = PAGE_HDR_SIZE + self.offset;
        let nul = self.buf[start..]
            .iter()
            .position(|&b| b == 0)
            .expect("page tuple must be NUL-terminated");
        let s = std::str::from_utf8(&self.buf[start..start + nul])
            .expect("page tuple must be valid UTF-8");
        let item = (self.offset, s);
        self.offset += nul + 1;
        self.remaining -= 1;
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_page_is_empty() {
        let p = Page::new();
        assert_eq!(p.n_tuples(), 0);
        assert_eq!(p.ovflow(), NO_PAGE);
        assert_eq!(p.free_space(), PAGESIZE - PAGE_HDR_SIZE);
    }

    #[test]
    fn add_and_iterate_tuples() {
        let mut p = Page::new();
        assert!(p.add_tuple("alpha,beta,gamma"));
        assert!(p.add_tuple("a,b,c"));
        assert_eq!(p.n_tuples(), 2);
        let got: Vec<&str> = p.iter_tuples().map(|(_, t)| t).collect();
        assert_eq!(got, vec!["alpha,beta,gamma", "a,b,c"]);
    }

    #[test]
    fn add_fails_when_full() {
        let mut p = Page::new();
        let filler = "x".repeat(PAGESIZE); // far larger than one page
        assert!(!p.add_tuple(&filler));
        assert_eq!(p.n_tuples(), 0);
    }

    #[test]
    fn exact_fit_boundary() {
        let mut p = Page::new();
        let room = p.free_space();
        // one byte reserved for the NUL terminator
        let t = "x".repeat(room - 1);
        assert!(p.add_tuple(&t));
        assert_eq!(p.free_space(), 0);
    }

    #[test]
    fn roundtrips_through_bytes() {
        let mut p = Page::new();
        p.add_tuple("hello,world");
        p.set_ovflow(7);
        let bytes = p.as_bytes().to_vec();
        let p2 = Page::from_bytes(bytes);
        assert_eq!(p2.n_tuples(), 1);
        assert_eq!(p2.ovflow(), 7);
        assert_eq!(p2.tuples_owned(), vec!["hello,world".to_string()]);
    }
}
