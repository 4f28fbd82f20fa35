//! Crate-wide compile-time constants.

/// Width of the composite hash word and of the choice vector.
pub const MAXBITS: usize = 32;

/// Number of `(att, bit)` records stored in the `.info` file's choice
/// vector section. Kept equal to `MAXBITS` since no entry past that
/// width is ever consulted.
pub const MAXCHVEC: usize = MAXBITS;

/// Fixed page size, in bytes. Not stored on disk: a relation created
/// with one build must be read with the same build.
pub const PAGESIZE: usize = 4096;

/// Byte size of a page header: `n: u32`, `free: u32`, `ovflow: u32`.
pub const PAGE_HDR_SIZE: usize = 12;

/// Sentinel meaning "no page" (used for `ovflow` pointers and as an
/// invalid PageID marker).
pub const NO_PAGE: u32 = u32::MAX;

/// Default ceiling on a tuple's encoded length (including the
/// terminating NUL), overridable via `config::MalhConfig`.
pub const MAXTUPLEN: usize = 256;

pub const INFO_EXT: &str = "info";
pub const DATA_EXT: &str = "data";
pub const OVFLOW_EXT: &str = "ovflow";
