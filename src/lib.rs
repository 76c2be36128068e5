//! # gditools
//!
//! `gditools` is a Rust library for reading SEGA Dreamcast GD-ROM disc images described by a
//! `.gdi` index file, and for extracting the ISO9660 filesystem carried in their high-density
//! data area.
//!
//! A GD-ROM dump is not a single file: a `.gdi` manifest lists several track files (audio tracks,
//! a TOC/data track at LBA 45000, and sometimes a further data track appended after it), and those
//! track files may store either raw 2048-byte sectors or full 2352-byte CD sectors. `gditools`
//! builds a small stack of composable, read-only byte-stream views (see [`sector_image`],
//! [`offset_view`], [`wormhole_view`], [`concat_view`]) that normalizes all of this into a single
//! logical 2048-byte/sector stream addressed the same way the original disc's LBAs are, and then
//! parses the ISO9660 [`iso9660`] filesystem living inside that stream.
//!
//! The [`extractor`] module builds on top of [`Iso9660Reader`](iso9660::Iso9660Reader) to dump
//! files, write out the boot sector (`ip.bin`), and generate `sorttxt` disc-authoring order files.
//!
//! The recommended entry point is [`GdiIndex::open`](gdi_index::GdiIndex::open), which parses a
//! `.gdi` manifest and returns everything needed to build the view stack; most callers then
//! construct an [`Iso9660Reader`](iso9660::Iso9660Reader) directly from it.

mod concat_view;
pub mod extractor;
mod gdi_index;
pub mod iso9660;
mod offset_view;
mod sector_image;
pub mod util;
mod wormhole_view;

pub use concat_view::ConcatView;
pub use gdi_index::{GdiIndex, SectorMode, TrackDescriptor};
pub use offset_view::OffsetView;
pub use sector_image::SectorImage;
pub use wormhole_view::WormholeView;

use thiserror::Error;

/// Logical sector size of the normalized data stream this crate always presents, regardless of
/// the physical sector width (2048 or 2352) of the underlying track file.
pub const SECTOR_SIZE: u64 = 2048;

/// Disc LBA at which the GD-ROM high-density area (and its TOC track) begins.
pub const HIGH_DENSITY_LBA: u64 = 45000;

/// Number of logical sectors folded back onto the TOC track's own PVD/directory area by the
/// wormhole view (see [`wormhole_view`]); 32 sectors comfortably covers the PVD, SVDs, and
/// volume descriptor set terminator.
pub const WORMHOLE_SECTORS: u64 = 32;

/// Size in bytes of the boot image (`ip.bin`) extracted from the first 16 sectors of the disc.
pub const BOOTSECTOR_SIZE: u64 = 16 * SECTOR_SIZE;

/// Every error this library's core can produce.
///
/// The library is small enough, and its modules interdependent enough, that a single error enum
/// serves every stage of the view stack and the ISO9660 reader, rather than splitting by module.
#[derive(Debug, Error)]
pub enum GditoolsError {
    #[error("unknown or unsupported sector mode for track file: {0}")]
    BadSectorMode(String),
    #[error("invalid .gdi manifest: {0}")]
    InvalidGdi(String),
    #[error("an IO error occurred reading a track file: {0}")]
    IoError(String),
    #[error("logical sector 16 does not carry a valid ISO9660 Primary Volume Descriptor")]
    BadVolumeDescriptor,
    #[error("path not found in filesystem: {0}")]
    NotFound(String),
    #[error("directory record decode read fewer bytes than required (corrupt image?)")]
    TruncatedRead,
}

impl From<std::io::Error> for GditoolsError {
    fn from(err: std::io::Error) -> Self {
        GditoolsError::IoError(err.to_string())
    }
}

impl From<binrw::Error> for GditoolsError {
    fn from(err: binrw::Error) -> Self {
        GditoolsError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GditoolsError>;

/// Convenience re-exports for the common "open a gdi, read its filesystem" path.
pub mod prelude {
    pub use crate::{
        extractor::{Extractor, SortCriterion},
        gdi_index::{GdiIndex, SectorMode, TrackDescriptor},
        iso9660::{DirectoryRecord, Iso9660Reader, PrimaryVolumeDescriptor},
        GditoolsError,
    };
}
