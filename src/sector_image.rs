//! Stage 1 of the view stack: normalizes a single physical track file, which may store either
//! 2048-byte (`.iso`-style) or 2352-byte (raw `.bin`-style) sectors, into a logical 2048-byte/
//! sector byte stream.

use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::Path,
};

use crate::{GditoolsError, Result, SectorMode};

/// Bytes of CD sync pattern + header preceding the 2048-byte user-data payload in a 2352-byte
/// sector.
const SYNC_HEADER_LEN: u64 = 16;
/// Bytes of EDC/ECC trailing the 2048-byte user-data payload in a 2352-byte sector.
const ECC_LEN: u64 = 288;
/// Total bytes in a raw 2352-byte CD sector.
const RAW_SECTOR_LEN: u64 = SYNC_HEADER_LEN + 2048 + ECC_LEN;
/// Bytes to skip between consecutive payloads when reading across a 2352-mode sector boundary:
/// the trailing ECC of the sector just finished, plus the sync/header of the next.
const INTER_SECTOR_GAP: u64 = ECC_LEN + SYNC_HEADER_LEN;

/// A read-only, logically 2048-byte/sector view of a single physical track file.
///
/// `SectorImage` hides whether the underlying file stores raw 2048-byte sectors or full 2352-byte
/// CD sectors: callers always seek and read in logical (2048-byte-sector) offsets, and reads that
/// cross a 2352-mode sector boundary are transparently spliced back together, skipping the 304
/// bytes of sync/header/ECC that separate consecutive payloads on disc.
pub struct SectorImage {
    file: File,
    mode: SectorMode,
    length: u64,
    position: u64,
}

impl SectorImage {
    /// Opens `path` as a track file. If `mode` is `None`, the sector mode is inferred from the
    /// file extension (`.iso` => 2048, `.bin` => 2352); any other extension without an explicit
    /// mode is a [`GditoolsError::BadSectorMode`].
    pub fn open(path: &Path, mode: Option<SectorMode>) -> Result<Self> {
        let mode = match mode {
            Some(mode) => mode,
            None => SectorMode::from_extension(path).ok_or_else(|| {
                GditoolsError::BadSectorMode(format!(
                    "cannot infer sector mode from extension of {}",
                    path.display()
                ))
            })?,
        };

        let file = File::open(path)?;
        let physical_len = file.metadata()?.len();
        let length = match mode {
            SectorMode::Mode2048 => physical_len,
            SectorMode::Mode2352 => physical_len * 2048 / RAW_SECTOR_LEN,
        };

        log::debug!(
            "SectorImage::open(): {} mode={} physical_len={} logical_len={}",
            path.display(),
            mode,
            physical_len,
            length
        );

        Ok(SectorImage {
            file,
            mode,
            length,
            position: 0,
        })
    }

    pub fn mode(&self) -> SectorMode {
        self.mode
    }

    /// Logical length of the track in bytes, as a whole number of 2048-byte sectors.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Maps a logical byte offset to its physical byte offset in 2352-mode.
    fn physical_offset(logical: u64) -> u64 {
        (logical / 2048) * RAW_SECTOR_LEN + (logical % 2048) + SYNC_HEADER_LEN
    }

    fn read_2352(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let start = self.position;
        let want = (buf.len() as u64).min(self.length.saturating_sub(start));
        if want == 0 {
            return Ok(0);
        }
        let end = start + want;

        let phys_start = Self::physical_offset(start);
        let phys_end = Self::physical_offset(end);
        let mut raw = vec![0u8; (phys_end - phys_start) as usize];
        self.file.seek(SeekFrom::Start(phys_start))?;
        self.file.read_exact(&mut raw)?;

        let mut out_pos = 0usize;
        let mut raw_pos = 0usize;
        let mut remaining = want;

        // First (possibly short) payload chunk, up to the end of its 2048-byte sector.
        let first_chunk = (2048 - (start % 2048)).min(remaining);
        buf[out_pos..out_pos + first_chunk as usize]
            .copy_from_slice(&raw[raw_pos..raw_pos + first_chunk as usize]);
        out_pos += first_chunk as usize;
        raw_pos += first_chunk as usize;
        remaining -= first_chunk;

        while remaining > 0 {
            raw_pos += INTER_SECTOR_GAP as usize;
            let chunk = remaining.min(2048);
            buf[out_pos..out_pos + chunk as usize]
                .copy_from_slice(&raw[raw_pos..raw_pos + chunk as usize]);
            out_pos += chunk as usize;
            raw_pos += chunk as usize;
            remaining -= chunk;
        }

        self.position = end;
        Ok(out_pos)
    }
}

impl Read for SectorImage {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.mode {
            SectorMode::Mode2048 => {
                self.file.seek(SeekFrom::Start(self.position))?;
                let want = (buf.len() as u64).min(self.length.saturating_sub(self.position)) as usize;
                let n = self.file.read(&mut buf[..want])?;
                self.position += n as u64;
                Ok(n)
            }
            SectorMode::Mode2352 => self.read_2352(buf),
        }
    }
}

impl Seek for SectorImage {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            SeekFrom::Start(offset) => offset,
            SeekFrom::End(offset) => self.length.saturating_add_signed(offset),
            SeekFrom::Current(offset) => self.position.saturating_add_signed(offset),
        };
        self.position = new_pos;
        Ok(new_pos)
    }
}
