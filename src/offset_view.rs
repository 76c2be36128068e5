//! Stage 2 of the view stack: shifts a track's logical address space forward by `offset` bytes,
//! presenting everything before `offset` as zero-filled padding.
//!
//! This mirrors how GD-ROM data tracks are addressed: a track file's own byte 0 corresponds to
//! some disc LBA other than 0, and everything the disc addresses below that LBA reads as silence.

use std::io::{self, Read, Seek, SeekFrom};

use crate::sector_image::SectorImage;

/// A read-only view that reports `inner`'s content starting at byte `offset`, with bytes
/// `0..offset` reading as zero.
pub struct OffsetView {
    inner: SectorImage,
    offset: u64,
    position: u64,
}

impl OffsetView {
    pub fn new(inner: SectorImage, offset: u64) -> Self {
        OffsetView {
            inner,
            offset,
            position: 0,
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Total logical length: the padding region plus the wrapped track's own length.
    pub fn length(&self) -> u64 {
        self.offset + self.inner.length()
    }
}

impl Read for OffsetView {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let total_len = self.length();
        let want = (buf.len() as u64).min(total_len.saturating_sub(self.position)) as usize;
        if want == 0 {
            return Ok(0);
        }

        let mut written = 0usize;

        if self.position < self.offset {
            let pad = ((self.offset - self.position) as usize).min(want);
            buf[..pad].fill(0);
            written += pad;
            self.position += pad as u64;
        }

        if written < want {
            self.inner.seek(SeekFrom::Start(self.position - self.offset))?;
            let n = self.inner.read(&mut buf[written..want])?;
            written += n;
            self.position += n as u64;
        }

        Ok(written)
    }
}

impl Seek for OffsetView {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            SeekFrom::Start(offset) => offset,
            SeekFrom::End(offset) => self.length().saturating_add_signed(offset),
            SeekFrom::Current(offset) => self.position.saturating_add_signed(offset),
        };
        self.position = new_pos;
        Ok(new_pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SectorMode;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn track(bytes: &[u8]) -> SectorImage {
        let mut f = NamedTempFile::with_suffix(".iso").unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        SectorImage::open(f.path(), Some(SectorMode::Mode2048)).unwrap()
    }

    #[test]
    fn reads_zero_padding_before_offset() {
        let img = track(&[0xAB; 100]);
        let mut view = OffsetView::new(img, 50);
        let mut buf = vec![0xFFu8; 60];
        view.read_exact(&mut buf).unwrap();
        assert!(buf[..50].iter().all(|&b| b == 0));
        assert!(buf[50..60].iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn length_includes_offset() {
        let img = track(&[0u8; 200]);
        let view = OffsetView::new(img, 50);
        assert_eq!(view.length(), 250);
    }

    #[test]
    fn seek_into_padding_then_into_data() {
        let img = track(&[0x42; 10]);
        let mut view = OffsetView::new(img, 20);
        view.seek(SeekFrom::Start(25)).unwrap();
        let mut buf = [0u8; 5];
        view.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [0x42; 5]);
    }
}
