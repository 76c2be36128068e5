//! Stage 3 of the view stack: redirects a fixed-length range of the logical address space
//! ("the wormhole") to a different offset in the same underlying view.
//!
//! This exists to stitch the GD-ROM TOC track's own PVD/directory area (which the track file
//! stores near its own start) back onto the disc-relative LBA it's actually addressed at once the
//! track is positioned at LBA 45000 by [`OffsetView`]. A `WormholeView` with `wormlen == 0` is a
//! transparent passthrough, used for tracks that don't need redirecting.

use std::io::{self, Read, Seek, SeekFrom};

use crate::{offset_view::OffsetView, Result};

/// A read-only view that reads `target..target+wormlen` from `source` instead of from its own
/// natural position.
pub struct WormholeView {
    inner: OffsetView,
    target: u64,
    source: u64,
    wormlen: u64,
    position: u64,
}

impl WormholeView {
    /// `target + wormlen` must not exceed `inner`'s length for reads that stay in range; this
    /// performs no length validation itself, mirroring the reference implementation.
    pub fn new(inner: OffsetView, target: u64, source: u64, wormlen: u64) -> Result<Self> {
        Ok(WormholeView {
            inner,
            target,
            source,
            wormlen,
            position: 0,
        })
    }

    pub fn length(&self) -> u64 {
        self.inner.length()
    }

    fn read_inner_at(&mut self, pos: u64, buf: &mut [u8]) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        self.inner.read_exact(buf)
    }
}

impl Read for WormholeView {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let total_len = self.length();
        let want = (buf.len() as u64).min(total_len.saturating_sub(self.position)) as usize;
        if want == 0 {
            return Ok(0);
        }

        let start = self.position;
        let future = start + want as u64;
        let wormhole_end = self.target + self.wormlen;

        if start >= wormhole_end || future < self.target {
            // Entirely outside the wormhole: read straight through.
            self.read_inner_at(start, &mut buf[..want])?;
        }
        else if start >= self.target {
            // Starts inside the wormhole.
            let redirected_start = start - self.target + self.source;
            if future < wormhole_end {
                // Stays inside the wormhole for its whole length.
                self.read_inner_at(redirected_start, &mut buf[..want])?;
            }
            else {
                // Starts inside, exits the wormhole partway through.
                let in_worm_len = (wormhole_end - start) as usize;
                let out_worm_len = want - in_worm_len;
                self.read_inner_at(redirected_start, &mut buf[..in_worm_len])?;
                self.read_inner_at(wormhole_end, &mut buf[in_worm_len..want])?;
            }
        }
        else if future < wormhole_end {
            // Starts before the wormhole, ends inside it.
            let pre_worm_len = (self.target - start) as usize;
            let in_worm_len = want - pre_worm_len;
            self.read_inner_at(start, &mut buf[..pre_worm_len])?;
            self.read_inner_at(self.source, &mut buf[pre_worm_len..want])?;
        }
        else {
            // Starts before the wormhole, ends after it: three segments.
            let pre_worm_len = (self.target - start) as usize;
            let in_worm_len = self.wormlen as usize;
            let post_worm_len = want - pre_worm_len - in_worm_len;
            self.read_inner_at(start, &mut buf[..pre_worm_len])?;
            self.read_inner_at(self.source, &mut buf[pre_worm_len..pre_worm_len + in_worm_len])?;
            self.read_inner_at(wormhole_end, &mut buf[pre_worm_len + in_worm_len..want])?;
        }

        self.position = future;
        Ok(want)
    }
}

impl Seek for WormholeView {
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
    use crate::{sector_image::SectorImage, SectorMode};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn view(bytes: &[u8]) -> OffsetView {
        let mut f = NamedTempFile::with_suffix(".iso").unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        let img = SectorImage::open(f.path(), Some(SectorMode::Mode2048)).unwrap();
        OffsetView::new(img, 0)
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 256) as u8).collect()
    }

    #[test]
    fn passthrough_with_zero_length_wormhole() {
        let data = pattern(100);
        let mut w = WormholeView::new(view(&data), 0, 0, 0).unwrap();
        let mut buf = vec![0u8; 100];
        w.read_exact(&mut buf).unwrap();
        assert_eq!(buf, data);
    }

    #[test]
    fn starts_inside_stays_inside() {
        let data = pattern(100);
        // redirect [10,20) to source 50
        let mut w = WormholeView::new(view(&data), 10, 50, 10).unwrap();
        w.seek(SeekFrom::Start(12)).unwrap();
        let mut buf = vec![0u8; 5];
        w.read_exact(&mut buf).unwrap();
        assert_eq!(buf, &data[52..57]);
    }

    #[test]
    fn starts_before_jumps_over_wormhole() {
        let data = pattern(100);
        let mut w = WormholeView::new(view(&data), 10, 50, 10).unwrap();
        w.seek(SeekFrom::Start(5)).unwrap();
        let mut buf = vec![0u8; 20]; // [5,25): pre [5,10), worm [50,60), post [20,25)
        w.read_exact(&mut buf).unwrap();
        assert_eq!(&buf[0..5], &data[5..10]);
        assert_eq!(&buf[5..15], &data[50..60]);
        assert_eq!(&buf[15..20], &data[20..25]);
    }

    #[test]
    fn starts_before_ends_inside() {
        let data = pattern(100);
        let mut w = WormholeView::new(view(&data), 10, 50, 10).unwrap();
        w.seek(SeekFrom::Start(8)).unwrap();
        let mut buf = vec![0u8; 5]; // [8,13): pre [8,10), in [50,53)
        w.read_exact(&mut buf).unwrap();
        assert_eq!(&buf[0..2], &data[8..10]);
        assert_eq!(&buf[2..5], &data[50..53]);
    }

    #[test]
    fn starts_inside_exits_midway() {
        let data = pattern(100);
        let mut w = WormholeView::new(view(&data), 10, 50, 10).unwrap();
        w.seek(SeekFrom::Start(15)).unwrap();
        let mut buf = vec![0u8; 10]; // [15,25): in [55,60), out [20,25)
        w.read_exact(&mut buf).unwrap();
        assert_eq!(&buf[0..5], &data[55..60]);
        assert_eq!(&buf[5..10], &data[20..25]);
    }
}
