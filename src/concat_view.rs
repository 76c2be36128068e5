//! Stage 4, final stage of the view stack: joins the TOC track's wormhole view with an optional
//! trailing data track's wormhole view into one logical stream addressed at disc-relative LBAs
//! starting at 0, exactly as the original GD-ROM presents them.

use std::io::{self, Read, Seek, SeekFrom};

use crate::wormhole_view::WormholeView;

/// The TOC track, optionally followed by a second (data) track.
pub struct ConcatView {
    first: WormholeView,
    first_len: u64,
    second: Option<WormholeView>,
    second_len: u64,
    position: u64,
}

impl ConcatView {
    pub fn new(mut first: WormholeView, mut second: Option<WormholeView>) -> Self {
        let first_len = first.length();
        let second_len = second.as_mut().map(|v| v.length()).unwrap_or(0);
        ConcatView {
            first,
            first_len,
            second,
            second_len,
            position: 0,
        }
    }

    pub fn length(&self) -> u64 {
        self.first_len + self.second_len
    }

    fn position_children(&mut self) -> io::Result<()> {
        if self.position >= self.first_len {
            self.first.seek(SeekFrom::Start(self.first_len))?;
            if let Some(second) = &mut self.second {
                second.seek(SeekFrom::Start(self.position - self.first_len))?;
            }
        }
        else {
            self.first.seek(SeekFrom::Start(self.position))?;
            if let Some(second) = &mut self.second {
                second.seek(SeekFrom::Start(0))?;
            }
        }
        Ok(())
    }
}

impl Read for ConcatView {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let total_len = self.length();
        let want = (buf.len() as u64).min(total_len.saturating_sub(self.position)) as usize;
        if want == 0 {
            return Ok(0);
        }

        self.position_children()?;

        let start = self.position;
        let future = start + want as u64;

        if future <= self.first_len {
            self.first.read_exact(&mut buf[..want])?;
        }
        else if start >= self.first_len {
            let second = self
                .second
                .as_mut()
                .expect("read range falls past first_len but no second track is present");
            second.read_exact(&mut buf[..want])?;
        }
        else {
            let first_part = (self.first_len - start) as usize;
            self.first.read_exact(&mut buf[..first_part])?;
            let second = self
                .second
                .as_mut()
                .expect("read range crosses into second track but none is present");
            second.seek(SeekFrom::Start(0))?;
            second.read_exact(&mut buf[first_part..want])?;
        }

        self.position = future;
        Ok(want)
    }
}

impl Seek for ConcatView {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            SeekFrom::Start(offset) => offset,
            SeekFrom::End(offset) => self.length().saturating_add_signed(offset),
            SeekFrom::Current(offset) => self.position.saturating_add_signed(offset),
        };
        self.position = new_pos;
        self.position_children()?;
        Ok(new_pos)
    }
}
