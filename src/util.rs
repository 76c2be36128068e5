//! Small shared helpers used by the extractor.

use std::io::{self, Read, Write};

/// 1 MiB, matching the reference implementation's buffered-copy chunk size.
pub const COPY_BUFFER_SIZE: usize = 1024 * 1024;

/// Copies exactly `length` bytes from `src` to `dst`, `COPY_BUFFER_SIZE` bytes at a time.
pub fn copy_buffered<R: Read, W: Write>(src: &mut R, dst: &mut W, mut length: u64) -> io::Result<()> {
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    while length > 0 {
        let chunk = (length as usize).min(buf.len());
        src.read_exact(&mut buf[..chunk])?;
        dst.write_all(&buf[..chunk])?;
        length -= chunk as u64;
    }
    Ok(())
}
