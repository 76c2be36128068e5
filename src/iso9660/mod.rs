//! ISO9660 filesystem reader built on top of a [`ConcatView`](crate::ConcatView).

mod date_time;
mod directory_record;
mod pvd;

pub use date_time::{RawRecordDate, RecordTimestamp};
pub use directory_record::{DirectoryRecord, RecordFlags};
pub use pvd::PrimaryVolumeDescriptor;

use std::io::{Read, Seek, SeekFrom};

use crate::{ConcatView, GditoolsError, Result};

const SECTOR_SIZE: usize = 2048;

/// Random-access reader over the ISO9660 filesystem carried by a [`ConcatView`].
pub struct Iso9660Reader {
    view: ConcatView,
    pvd: PrimaryVolumeDescriptor,
}

impl Iso9660Reader {
    /// Opens `view` and eagerly parses the Primary Volume Descriptor at logical sector 16.
    pub fn open(mut view: ConcatView) -> Result<Self> {
        view.seek(SeekFrom::Start(16 * SECTOR_SIZE as u64))?;
        let mut sector = [0u8; SECTOR_SIZE];
        view.read_exact(&mut sector)?;
        let pvd = PrimaryVolumeDescriptor::parse(&sector)?;
        log::debug!("Iso9660Reader::open(): volume label = {:?}", pvd.volume_label());
        Ok(Iso9660Reader { view, pvd })
    }

    pub fn pvd(&self) -> &PrimaryVolumeDescriptor {
        &self.pvd
    }

    /// The root directory record, with `name` set to `"/"`.
    pub fn root_record(&self) -> Result<DirectoryRecord> {
        let (mut record, _) = DirectoryRecord::parse(&self.pvd.root_directory_record, 0)?
            .ok_or(GditoolsError::TruncatedRead)?;
        record.name = "/".to_string();
        Ok(record)
    }

    fn read_raw(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.view.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        self.view.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_extent(&mut self, record: &DirectoryRecord) -> Result<Vec<u8>> {
        self.read_raw(record.extent_lba as u64 * SECTOR_SIZE as u64, record.extent_length as usize)
    }

    /// Decodes every directory record directly inside `dir`'s extent (not recursive), skipping
    /// the self (`\0`) and parent (`\1`) entries every ISO9660 directory extent begins with.
    fn read_children(&mut self, dir: &DirectoryRecord) -> Result<Vec<DirectoryRecord>> {
        let data = self.read_extent(dir)?;
        let mut records = Vec::new();

        let mut sector_start = 0usize;
        while sector_start < data.len() {
            let sector_end = (sector_start + SECTOR_SIZE).min(data.len());
            let mut offset = sector_start;
            while offset < sector_end {
                match DirectoryRecord::parse(&data[..sector_end], offset)? {
                    None => break,
                    Some((record, record_len)) => {
                        offset += record_len;
                        if record.name.as_bytes() == [0x00] || record.name.as_bytes() == [0x01] {
                            continue;
                        }
                        records.push(record);
                    }
                }
            }
            sector_start += SECTOR_SIZE;
        }

        Ok(records)
    }

    /// Case-insensitive path lookup, e.g. `/DATA/LEVEL1.BIN`.
    pub fn get_record(&mut self, path: &str) -> Result<DirectoryRecord> {
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        if parts.is_empty() {
            return self.root_record();
        }

        let mut current = self.root_record()?;
        let mut current_path = String::new();

        for part in parts {
            let children = self.read_children(&current)?;
            let found = children
                .into_iter()
                .find(|c| c.name.eq_ignore_ascii_case(part))
                .ok_or_else(|| GditoolsError::NotFound(path.to_string()))?;

            current_path = format!("{}/{}", current_path, found.name);
            current = found;
        }

        current.name = current_path;
        Ok(current)
    }

    /// Depth-first traversal of every record in the tree, with `name` set to the fully qualified
    /// path from the volume root. Directories are always yielded; files only if `include_files`.
    pub fn gen_records(&mut self, include_files: bool) -> Result<Vec<DirectoryRecord>> {
        let root = self.root_record()?;
        let mut out = Vec::new();
        self.walk(&root, "", include_files, &mut out)?;
        Ok(out)
    }

    fn walk(
        &mut self,
        dir: &DirectoryRecord,
        parent_path: &str,
        include_files: bool,
        out: &mut Vec<DirectoryRecord>,
    ) -> Result<()> {
        let children = self.read_children(dir)?;
        for child in children {
            let full_path = format!("{}/{}", parent_path, child.name);
            let mut named = child.clone();
            named.name = full_path.clone();

            if named.is_directory() {
                out.push(named);
                self.walk(&child, &full_path, include_files, out)?;
            }
            else if include_files {
                out.push(named);
            }
        }
        Ok(())
    }

    /// Reads a record's full extent contents.
    pub fn get_file_by_record(&mut self, record: &DirectoryRecord) -> Result<Vec<u8>> {
        self.read_extent(record)
    }

    /// Reads the 16-sector (32768-byte) boot image starting at disc LBA `lba` (45000 by default).
    pub fn get_bootsector(&mut self, lba: u64) -> Result<Vec<u8>> {
        self.read_raw(lba * SECTOR_SIZE as u64, crate::BOOTSECTOR_SIZE as usize)
    }

    /// Decodes a record's 7-byte ISO9660 timestamp.
    pub fn record_timestamp(&self, record: &DirectoryRecord) -> RecordTimestamp {
        record.date.to_timestamp()
    }

    /// A human-readable rendering of a record's timestamp, or `None` if unset.
    pub fn record_time_string(&self, record: &DirectoryRecord) -> Option<String> {
        if record.date.year_since_1900 == 0 {
            return None;
        }
        Some(format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            1900 + record.date.year_since_1900 as u32,
            record.date.month,
            record.date.day,
            record.date.hour,
            record.date.minute,
            record.date.second
        ))
    }
}
