//! Decodes a single ISO9660 directory record out of a directory extent buffer.

use bitflags::bitflags;

use crate::{iso9660::date_time::RawRecordDate, GditoolsError, Result};

bitflags! {
    /// File flags byte of a directory record (ECMA-119 §9.1.6).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct RecordFlags: u8 {
        const HIDDEN      = 0b0000_0001;
        const DIRECTORY   = 0b0000_0010;
        const ASSOCIATED  = 0b0000_0100;
        const RECORD      = 0b0000_1000;
        const PROTECTION  = 0b0001_0000;
        const MULTI_EXTENT = 0b1000_0000;
    }
}

/// A decoded directory record. `name` is the fully qualified path from the volume root, populated
/// by the caller during tree traversal; a record returned directly from [`DirectoryRecord::parse`]
/// carries only its own (unqualified) identifier in `name`.
#[derive(Clone, Debug)]
pub struct DirectoryRecord {
    pub name: String,
    pub flags: RecordFlags,
    pub extent_lba: u32,
    pub extent_length: u32,
    pub date: RawRecordDate,
}

impl DirectoryRecord {
    pub fn is_directory(&self) -> bool {
        self.flags.contains(RecordFlags::DIRECTORY)
    }

    /// Parses one directory record starting at `buf[offset..]`.
    ///
    /// Returns `Ok(None)` if the record length byte is 0, meaning the remainder of the current
    /// 2048-byte sector is padding and the caller should advance to the next sector within the
    /// extent. Returns `Ok(Some((record, record_length)))` otherwise.
    pub fn parse(buf: &[u8], offset: usize) -> Result<Option<(DirectoryRecord, usize)>> {
        if offset >= buf.len() {
            return Ok(None);
        }

        let record_length = buf[offset] as usize;
        if record_length == 0 {
            return Ok(None);
        }

        if offset + record_length > buf.len() || record_length < 34 {
            return Err(GditoolsError::TruncatedRead);
        }

        let record = &buf[offset..offset + record_length];

        let extent_lba = u32::from_le_bytes(record[2..6].try_into().unwrap());
        let extent_length = u32::from_le_bytes(record[10..14].try_into().unwrap());
        let date_bytes: [u8; 7] = record[18..25].try_into().unwrap();
        let date = RawRecordDate::from_bytes(date_bytes);
        let flags = RecordFlags::from_bits_truncate(record[25]);
        let name_length = record[32] as usize;

        if 33 + name_length > record_length {
            return Err(GditoolsError::TruncatedRead);
        }
        let name_bytes = &record[33..33 + name_length];

        let name = decode_identifier(name_bytes);

        log::trace!(
            "DirectoryRecord::parse(): name={:?} lba={} len={} flags={:?}",
            name,
            extent_lba,
            extent_length,
            flags
        );

        Ok(Some((
            DirectoryRecord {
                name,
                flags,
                extent_lba,
                extent_length,
                date,
            },
            record_length,
        )))
    }
}

/// Decodes a directory record's identifier field. The self (`0x00`) and parent (`0x01`) directory
/// entries are single-byte sentinels; everything else is d-characters, optionally with a trailing
/// `;version` that most GD-ROM authoring tools still emit even for directories.
fn decode_identifier(raw: &[u8]) -> String {
    if raw.len() == 1 && (raw[0] == 0x00 || raw[0] == 0x01) {
        return String::from_utf8_lossy(raw).to_string();
    }
    let text = String::from_utf8_lossy(raw);
    match text.find(';') {
        Some(idx) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_record(name: &str, flags: RecordFlags, extent_lba: u32, extent_length: u32) -> Vec<u8> {
        let mut name_bytes = name.as_bytes().to_vec();
        if name_bytes.len() % 2 == 0 {
            name_bytes.push(0); // padding byte to keep the record an even length
        }
        let record_length = 33 + name_bytes.len();
        let mut buf = vec![0u8; record_length];
        buf[0] = record_length as u8;
        buf[2..6].copy_from_slice(&extent_lba.to_le_bytes());
        buf[6..10].copy_from_slice(&extent_lba.to_be_bytes());
        buf[10..14].copy_from_slice(&extent_length.to_le_bytes());
        buf[14..18].copy_from_slice(&extent_length.to_be_bytes());
        buf[25] = flags.bits();
        buf[32] = name.as_bytes().len() as u8;
        buf[33..33 + name.as_bytes().len()].copy_from_slice(name.as_bytes());
        buf
    }

    #[test]
    fn parses_file_record() {
        let buf = build_record("README.TXT;1", RecordFlags::empty(), 100, 11);
        let (record, len) = DirectoryRecord::parse(&buf, 0).unwrap().unwrap();
        assert_eq!(record.name, "README.TXT");
        assert_eq!(record.extent_lba, 100);
        assert_eq!(record.extent_length, 11);
        assert!(!record.is_directory());
        assert_eq!(len, buf.len());
    }

    #[test]
    fn parses_directory_record() {
        let buf = build_record("DATA", RecordFlags::DIRECTORY, 200, 2048);
        let (record, _) = DirectoryRecord::parse(&buf, 0).unwrap().unwrap();
        assert!(record.is_directory());
    }

    #[test]
    fn zero_length_byte_signals_padding() {
        let buf = vec![0u8; 10];
        let result = DirectoryRecord::parse(&buf, 0).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn truncated_record_is_an_error() {
        let mut buf = build_record("README.TXT;1", RecordFlags::empty(), 100, 11);
        buf[0] = 255; // claims far more bytes than the buffer has
        let err = DirectoryRecord::parse(&buf, 0).unwrap_err();
        assert!(matches!(err, GditoolsError::TruncatedRead));
    }

    #[test]
    fn self_and_parent_entries_decode_as_single_byte() {
        let buf = {
            let record_length = 34usize;
            let mut buf = vec![0u8; record_length];
            buf[0] = record_length as u8;
            buf[32] = 1;
            buf[33] = 0x00;
            buf
        };
        let (record, _) = DirectoryRecord::parse(&buf, 0).unwrap().unwrap();
        assert_eq!(record.name.as_bytes(), [0x00]);
    }
}
