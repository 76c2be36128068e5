//! The ISO9660 Primary Volume Descriptor, read straight out of logical sector 16 of the
//! [`ConcatView`](crate::ConcatView).

use binrw::binrw;

use crate::{GditoolsError, Result};

const STANDARD_IDENTIFIER: &[u8; 5] = b"CD001";

/// The 2048-byte Primary Volume Descriptor. Only the fields this crate actually uses are broken
/// out by name; the rest of the sector (volume set/publisher/application identifiers, dates, the
/// application-use area) is skipped over but still consumed so the struct's size matches the
/// standard's layout.
#[binrw]
#[brw(little)]
#[br(magic = 1u8)]
pub struct PrimaryVolumeDescriptor {
    pub standard_identifier: [u8; 5],
    pub version: u8,
    _unused_1: u8,
    pub system_identifier: [u8; 32],
    pub volume_identifier: [u8; 32],
    _unused_2: [u8; 8],
    pub volume_space_size_lsb: u32,
    pub volume_space_size_msb: u32,
    _unused_3: [u8; 32],
    pub volume_set_size: [u8; 4],
    pub volume_sequence_number: [u8; 4],
    pub logical_block_size_lsb: u16,
    pub logical_block_size_msb: u16,
    pub path_table_size: [u8; 8],
    pub path_table_l_location: u32,
    pub optional_path_table_l_location: u32,
    pub path_table_m_location: u32,
    pub optional_path_table_m_location: u32,
    /// Raw bytes of the 34-byte root directory record; decoded on demand via
    /// [`DirectoryRecord::parse`](crate::iso9660::DirectoryRecord::parse).
    pub root_directory_record: [u8; 34],
    pub volume_set_identifier: [u8; 128],
    pub publisher_identifier: [u8; 128],
    pub data_preparer_identifier: [u8; 128],
    pub application_identifier: [u8; 128],
    pub copyright_file_identifier: [u8; 37],
    pub abstract_file_identifier: [u8; 37],
    pub bibliographic_file_identifier: [u8; 37],
    pub creation_date: [u8; 17],
    pub modification_date: [u8; 17],
    pub expiration_date: [u8; 17],
    pub effective_date: [u8; 17],
    pub file_structure_version: u8,
}

impl PrimaryVolumeDescriptor {
    /// Decodes a 2048-byte sector as a PVD, validating the `CD001` standard identifier and
    /// descriptor version.
    pub fn parse(sector: &[u8; 2048]) -> Result<Self> {
        let mut cursor = std::io::Cursor::new(&sector[..]);
        let pvd: PrimaryVolumeDescriptor =
            binrw::BinRead::read(&mut cursor).map_err(|_| GditoolsError::BadVolumeDescriptor)?;

        if &pvd.standard_identifier != STANDARD_IDENTIFIER || pvd.version != 1 {
            return Err(GditoolsError::BadVolumeDescriptor);
        }

        Ok(pvd)
    }

    /// The volume label (volume identifier), with trailing ISO9660 padding spaces trimmed.
    pub fn volume_label(&self) -> String {
        String::from_utf8_lossy(&self.volume_identifier)
            .trim_end()
            .to_string()
    }

    pub fn logical_block_size(&self) -> u16 {
        self.logical_block_size_lsb
    }

    pub fn volume_space_size(&self) -> u32 {
        self.volume_space_size_lsb
    }
}
