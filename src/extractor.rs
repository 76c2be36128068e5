//! Drives an [`Iso9660Reader`] to dump file contents, the boot sector, and `sorttxt` disc-order
//! listings to the host filesystem.

use std::{
    fs,
    path::{Path, PathBuf},
};

use filetime::{set_file_mtime, FileTime};

use crate::{
    iso9660::{DirectoryRecord, Iso9660Reader, RecordTimestamp},
    Result,
};

/// Which directory-record field `sorttxt` orders by, and in which direction.
///
/// The reference tool selects both via the case of a single string (`"ex_loc"` ascending,
/// `"EX_LOC"` descending); this crate validates the choice at parse time instead of relying on
/// runtime case-sensitivity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortCriterion {
    ExtentLbaAscending,
    ExtentLbaDescending,
    NameAscending,
    NameDescending,
    ExtentLengthAscending,
    ExtentLengthDescending,
}

/// Outcome of [`Extractor::dump_all`]: which files were written, and, in best-effort mode, which
/// ones failed and why.
#[derive(Debug, Default)]
pub struct DumpAllReport {
    pub extracted: Vec<PathBuf>,
    pub failed: Vec<(String, crate::GditoolsError)>,
}

/// Extracts files, the boot sector, and `sorttxt` listings out of an [`Iso9660Reader`].
pub struct Extractor {
    reader: Iso9660Reader,
}

impl Extractor {
    pub fn new(reader: Iso9660Reader) -> Self {
        Extractor { reader }
    }

    pub fn reader(&mut self) -> &mut Iso9660Reader {
        &mut self.reader
    }

    /// Writes `record`'s extent contents into `target_dir`, recreating the record's own
    /// directory-relative name under it. If `keep_timestamp`, applies the record's decoded
    /// modification time to the written file.
    pub fn dump_file(&mut self, record: &DirectoryRecord, target_dir: &Path, keep_timestamp: bool) -> Result<PathBuf> {
        let relative = record.name.trim_start_matches('/');
        let out_path = target_dir.join(relative);

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = self.reader.get_file_by_record(record)?;
        let mut sink = fs::File::create(&out_path)?;
        crate::util::copy_buffered(&mut std::io::Cursor::new(&data), &mut sink, data.len() as u64)?;
        drop(sink);

        if keep_timestamp {
            if let RecordTimestamp::Known(secs) = self.reader.record_timestamp(record) {
                let _ = set_file_mtime(&out_path, FileTime::from_unix_time(secs, 0));
            }
        }

        log::info!("dumped {} -> {}", record.name, out_path.display());
        Ok(out_path)
    }

    /// Extracts every file record, sorted by ascending `extent_lba` to minimize backwards seeks
    /// on rotating media.
    ///
    /// By default (`best_effort = false`) the first failing file aborts the whole operation,
    /// returning its error. With `best_effort = true`, a failing file is logged and recorded in
    /// the returned [`DumpAllReport`], and extraction continues with the remaining files.
    pub fn dump_all(&mut self, target_dir: &Path, keep_timestamp: bool, best_effort: bool) -> Result<DumpAllReport> {
        let mut records: Vec<DirectoryRecord> = self
            .reader
            .gen_records(true)?
            .into_iter()
            .filter(|r| !r.is_directory())
            .collect();
        records.sort_by_key(|r| r.extent_lba);

        let mut report = DumpAllReport::default();
        for record in &records {
            match self.dump_file(record, target_dir, keep_timestamp) {
                Ok(path) => report.extracted.push(path),
                Err(err) if best_effort => {
                    log::warn!("failed to dump {}: {}", record.name, err);
                    report.failed.push((record.name.clone(), err));
                }
                Err(err) => return Err(err),
            }
        }
        Ok(report)
    }

    /// Writes the 16-sector boot image to `path`.
    pub fn dump_bootsector(&mut self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = self.reader.get_bootsector(crate::HIGH_DENSITY_LBA)?;
        fs::write(path, &data)?;
        Ok(())
    }

    /// Builds a `sorttxt` listing: one CRLF-terminated line per file record, in the order and
    /// rank `criterion` implies, plus an optional trailing dummy-file line.
    pub fn sorttxt(
        &mut self,
        criterion: SortCriterion,
        prefix: &str,
        dummy: Option<&str>,
        spacer: u32,
    ) -> Result<String> {
        let mut records: Vec<DirectoryRecord> = self
            .reader
            .gen_records(true)?
            .into_iter()
            .filter(|r| !r.is_directory())
            .collect();

        match criterion {
            SortCriterion::ExtentLbaAscending => records.sort_by_key(|r| r.extent_lba),
            SortCriterion::ExtentLbaDescending => {
                records.sort_by_key(|r| std::cmp::Reverse(r.extent_lba))
            }
            SortCriterion::NameAscending => records.sort_by(|a, b| a.name.cmp(&b.name)),
            SortCriterion::NameDescending => records.sort_by(|a, b| b.name.cmp(&a.name)),
            SortCriterion::ExtentLengthAscending => records.sort_by_key(|r| r.extent_length),
            SortCriterion::ExtentLengthDescending => {
                records.sort_by_key(|r| std::cmp::Reverse(r.extent_length))
            }
        }

        let prefix = prefix.trim_end_matches('/');
        let mut out = String::new();
        for (i, record) in records.iter().enumerate() {
            let rank = (i as u32 + 1) * spacer;
            out.push_str(&format!("{}{} {}\r\n", prefix, record.name, rank));
        }

        if let Some(dummy) = dummy {
            let dummy_name = if dummy.starts_with('/') {
                dummy.to_string()
            }
            else {
                format!("/{}", dummy)
            };
            let rank = (records.len() as u32 + 1) * spacer;
            out.push_str(&format!("{}{} {}\r\n", prefix, dummy_name, rank));
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        concat_view::ConcatView, iso9660::RecordFlags, offset_view::OffsetView,
        sector_image::SectorImage, wormhole_view::WormholeView, SectorMode,
    };
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn build_image_with_files(files: &[(&str, &[u8], u32)]) -> ConcatView {
        let sector_size = 2048usize;
        let mut image = vec![0u8; 20 * sector_size];

        image[16 * sector_size] = 1;
        image[16 * sector_size + 1..16 * sector_size + 6].copy_from_slice(b"CD001");
        image[16 * sector_size + 6] = 1;

        let root_off = 16 * sector_size + 156;
        image[root_off] = 34;
        image[root_off + 2..root_off + 6].copy_from_slice(&17u32.to_le_bytes());
        image[root_off + 10..root_off + 14].copy_from_slice(&2048u32.to_le_bytes());
        image[root_off + 25] = RecordFlags::DIRECTORY.bits();
        image[root_off + 32] = 1;
        image[root_off + 33] = 0x00;

        let dir_off = 17 * sector_size;
        let mut pos = dir_off;
        for &(marker, _, _) in &[(0x00u8, &[][..], 0u32), (0x01, &[], 0)] {
            let mut r = vec![0u8; 34];
            r[0] = 34;
            r[2..6].copy_from_slice(&17u32.to_le_bytes());
            r[10..14].copy_from_slice(&2048u32.to_le_bytes());
            r[25] = RecordFlags::DIRECTORY.bits();
            r[32] = 1;
            r[33] = marker;
            image[pos..pos + r.len()].copy_from_slice(&r);
            pos += r.len();
        }

        for &(name, contents, lba) in files {
            let name_bytes = format!("{};1", name).into_bytes();
            let record_length = 33 + name_bytes.len() + (name_bytes.len() % 2);
            let mut r = vec![0u8; record_length];
            r[0] = record_length as u8;
            r[2..6].copy_from_slice(&lba.to_le_bytes());
            r[10..14].copy_from_slice(&(contents.len() as u32).to_le_bytes());
            r[32] = name_bytes.len() as u8;
            r[33..33 + name_bytes.len()].copy_from_slice(&name_bytes);
            image[pos..pos + r.len()].copy_from_slice(&r);
            pos += r.len();

            let file_off = lba as usize * sector_size;
            image[file_off..file_off + contents.len()].copy_from_slice(contents);
        }

        let mut f = NamedTempFile::with_suffix(".iso").unwrap();
        f.write_all(&image).unwrap();
        f.flush().unwrap();

        let sector_image = SectorImage::open(f.path(), Some(SectorMode::Mode2048)).unwrap();
        let offset_view = OffsetView::new(sector_image, 0);
        let wormhole = WormholeView::new(offset_view, 0, 0, 0).unwrap();
        ConcatView::new(wormhole, None)
    }

    #[test]
    fn sorttxt_ascending_with_dummy_matches_reference_format() {
        let view = build_image_with_files(&[
            ("FILE_AT_100", b"a", 100),
            ("FILE_AT_200", b"b", 200),
            ("FILE_AT_300", b"c", 300),
            ("FILE_AT_400", b"d", 400),
        ]);
        let reader = Iso9660Reader::open(view).unwrap();
        let mut extractor = Extractor::new(reader);

        let listing = extractor
            .sorttxt(SortCriterion::ExtentLbaAscending, "game/", Some("0.0"), 2)
            .unwrap();

        assert_eq!(
            listing,
            "game/FILE_AT_100 2\r\ngame/FILE_AT_200 4\r\ngame/FILE_AT_300 6\r\ngame/FILE_AT_400 8\r\ngame/0.0 10\r\n"
        );
    }

    #[test]
    fn sorttxt_descending_reverses_order() {
        let view = build_image_with_files(&[("A", b"x", 100), ("B", b"y", 200)]);
        let reader = Iso9660Reader::open(view).unwrap();
        let mut extractor = Extractor::new(reader);

        let listing = extractor
            .sorttxt(SortCriterion::ExtentLbaDescending, "data", None, 1)
            .unwrap();
        assert_eq!(listing, "data/B 1\r\ndata/A 2\r\n");
    }

    #[test]
    fn dump_file_writes_exact_bytes() {
        let view = build_image_with_files(&[("README.TXT", b"HELLO", 100)]);
        let reader = Iso9660Reader::open(view).unwrap();
        let mut extractor = Extractor::new(reader);

        let record = extractor.reader().get_record("/README.TXT").unwrap();
        let dir = tempdir().unwrap();
        let out_path = extractor.dump_file(&record, dir.path(), false).unwrap();

        assert_eq!(fs::read(&out_path).unwrap(), b"HELLO");
    }

    #[test]
    fn dump_all_writes_every_file() {
        let view = build_image_with_files(&[("A.TXT", b"1", 100), ("B.TXT", b"22", 200)]);
        let reader = Iso9660Reader::open(view).unwrap();
        let mut extractor = Extractor::new(reader);

        let dir = tempdir().unwrap();
        let report = extractor.dump_all(dir.path(), false, false).unwrap();
        assert_eq!(report.extracted.len(), 2);
        assert!(report.failed.is_empty());
        for path in report.extracted {
            assert!(path.exists());
        }
    }

    #[test]
    fn dump_all_best_effort_continues_past_a_failing_file() {
        // B.TXT claims an extent_length that runs past the end of the backing image, so its
        // buffered copy hits a short read and fails; A.TXT is a normal record and should still
        // be dumped regardless of where in iteration order the failure happens.
        let sector_size = 2048usize;
        let mut image = vec![0u8; 20 * sector_size];

        image[16 * sector_size] = 1;
        image[16 * sector_size + 1..16 * sector_size + 6].copy_from_slice(b"CD001");
        image[16 * sector_size + 6] = 1;

        let root_off = 16 * sector_size + 156;
        image[root_off] = 34;
        image[root_off + 2..root_off + 6].copy_from_slice(&17u32.to_le_bytes());
        image[root_off + 10..root_off + 14].copy_from_slice(&2048u32.to_le_bytes());
        image[root_off + 25] = RecordFlags::DIRECTORY.bits();
        image[root_off + 32] = 1;
        image[root_off + 33] = 0x00;

        let dir_off = 17 * sector_size;
        let mut pos = dir_off;
        for marker in [0x00u8, 0x01] {
            let mut r = vec![0u8; 34];
            r[0] = 34;
            r[2..6].copy_from_slice(&17u32.to_le_bytes());
            r[10..14].copy_from_slice(&2048u32.to_le_bytes());
            r[25] = RecordFlags::DIRECTORY.bits();
            r[32] = 1;
            r[33] = marker;
            image[pos..pos + r.len()].copy_from_slice(&r);
            pos += r.len();
        }

        // A.TXT: a real, fully present 1-byte file at sector 18.
        {
            let name_bytes = b"A.TXT;1";
            let record_length = 33 + name_bytes.len() + (name_bytes.len() % 2);
            let mut r = vec![0u8; record_length];
            r[0] = record_length as u8;
            r[2..6].copy_from_slice(&18u32.to_le_bytes());
            r[10..14].copy_from_slice(&1u32.to_le_bytes());
            r[32] = name_bytes.len() as u8;
            r[33..33 + name_bytes.len()].copy_from_slice(name_bytes);
            image[pos..pos + r.len()].copy_from_slice(&r);
            pos += r.len();
            image[18 * sector_size] = b'1';
        }

        // B.TXT: claims 5000 bytes starting at sector 19, but the image only has one sector
        // (2048 bytes) left after that, so the extent runs off the end.
        {
            let name_bytes = b"B.TXT;1";
            let record_length = 33 + name_bytes.len() + (name_bytes.len() % 2);
            let mut r = vec![0u8; record_length];
            r[0] = record_length as u8;
            r[2..6].copy_from_slice(&19u32.to_le_bytes());
            r[10..14].copy_from_slice(&5000u32.to_le_bytes());
            r[32] = name_bytes.len() as u8;
            r[33..33 + name_bytes.len()].copy_from_slice(name_bytes);
            image[pos..pos + r.len()].copy_from_slice(&r);
        }

        let mut f = NamedTempFile::with_suffix(".iso").unwrap();
        f.write_all(&image).unwrap();
        f.flush().unwrap();

        let sector_image = SectorImage::open(f.path(), Some(SectorMode::Mode2048)).unwrap();
        let offset_view = OffsetView::new(sector_image, 0);
        let wormhole = WormholeView::new(offset_view, 0, 0, 0).unwrap();
        let view = ConcatView::new(wormhole, None);

        let reader = Iso9660Reader::open(view).unwrap();
        let mut extractor = Extractor::new(reader);

        let dir = tempdir().unwrap();
        let report = extractor.dump_all(dir.path(), false, true).unwrap();
        assert_eq!(report.extracted.len(), 1);
        assert_eq!(report.extracted[0].file_name().unwrap(), "A.TXT");
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "/B.TXT");

        let dir2 = tempdir().unwrap();
        let reader2 = Iso9660Reader::open({
            let sector_image = SectorImage::open(f.path(), Some(SectorMode::Mode2048)).unwrap();
            let offset_view = OffsetView::new(sector_image, 0);
            let wormhole = WormholeView::new(offset_view, 0, 0, 0).unwrap();
            ConcatView::new(wormhole, None)
        })
        .unwrap();
        let mut extractor2 = Extractor::new(reader2);
        assert!(extractor2.dump_all(dir2.path(), false, false).is_err());
    }
}
