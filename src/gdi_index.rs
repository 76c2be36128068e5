//! Parses a `.gdi` manifest and builds the parameter records (track descriptors, offsets,
//! wormhole ranges) consumed by the rest of the view stack.

use std::{
    fmt,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    concat_view::ConcatView,
    offset_view::OffsetView,
    sector_image::SectorImage,
    wormhole_view::WormholeView,
    GditoolsError,
    Result,
    HIGH_DENSITY_LBA,
    WORMHOLE_SECTORS,
};

/// Width, in bytes, of a sector as stored in a physical track file.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SectorMode {
    /// Raw 2048-byte user-data sectors, as in a plain `.iso`.
    Mode2048,
    /// Full 2352-byte CD sectors (16-byte sync/header + 2048-byte payload + 288-byte EDC/ECC).
    Mode2352,
}

impl SectorMode {
    /// Infers a sector mode from a track file's extension: `.iso` => 2048, `.bin` => 2352.
    /// Returns `None` for any other extension, so the caller can surface `BadSectorMode`.
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
            Some(ext) if ext == "iso" => Some(SectorMode::Mode2048),
            Some(ext) if ext == "bin" => Some(SectorMode::Mode2352),
            _ => None,
        }
    }

    /// Parses the numeric sector-mode field (`2048` or `2352`) as it appears in a `.gdi` line.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            2048 => Some(SectorMode::Mode2048),
            2352 => Some(SectorMode::Mode2352),
            _ => None,
        }
    }

    pub fn bytes(self) -> u64 {
        match self {
            SectorMode::Mode2048 => 2048,
            SectorMode::Mode2352 => 2352,
        }
    }
}

impl fmt::Display for SectorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bytes())
    }
}

/// An immutable description of one physical track file named by a `.gdi` manifest.
#[derive(Clone, Debug)]
pub struct TrackDescriptor {
    /// 1-based position of this track within the `.gdi` manifest.
    pub index: u32,
    /// Starting LBA of this track on the original disc.
    pub start_lba: u64,
    /// Sector width as stored in the track file.
    pub mode: SectorMode,
    /// Path to the track file, resolved relative to the `.gdi` manifest's directory.
    pub path: PathBuf,
}

/// A parsed `.gdi` manifest: the TOC track (always present, always at LBA 45000) and an optional
/// trailing data track appended after it.
#[derive(Clone, Debug)]
pub struct GdiIndex {
    pub track_count: u32,
    pub toc: TrackDescriptor,
    pub data: Option<TrackDescriptor>,
    gdi_dir: PathBuf,
}

impl GdiIndex {
    /// Parses the `.gdi` manifest at `path`.
    ///
    /// The manifest's first line is the track count; each following line is
    /// `track_index start_lba unknown sector_mode filename unknown`, whitespace-separated, with
    /// blank lines ignored. Track 3 must be declared at LBA 45000, or this returns
    /// [`GditoolsError::InvalidGdi`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let gdi_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let lines: Vec<Vec<&str>> = text.lines().map(|l| l.split_whitespace().collect()).filter(|v: &Vec<&str>| !v.is_empty()).collect();

        if lines.is_empty() {
            return Err(GditoolsError::InvalidGdi("empty manifest".into()));
        }

        let track_count: u32 = lines[0][0]
            .parse()
            .map_err(|_| GditoolsError::InvalidGdi("unreadable track count on first line".into()))?;

        if track_count < 3 {
            return Err(GditoolsError::InvalidGdi(format!(
                "manifest declares {} tracks, need at least 3 (TOC track)",
                track_count
            )));
        }

        let toc_line = lines.get(3).ok_or_else(|| {
            GditoolsError::InvalidGdi("manifest has no line for track 3 (TOC track)".into())
        })?;
        let toc = parse_track_line(toc_line, &gdi_dir)?;

        if toc.start_lba != HIGH_DENSITY_LBA {
            return Err(GditoolsError::InvalidGdi(format!(
                "track 3 must start at LBA {}, found {}",
                HIGH_DENSITY_LBA, toc.start_lba
            )));
        }

        let data = if track_count > 3 {
            let data_line = lines.get(track_count as usize).ok_or_else(|| {
                GditoolsError::InvalidGdi(format!("manifest has no line for track {}", track_count))
            })?;
            Some(parse_track_line(data_line, &gdi_dir)?)
        }
        else {
            None
        };

        log::debug!(
            "GdiIndex::open(): {} tracks, toc={:?}, data={:?}",
            track_count,
            toc.path,
            data.as_ref().map(|d| &d.path)
        );

        Ok(GdiIndex {
            track_count,
            toc,
            data,
            gdi_dir,
        })
    }

    pub fn gdi_dir(&self) -> &Path {
        &self.gdi_dir
    }

    /// Builds the complete, ready-to-read logical stream: TOC track wrapped in its offset +
    /// wormhole, concatenated with the data track (if any), wrapped in its own (empty) wormhole.
    pub fn build_view(&self) -> Result<ConcatView> {
        let toc_image = SectorImage::open(&self.toc.path, Some(self.toc.mode))?;
        let toc_logical_len = toc_image.length();
        let toc_offset = OffsetView::new(toc_image, HIGH_DENSITY_LBA * 2048);
        let toc_wormhole = WormholeView::new(toc_offset, 0, HIGH_DENSITY_LBA * 2048, WORMHOLE_SECTORS * 2048)?;

        let data_wormhole = match &self.data {
            Some(track) => {
                let toc_sectors = toc_logical_len / 2048;
                let threshold = HIGH_DENSITY_LBA + toc_sectors;
                if track.start_lba < threshold {
                    return Err(GditoolsError::InvalidGdi(format!(
                        "track {} LBA {} is before the end of the TOC track (LBA {}); negative data offset",
                        track.index, track.start_lba, threshold
                    )));
                }
                let offset = 2048 * (track.start_lba - threshold);
                let image = SectorImage::open(&track.path, Some(track.mode))?;
                let view = OffsetView::new(image, offset);
                Some(WormholeView::new(view, 0, 0, 0)?)
            }
            None => None,
        };

        Ok(ConcatView::new(toc_wormhole, data_wormhole))
    }

    /// A human-readable summary of the parsed manifest, in the spirit of the original tool's
    /// verbose startup banner.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Number of tracks: {}\n", self.track_count));
        out.push_str(&format!(
            "TOC track:\n\tFilename:  {}\n\tLBA:       {}\n\tMode:      {} bytes/sector\n",
            self.toc.path.display(),
            self.toc.start_lba,
            self.toc.mode
        ));
        if let Some(data) = &self.data {
            out.push_str(&format!(
                "DATA track:\n\tFilename:  {}\n\tLBA:       {}\n\tMode:      {} bytes/sector\n",
                data.path.display(),
                data.start_lba,
                data.mode
            ));
        }
        out
    }
}

fn parse_track_line(fields: &[&str], gdi_dir: &Path) -> Result<TrackDescriptor> {
    if fields.len() < 5 {
        return Err(GditoolsError::InvalidGdi(format!(
            "track line has {} fields, expected at least 5",
            fields.len()
        )));
    }

    let index: u32 = fields[0]
        .parse()
        .map_err(|_| GditoolsError::InvalidGdi(format!("bad track index: {}", fields[0])))?;
    let start_lba: u64 = fields[1]
        .parse()
        .map_err(|_| GditoolsError::InvalidGdi(format!("bad start LBA: {}", fields[1])))?;
    let mode_code: u32 = fields[3]
        .parse()
        .map_err(|_| GditoolsError::InvalidGdi(format!("bad sector mode: {}", fields[3])))?;
    let mode = SectorMode::from_code(mode_code)
        .ok_or_else(|| GditoolsError::InvalidGdi(format!("unsupported sector mode: {}", mode_code)))?;
    let path = gdi_dir.join(fields[4]);

    Ok(TrackDescriptor {
        index,
        start_lba,
        mode,
        path,
    })
}
