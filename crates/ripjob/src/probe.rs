use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::handbrake::HandBrake;

// Scan-report grammar, one pattern per line kind. Compiled once.
static TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\+ title (\d+)").unwrap());
static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\+ duration: (\d+):(\d+):(\d+)").unwrap());
static SUBTITLE_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\+ subtitle tracks:").unwrap());
static SUBTITLE_TRACK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\+ (\d+),.*\(iso639-2:\s*([A-Za-z]+)\)").unwrap());
static MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\+ ").unwrap());

/// One selectable video track on a disc source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Title {
    /// Source-reported title number (1-based).
    pub id: u32,
    /// Runtime in whole seconds.
    pub duration: u64,
    /// Subtitle track number mapped to its ISO 639-2 language code.
    pub subtitles: BTreeMap<u32, String>,
}

/// A disc image or disc-root folder together with the titles found on it.
#[derive(Debug, Clone, Serialize)]
pub struct Disc {
    /// Path handed to the encoder as `--input`.
    pub source_path: PathBuf,
    /// Base name used for output naming: final path component, extension
    /// stripped.
    pub name: String,
    pub titles: Vec<Title>,
}

impl Disc {
    /// Callers must supply at least one title; the probe is the one place
    /// discs are built and it checks first.
    pub fn new(source_path: PathBuf, titles: Vec<Title>) -> Self {
        debug_assert!(!titles.is_empty());
        let name = source_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| source_path.to_string_lossy().into_owned());
        Self {
            source_path,
            name,
            titles,
        }
    }
}

/// Scan a disc source and build its title inventory.
///
/// Returns `None` when the report contains no title records at all, which is
/// how an unreadable or non-video source shows up.
pub async fn probe_source(hb: &HandBrake, source: &Path) -> Result<Option<Disc>> {
    let report = hb.scan(source).await?;
    let titles = parse_scan_report(&report);
    if titles.is_empty() {
        return Ok(None);
    }
    debug!("parsed {} title(s) from {}", titles.len(), source.display());
    Ok(Some(Disc::new(source.to_path_buf(), titles)))
}

/// Parse the encoder's title-scan report.
///
/// The report repeats one block per title: a `+ title N` marker, a
/// `+ duration: HH:MM:SS` line, then a `+ subtitle tracks:` section whose
/// entries carry `(iso639-2: xxx)` tags. Parsing is best effort: a record
/// missing its duration or subtitle section fails the pattern and is dropped,
/// never raised. A repeated subtitle track number overwrites the earlier
/// entry (last wins).
pub fn parse_scan_report(report: &str) -> Vec<Title> {
    let mut titles = Vec::new();
    let mut current: Option<PartialTitle> = None;
    let mut in_subtitles = false;

    for line in report.lines() {
        if let Some(caps) = TITLE_RE.captures(line) {
            if let Some(done) = current.take() {
                titles.extend(done.finish());
            }
            current = caps[1].parse().ok().map(PartialTitle::new);
            in_subtitles = false;
            continue;
        }

        let Some(record) = current.as_mut() else {
            continue;
        };

        if in_subtitles {
            if let Some(caps) = SUBTITLE_TRACK_RE.captures(line) {
                if let Ok(track) = caps[1].parse() {
                    record.subtitles.insert(track, caps[2].to_string());
                }
            } else if MARKER_RE.is_match(line) {
                // Any other marker line closes the subtitle section.
                in_subtitles = false;
            }
        } else if SUBTITLE_HEADER_RE.is_match(line) {
            record.saw_subtitle_header = true;
            in_subtitles = true;
        } else if record.duration.is_none() {
            if let Some(caps) = DURATION_RE.captures(line) {
                record.duration = duration_seconds(&caps[1], &caps[2], &caps[3]);
            }
        }
    }

    if let Some(done) = current.take() {
        titles.extend(done.finish());
    }
    titles
}

struct PartialTitle {
    id: u32,
    duration: Option<u64>,
    subtitles: BTreeMap<u32, String>,
    saw_subtitle_header: bool,
}

impl PartialTitle {
    fn new(id: u32) -> Self {
        Self {
            id,
            duration: None,
            subtitles: BTreeMap::new(),
            saw_subtitle_header: false,
        }
    }

    fn finish(self) -> Option<Title> {
        match (self.duration, self.saw_subtitle_header) {
            (Some(duration), true) => Some(Title {
                id: self.id,
                duration,
                subtitles: self.subtitles,
            }),
            _ => {
                debug!("dropping incomplete title record {}", self.id);
                None
            }
        }
    }
}

fn duration_seconds(hours: &str, minutes: &str, seconds: &str) -> Option<u64> {
    let hours: u64 = hours.parse().ok()?;
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    Some(hours * 3600 + minutes * 60 + seconds)
}
