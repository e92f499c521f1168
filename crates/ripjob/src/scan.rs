use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{debug, warn};
use walkdir::WalkDir;

/// File extensions that are a disc source on their own.
const DISC_IMAGE_EXTENSIONS: &[&str] = &["iso"];

/// File extensions that mark a directory as a ripped DVD structure.
const DISC_FOLDER_EXTENSIONS: &[&str] = &["ifo", "vob"];

/// Find candidate disc sources under a root directory.
///
/// A `.iso` file is one source. A directory holding `.ifo`/`.vob` files is
/// one source, except that a directory literally named `video_ts` yields its
/// parent instead, so the output video is named after the disc folder. When
/// nothing at all is found, the root itself is returned as the only
/// candidate.
pub fn find_disc_sources(root: &Path) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("error reading directory entry: {e}");
                continue;
            }
        };
        let path = entry.path();

        if entry.file_type().is_file() {
            if has_extension_in(path, DISC_IMAGE_EXTENSIONS) {
                debug!("found disc image: {}", path.display());
                sources.push(path.to_path_buf());
            }
        } else if entry.file_type().is_dir() && dir_has_disc_files(path) {
            let is_video_ts = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.eq_ignore_ascii_case("video_ts"))
                .unwrap_or(false);

            if is_video_ts {
                if let Some(parent) = path.parent() {
                    debug!("found disc folder: {}", parent.display());
                    sources.push(parent.to_path_buf());
                }
            } else {
                debug!("found disc folder: {}", path.display());
                sources.push(path.to_path_buf());
            }
        }
    }

    if sources.is_empty() {
        sources.push(root.to_path_buf());
    }
    Ok(sources)
}

fn dir_has_disc_files(dir: &Path) -> bool {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("couldn't list {}: {e}", dir.display());
            return false;
        }
    };
    entries
        .flatten()
        .any(|entry| has_extension_in(&entry.path(), DISC_FOLDER_EXTENSIONS))
}

fn has_extension_in(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|want| ext.eq_ignore_ascii_case(want)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn iso_files_are_sources() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("Season1Disc1.iso"));
        touch(&root.path().join("notes.txt"));

        let sources = find_disc_sources(root.path()).unwrap();
        assert_eq!(sources, vec![root.path().join("Season1Disc1.iso")]);
    }

    #[test]
    fn iso_extension_match_is_case_insensitive() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("Disc.ISO"));

        let sources = find_disc_sources(root.path()).unwrap();
        assert_eq!(sources, vec![root.path().join("Disc.ISO")]);
    }

    #[test]
    fn dvd_folder_is_a_source() {
        let root = tempfile::tempdir().unwrap();
        let disc = root.path().join("SomeShow");
        fs::create_dir(&disc).unwrap();
        touch(&disc.join("VTS_01_0.VOB"));

        let sources = find_disc_sources(root.path()).unwrap();
        assert_eq!(sources, vec![disc]);
    }

    #[test]
    fn video_ts_folder_yields_its_parent() {
        let root = tempfile::tempdir().unwrap();
        let disc = root.path().join("SomeShow");
        let video_ts = disc.join("VIDEO_TS");
        fs::create_dir_all(&video_ts).unwrap();
        touch(&video_ts.join("VIDEO_TS.IFO"));

        let sources = find_disc_sources(root.path()).unwrap();
        assert_eq!(sources, vec![disc]);
    }

    #[test]
    fn empty_root_falls_back_to_itself() {
        let root = tempfile::tempdir().unwrap();
        let sources = find_disc_sources(root.path()).unwrap();
        assert_eq!(sources, vec![root.path().to_path_buf()]);
    }
}
