use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use log::{debug, info, warn};

use crate::classifier::{self, ClassifyError};
use crate::config::EncodeSettings;
use crate::handbrake::HandBrake;
use crate::probe::{Disc, Title};

/// Fully-resolved options for one HandBrakeCLI encode of one title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub title: u32,
    /// Comma-separated subtitle track selectors, e.g. "scan,2". `None` when
    /// no track was selected, in which case the option is omitted entirely.
    pub subtitle: Option<String>,
    /// "scan" when foreign-subtitle burn-in was requested.
    pub subtitle_forced: Option<String>,
    pub subtitle_burn: Option<String>,
}

impl EncodeArgs {
    /// Flatten into long-form `--name value` pairs, always in the same
    /// order: input, output, title, subtitle-forced, subtitle-burn,
    /// subtitle.
    pub fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec![
            "--input".to_string(),
            self.input.display().to_string(),
            "--output".to_string(),
            self.output.display().to_string(),
            "--title".to_string(),
            self.title.to_string(),
        ];
        if let Some(value) = &self.subtitle_forced {
            args.push("--subtitle-forced".to_string());
            args.push(value.clone());
        }
        if let Some(value) = &self.subtitle_burn {
            args.push("--subtitle-burn".to_string());
            args.push(value.clone());
        }
        if let Some(value) = &self.subtitle {
            args.push("--subtitle".to_string());
            args.push(value.clone());
        }
        args
    }
}

/// Build the encoder options for one title. Pure and deterministic; neither
/// the disc nor the title is touched.
pub fn build_args(disc: &Disc, title: &Title, settings: &EncodeSettings) -> EncodeArgs {
    let output = settings
        .output_dir
        .join(format!("{} - {}.{}", disc.name, title.id, settings.extension));

    let mut selected: Vec<String> = Vec::new();
    let mut subtitle_forced = None;
    let mut subtitle_burn = None;

    if settings.burn_foreign_subs {
        // "scan" is the encoder's own foreign-audio search: it finds
        // subtitles that play over non-native dialogue and burns them in.
        selected.push("scan".to_string());
        subtitle_forced = Some("scan".to_string());
        subtitle_burn = Some("scan".to_string());
    }

    for lang in &settings.sub_langs {
        match lowest_track_for_lang(&title.subtitles, lang) {
            Some(track) => {
                debug!("found {lang} subtitle as track {track} on title {}", title.id);
                selected.push(track.to_string());
            }
            None => warn!("didn't find a {lang} subtitle track on title {}, ignoring", title.id),
        }
    }

    EncodeArgs {
        input: disc.source_path.clone(),
        output,
        title: title.id,
        subtitle: if selected.is_empty() {
            None
        } else {
            Some(selected.join(","))
        },
        subtitle_forced,
        subtitle_burn,
    }
}

// Lowest track number matching the language. Same-language tracks usually
// put the ordinary dialogue subtitles first and commentary on higher
// numbers, so ascending order picks the right one.
fn lowest_track_for_lang(subtitles: &BTreeMap<u32, String>, lang: &str) -> Option<u32> {
    subtitles
        .iter()
        .find(|(_, code)| code.as_str() == lang)
        .map(|(track, _)| *track)
}

/// Decide what to encode from a disc and build the per-title option sets.
///
/// Runs the episode filter when TV detection is on (its failure propagates
/// so the caller can skip the disc), then applies the duplicate policy:
/// flagged titles are removed when duplicate detection is enabled, otherwise
/// only reported so the user can verify them by hand.
pub fn plan_disc(disc: &Disc, settings: &EncodeSettings) -> Result<Vec<EncodeArgs>, ClassifyError> {
    let mut titles: Vec<Title> = disc.titles.clone();

    if settings.tv_detection {
        titles = classifier::filter_episodes(&titles, settings.threshold)?;
    }

    let duplicates = classifier::find_duplicates(&titles);
    if !duplicates.is_empty() {
        if settings.duplicate_detection {
            info!("Skipping the following titles because they look like duplicates. Please verify manually!");
            titles.retain(|t| !duplicates.contains(&t.id));
        } else {
            info!("Potential duplicate titles found. Add --duplicate-detection to filter the following out:");
        }
        for id in &duplicates {
            info!("  title {id}");
        }
    }

    Ok(titles
        .iter()
        .map(|title| build_args(disc, title, settings))
        .collect())
}

/// Encode (or simulate) every planned title of a disc, strictly in order.
pub async fn encode_disc(disc: &Disc, settings: &EncodeSettings, hb: &HandBrake) -> Result<()> {
    for args in plan_disc(disc, settings)? {
        if args.output.is_file() {
            // Existing outputs are not skipped, only flagged.
            warn!("{} already exists, encoding anyway", args.output.display());
        }

        if settings.simulate {
            hb.simulate(&args, &settings.passthrough_args);
        } else {
            hb.encode(&args, &settings.passthrough_args).await?;
        }
    }
    Ok(())
}
