use std::path::PathBuf;

/// Process-wide encode settings, resolved once from the command line and
/// shared read-only across every disc in the batch.
#[derive(Debug, Clone)]
pub struct EncodeSettings {
    /// Directory encoded files are written to.
    pub output_dir: PathBuf,
    /// Container extension given to every output file (e.g. mp4, mkv).
    pub extension: String,
    /// The viewer's native language as an ISO 639-2 code (e.g. "eng").
    pub native_lang: String,
    /// Burn any foreign-language subtitles into the video.
    pub burn_foreign_subs: bool,
    /// Soft-subtitle languages to include, in preference order.
    pub sub_langs: Vec<String>,
    /// Only encode titles that look like TV episodes.
    pub tv_detection: bool,
    /// Drop titles whose duration exactly matches an earlier title's.
    pub duplicate_detection: bool,
    /// Episode detection sensitivity, as a fraction of the baseline duration.
    pub threshold: f64,
    /// Print the encoder commands instead of running them.
    pub simulate: bool,
    /// Extra arguments handed to the encoder verbatim, ahead of our own.
    pub passthrough_args: Vec<String>,
    /// Resolved path to the HandBrakeCLI executable.
    pub cli_path: PathBuf,
}
