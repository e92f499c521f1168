use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::{debug, error, info, warn};

use ripjob::{config::EncodeSettings, encode, handbrake, probe, scan};

/// Batch-encode ripped DVD images and folders with HandBrakeCLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Source directory to scan for disc images and DVD folders
    #[arg(long, value_name = "DIR")]
    source_dir: PathBuf,

    /// Actually encode the titles instead of printing the commands
    #[arg(long)]
    encode: bool,

    /// Destination directory (defaults to the source)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// The extension to give all encoded videos
    #[arg(long, default_value = "mp4", value_name = "mp4|mkv")]
    extension: String,

    /// Encoding arguments passed through to HandBrakeCLI, quoted as one
    /// string (note that HandBrakeCLI only supports built-in presets)
    #[arg(long, default_value = "", value_name = "\"ARGS\"")]
    handbrake_args: String,

    /// Native language (e.g. eng)
    #[arg(long, default_value = "eng", value_name = "LANG")]
    native_lang: String,

    /// Burn in any foreign language subtitles
    #[arg(long)]
    burn_foreign_subs: bool,

    /// Comma-separated soft subtitle languages to include (e.g. eng,fra)
    #[arg(long, value_name = "LANG1,LANG2")]
    sub_langs: Option<String>,

    /// Path to the HandBrakeCLI executable
    #[arg(long, value_name = "PATH")]
    handbrake_path: Option<PathBuf>,

    /// Sensitivity threshold for TV episode detection
    #[arg(long, default_value_t = 0.10, value_name = "DECIMAL")]
    threshold: f64,

    /// Try to filter out duplicate titles
    #[arg(long)]
    duplicate_detection: bool,

    /// Try to only encode TV episodes
    #[arg(long)]
    tv_detection: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Default level follows --verbose; RUST_LOG still wins.
    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    // The executable is mandatory; nothing is scanned without it.
    let cli_path = match handbrake::resolve_cli_path(args.handbrake_path.as_deref()) {
        Ok(path) => path,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    debug!("using encoder at {}", cli_path.display());

    let sub_langs: Vec<String> = args
        .sub_langs
        .as_deref()
        .map(|list| {
            list.split(',')
                .map(|lang| lang.trim().to_string())
                .filter(|lang| !lang.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let settings = EncodeSettings {
        output_dir: args.output_dir.unwrap_or_else(|| args.source_dir.clone()),
        extension: args.extension,
        native_lang: args.native_lang,
        burn_foreign_subs: args.burn_foreign_subs,
        sub_langs,
        tv_detection: args.tv_detection,
        duplicate_detection: args.duplicate_detection,
        threshold: args.threshold,
        simulate: !args.encode,
        passthrough_args: args
            .handbrake_args
            .split_whitespace()
            .map(str::to_string)
            .collect(),
        cli_path,
    };

    if settings.simulate {
        info!("INFO MODE: nothing will be encoded (add --encode to actually encode)");
    }

    let hb = handbrake::HandBrake::new(settings.cli_path.clone());

    info!("Scanning {} for suitable titles to encode", args.source_dir.display());
    let sources = scan::find_disc_sources(&args.source_dir)?;

    let mut discs = Vec::new();
    for source in sources {
        match probe::probe_source(&hb, &source).await {
            Ok(Some(disc)) => discs.push(disc),
            Ok(None) => warn!("no titles found on {}, skipping", source.display()),
            Err(e) => warn!("failed to scan {}: {e:#}", source.display()),
        }
    }

    if !discs.is_empty() {
        info!("Found suitable titles!");
        if settings.simulate {
            info!("The following handbrake commands will be run when --encode is set:");
        }
    }

    for disc in &discs {
        debug!(
            "found disc: {}",
            serde_json::to_string_pretty(disc).unwrap_or_else(|_| disc.name.clone())
        );
        if let Err(e) = encode::encode_disc(disc, &settings, &hb).await {
            warn!("skipping {}: {e:#}", disc.name);
        }
    }

    if settings.simulate && !args.verbose {
        info!(
            "Some titles might have been purposefully skipped by filtering. \
             Add --verbose for a listing of skipped titles and double-check \
             that everything you want is being encoded."
        );
    }

    Ok(())
}
