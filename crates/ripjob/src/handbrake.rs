use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use tokio::process::Command;

use crate::encode::EncodeArgs;

/// Thin adapter around the HandBrakeCLI executable. No decisions are made
/// here; this only shapes argv and spawns processes.
pub struct HandBrake {
    cli_path: PathBuf,
}

impl HandBrake {
    pub fn new(cli_path: PathBuf) -> Self {
        Self { cli_path }
    }

    /// Title-scan invocation: asks the encoder to report every title on the
    /// source without producing any video. Returns the combined
    /// stdout/stderr text for parsing.
    pub async fn scan(&self, source: &Path) -> Result<String> {
        debug!("scanning {}", source.display());
        let output = Command::new(&self.cli_path)
            .arg("--title")
            .arg("0")
            .arg("--input")
            .arg(source)
            .output()
            .await
            .with_context(|| format!("failed to run {}", self.cli_path.display()))?;

        if !output.status.success() {
            // Unreadable sources exit non-zero and report no titles; the
            // caller already treats an empty report as a skippable disc.
            debug!("scan of {} exited with {}", source.display(), output.status);
        }

        let mut report = String::from_utf8_lossy(&output.stdout).into_owned();
        report.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(report)
    }

    /// Run a real encode. Output streams straight to the console so the
    /// user sees the encoder's progress; only the exit status is collected.
    pub async fn encode(&self, args: &EncodeArgs, passthrough: &[String]) -> Result<()> {
        debug!("encoding: {}", self.render_command(args, passthrough));
        let status = Command::new(&self.cli_path)
            .args(self.argv(args, passthrough))
            .status()
            .await
            .with_context(|| format!("failed to run {}", self.cli_path.display()))?;

        if !status.success() {
            warn!("encoder exited with {} for {}", status, args.output.display());
        }
        Ok(())
    }

    /// Print the command an encode would run, without spawning anything.
    pub fn simulate(&self, args: &EncodeArgs, passthrough: &[String]) {
        info!("{}", self.render_command(args, passthrough));
    }

    /// The full command line as it would be executed, space-joined.
    pub fn render_command(&self, args: &EncodeArgs, passthrough: &[String]) -> String {
        let mut parts = vec![self.cli_path.display().to_string()];
        parts.extend(self.argv(args, passthrough));
        parts.join(" ")
    }

    // Passthrough tokens precede the named options.
    fn argv(&self, args: &EncodeArgs, passthrough: &[String]) -> Vec<String> {
        let mut argv: Vec<String> = passthrough.to_vec();
        argv.extend(args.to_cli_args());
        argv
    }
}

/// Locate the HandBrakeCLI executable. An explicit path wins; otherwise the
/// current directory and the platform's default install location are tried,
/// in that order.
pub fn resolve_cli_path(given: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = given {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
    }

    let (exe_name, install_dir) = default_platform_cli();

    if let Ok(cwd) = env::current_dir() {
        let local = cwd.join(exe_name);
        if local.is_file() {
            return Ok(local);
        }
    }

    let installed = install_dir.join(exe_name);
    if installed.is_file() {
        return Ok(installed);
    }

    bail!(
        "couldn't find HandBrakeCLI; download it from https://handbrake.fr if \
         necessary and point --handbrake-path at it"
    )
}

/// Executable name and default install directory for the current platform.
fn default_platform_cli() -> (&'static str, PathBuf) {
    if cfg!(target_os = "macos") {
        ("HandBrakeCLI", PathBuf::from("/Applications"))
    } else if cfg!(target_os = "windows") {
        let programs = env::var_os("PROGRAMFILES")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("C:\\Program Files"));
        ("HandBrakeCLI.exe", programs.join("Handbrake"))
    } else {
        ("HandBrakeCLI", PathBuf::from("/usr/bin"))
    }
}
