//! Thin wrappers for running `ffmpeg` and `ffprobe`.

use crate::error::{GlimtError, Result};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Run ffmpeg to completion with the given arguments.
///
/// Returns `ToolNotFound` when the binary is missing and `ToolFailed` with
/// ffmpeg's stderr when it exits unsuccessfully.
pub async fn run<I, S>(args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let result = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-y"])
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(GlimtError::ToolFailed(format!("ffmpeg: {}", err.trim())))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(GlimtError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(GlimtError::ToolFailed(format!("ffmpeg error: {e}"))),
    }
}

/// Run ffprobe with JSON output on `path` and return the parsed document.
pub async fn probe_json(path: &Path, extra_args: &[&str]) -> Result<serde_json::Value> {
    let result = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json"])
        .args(extra_args)
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(GlimtError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => return Err(GlimtError::ToolFailed(format!("ffprobe failed: {e}"))),
    };

    if !output.status.success() {
        let err = String::from_utf8_lossy(&output.stderr);
        return Err(GlimtError::ToolFailed(format!("ffprobe: {}", err.trim())));
    }

    Ok(serde_json::from_slice(&output.stdout)?)
}

/// Query the container duration of a media file in seconds.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let parsed = probe_json(path, &["-show_format"]).await?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GlimtError::ToolFailed("Could not determine media duration".into()))
}

/// Parse an ffprobe rational such as `30000/1001` or `25`.
pub fn parse_rational(value: &str) -> Option<f64> {
    match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            (den != 0.0).then(|| num / den)
        }
        None => value.trim().parse().ok(),
    }
}
