//! Audio duration probing.

use crate::command::run_tool;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Measures how long a decoded audio file plays.
pub trait AudioProbe: Send + Sync {
    /// Duration of the audio at `path`, in seconds.
    fn duration(&self, path: &Path) -> Result<f64>;
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// [`AudioProbe`] backed by the ffprobe CLI.
#[derive(Debug, Clone)]
pub struct FfprobeAudioProbe {
    binary: PathBuf,
}

impl FfprobeAudioProbe {
    /// Use `ffprobe` from PATH.
    pub fn new() -> Self {
        Self::with_binary("ffprobe")
    }

    /// Use a specific ffprobe executable.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfprobeAudioProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioProbe for FfprobeAudioProbe {
    fn duration(&self, path: &Path) -> Result<f64> {
        if !path.exists() {
            return Err(Error::file_not_found(path));
        }

        let output = run_tool(
            "ffprobe",
            Command::new(&self.binary)
                .args(["-v", "quiet", "-print_format", "json", "-show_format"])
                .arg(path),
        )?;

        parse_ffprobe_duration(&output.stdout)
    }
}

/// Extract `format.duration` from ffprobe's JSON output.
pub fn parse_ffprobe_duration(json: &[u8]) -> Result<f64> {
    let parsed: FfprobeOutput = serde_json::from_slice(json)?;

    let raw = parsed
        .format
        .duration
        .ok_or_else(|| Error::parse_error("ffprobe", "no duration reported"))?;

    let seconds: f64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::parse_error("ffprobe", format!("invalid duration: {}", raw)))?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(Error::parse_error(
            "ffprobe",
            format!("duration out of range: {}", seconds),
        ));
    }

    Ok(seconds)
}
