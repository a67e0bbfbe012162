mod types;

pub use types::*;

use crate::template::Template;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Resumable upload chunks must be a multiple of this many bytes.
pub const CHUNK_GRANULARITY: u64 = 256 * 1024;

/// Values supplied through the environment or command line, applied on top
/// of whatever the config file says.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output_dir: Option<PathBuf>,
    pub tts_api_key: Option<String>,
    pub token_b64: Option<String>,
    pub client_secret_json: Option<String>,
    pub skip_upload: bool,
}

impl Config {
    /// Return a copy with `overrides` applied. The result is what the run uses;
    /// it is never mutated afterwards.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(dir) = overrides.output_dir {
            self.output.dir = dir;
        }
        if overrides.tts_api_key.is_some() {
            self.synthesis.api_key = overrides.tts_api_key;
        }
        if overrides.token_b64.is_some() {
            self.credentials.token_b64 = overrides.token_b64;
        }
        if overrides.client_secret_json.is_some() {
            self.credentials.client_secret_json = overrides.client_secret_json;
        }
        if overrides.skip_upload {
            self.upload.enabled = false;
        }
        self
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./reelforged.toml",
        "~/.config/reelforged/config.toml",
        "/etc/reelforged/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.output.file_name.trim().is_empty() {
        anyhow::bail!("Output file name cannot be empty");
    }

    if !config.render.pad_secs.is_finite() || config.render.pad_secs < 0.0 {
        anyhow::bail!(
            "Render pad must be a non-negative number of seconds, got {}",
            config.render.pad_secs
        );
    }

    if config.render.codec.fps == 0 {
        anyhow::bail!("Render frame rate cannot be 0");
    }

    if config.render.caption_width == 0 {
        anyhow::bail!("Caption width cannot be 0");
    }

    if config.upload.chunk_size % CHUNK_GRANULARITY != 0 {
        anyhow::bail!(
            "Upload chunk size must be 0 or a multiple of {} bytes, got {}",
            CHUNK_GRANULARITY,
            config.upload.chunk_size
        );
    }

    if config.upload.max_stalled_chunks == 0 {
        anyhow::bail!("max_stalled_chunks must be at least 1");
    }

    let title = Template::parse(&config.upload.title_template);
    if title.is_blank() {
        anyhow::bail!("Upload title template cannot be empty");
    }
    title
        .check_placeholders(&["date"])
        .context("Invalid upload title template")?;

    Template::parse(&config.fetch.narration_template)
        .check_placeholders(&["topic", "text"])
        .context("Invalid narration template")?;

    if let Some(font) = &config.render.font {
        if !font.exists() {
            tracing::warn!("Overlay font does not exist: {:?}", font);
        }
    }

    if !config.assets.images_dir.exists() {
        tracing::warn!(
            "Image directory does not exist: {:?}",
            config.assets.images_dir
        );
    }

    Ok(())
}
