//! Composition vocabulary shared by every [`Compositor`].

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One visual layer of a clip, bottom to top in slice order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisualLayer {
    /// Still image filling the canvas.
    Image { path: PathBuf },
    /// Large heading near the top of the frame.
    Title { text: String },
    /// Wrapped body text near the bottom of the frame.
    Caption { text: String },
}

impl VisualLayer {
    pub fn image(path: impl Into<PathBuf>) -> Self {
        Self::Image { path: path.into() }
    }

    pub fn title(text: impl Into<String>) -> Self {
        Self::Title { text: text.into() }
    }

    pub fn caption(text: impl Into<String>) -> Self {
        Self::Caption { text: text.into() }
    }

    /// Whether this layer draws text over the image.
    pub fn is_overlay(&self) -> bool {
        !matches!(self, Self::Image { .. })
    }
}

/// Narration audio attached to a clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    path: PathBuf,
}

impl AudioTrack {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Fixed encoding parameters for the final file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecParams {
    pub fps: u32,
    pub video_codec: String,
    pub audio_codec: String,
    pub pixel_format: String,
    pub width: u32,
    pub height: u32,
}

impl Default for CodecParams {
    fn default() -> Self {
        Self {
            fps: 24,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            pixel_format: "yuv420p".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// A composed clip, ready to be encoded by [`Compositor::write`].
#[derive(Debug, Clone, PartialEq)]
pub struct Renderable {
    image: PathBuf,
    title: Option<String>,
    caption_lines: Vec<String>,
    audio: PathBuf,
    duration: f64,
}

impl Renderable {
    /// An image-and-audio clip without text overlays.
    pub fn new(image: impl Into<PathBuf>, audio: impl Into<PathBuf>, duration: f64) -> Self {
        Self {
            image: image.into(),
            title: None,
            caption_lines: Vec::new(),
            audio: audio.into(),
            duration,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_caption_lines(mut self, lines: Vec<String>) -> Self {
        self.caption_lines = lines;
        self
    }

    pub fn image(&self) -> &Path {
        &self.image
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn caption_lines(&self) -> &[String] {
        &self.caption_lines
    }

    pub fn audio(&self) -> &Path {
        &self.audio
    }

    /// Length of the clip in seconds, including any trailing silence.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Whether any text is drawn over the image.
    pub fn has_overlay(&self) -> bool {
        self.title.is_some() || !self.caption_lines.is_empty()
    }
}

/// Render/encode capability.
///
/// `compose` describes a clip and may refuse layers it cannot draw; `write`
/// encodes clips, in order and back to back, into one file.
pub trait Compositor: Send + Sync {
    fn compose(&self, layers: &[VisualLayer], audio: &AudioTrack, duration: f64)
        -> Result<Renderable>;

    fn write(&self, clips: &[Renderable], output: &Path, codec: &CodecParams) -> Result<()>;
}

/// Greedy word wrap to at most `width` characters per line.
///
/// Words longer than `width` are kept whole on their own line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };

        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
