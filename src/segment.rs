//! Building one timed audio-visual unit per topic.
//!
//! A segment always lasts exactly as long as its narration plus a fixed pad.
//! Text length never influences timing, and losing the overlays to a
//! composition failure never changes the duration either.

use reelforged_av::{AudioTrack, Compositor, Renderable, VisualLayer};
use reelforged_common::Topic;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Synthesized narration plus its measured length.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioAsset {
    path: PathBuf,
    byte_len: u64,
    duration: f64,
}

impl AudioAsset {
    pub fn new(path: impl Into<PathBuf>, byte_len: u64, duration: f64) -> Self {
        Self {
            path: path.into(),
            byte_len,
            duration,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn byte_len(&self) -> u64 {
        self.byte_len
    }

    /// Measured playback length in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }
}

/// A still image. Shared read-only between segments that fall back to the
/// default image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    path: PathBuf,
}

impl ImageAsset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Why a topic produced no segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    FetchFailed,
    SynthesisFailed,
    AudioMissing,
    ImageMissing,
    CompositionFailed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchFailed => write!(f, "fetch_failed"),
            Self::SynthesisFailed => write!(f, "synthesis_failed"),
            Self::AudioMissing => write!(f, "audio_missing"),
            Self::ImageMissing => write!(f, "image_missing"),
            Self::CompositionFailed => write!(f, "composition_failed"),
        }
    }
}

/// A recoverable per-topic outcome that leaves the topic out of the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipSignal {
    pub topic: Topic,
    pub reason: SkipReason,
    pub detail: String,
}

impl SkipSignal {
    pub fn new(topic: Topic, reason: SkipReason, detail: impl Into<String>) -> Self {
        Self {
            topic,
            reason,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for SkipSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} skipped ({}): {}", self.topic, self.reason, self.detail)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssetMissingError {
    #[error("no narration audio for {0}")]
    Audio(Topic),

    #[error("narration for {topic} has unusable duration {duration}")]
    InvalidDuration { topic: Topic, duration: f64 },

    #[error("no image for {0} and no default image")]
    Image(Topic),
}

impl From<AssetMissingError> for SkipSignal {
    fn from(err: AssetMissingError) -> Self {
        let (topic, reason) = match &err {
            AssetMissingError::Audio(topic) | AssetMissingError::InvalidDuration { topic, .. } => {
                (*topic, SkipReason::AudioMissing)
            }
            AssetMissingError::Image(topic) => (*topic, SkipReason::ImageMissing),
        };
        SkipSignal::new(topic, reason, err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("composition failed for {topic}: {source}")]
pub struct CompositionError {
    pub topic: Topic,
    #[source]
    pub source: reelforged_av::Error,
}

impl From<CompositionError> for SkipSignal {
    fn from(err: CompositionError) -> Self {
        SkipSignal::new(err.topic, SkipReason::CompositionFailed, err.to_string())
    }
}

/// One topic's finished unit. Immutable once built.
#[derive(Debug, Clone)]
pub struct Segment {
    topic: Topic,
    overlay_text: String,
    audio: AudioAsset,
    image: Arc<ImageAsset>,
    duration: f64,
    clip: Renderable,
}

impl Segment {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn overlay_text(&self) -> &str {
        &self.overlay_text
    }

    pub fn audio(&self) -> &AudioAsset {
        &self.audio
    }

    pub fn image(&self) -> &Arc<ImageAsset> {
        &self.image
    }

    /// Narration length plus pad, in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn clip(&self) -> &Renderable {
        &self.clip
    }

    /// True when overlays could not be drawn and the clip is image + audio only.
    pub fn is_degraded(&self) -> bool {
        !self.clip.has_overlay()
    }
}

/// Turns (text, audio, image) into a [`Segment`]. Performs no I/O of its own
/// beyond what the compositor does.
pub struct SegmentBuilder<'a> {
    compositor: &'a dyn Compositor,
    default_image: Option<Arc<ImageAsset>>,
    pad: f64,
}

impl<'a> SegmentBuilder<'a> {
    pub fn new(compositor: &'a dyn Compositor, pad: f64) -> Self {
        Self {
            compositor,
            default_image: None,
            pad,
        }
    }

    /// Image used for topics without one of their own.
    pub fn with_default_image(mut self, image: Option<Arc<ImageAsset>>) -> Self {
        self.default_image = image;
        self
    }

    pub fn pad(&self) -> f64 {
        self.pad
    }

    pub fn build(
        &self,
        topic: Topic,
        text: &str,
        audio: Option<AudioAsset>,
        image: Option<Arc<ImageAsset>>,
    ) -> Result<Segment, SkipSignal> {
        let audio = audio.ok_or(AssetMissingError::Audio(topic))?;
        if !audio.duration().is_finite() || audio.duration() < 0.0 {
            return Err(AssetMissingError::InvalidDuration {
                topic,
                duration: audio.duration(),
            }
            .into());
        }

        let image = match image.or_else(|| self.default_image.clone()) {
            Some(image) => image,
            None => return Err(AssetMissingError::Image(topic).into()),
        };

        let duration = audio.duration() + self.pad;
        let track = AudioTrack::new(audio.path());
        let layers = [
            VisualLayer::image(image.path()),
            VisualLayer::title(topic.to_string()),
            VisualLayer::caption(text),
        ];

        let clip = match self.compositor.compose(&layers, &track, duration) {
            Ok(clip) => clip,
            Err(e) => {
                tracing::warn!(
                    "Overlay composition failed for {}, using image and audio only: {}",
                    topic,
                    e
                );
                self.compositor
                    .compose(&layers[..1], &track, duration)
                    .map_err(|source| CompositionError { topic, source })?
            }
        };

        tracing::debug!(
            "Built segment for {} ({:.2}s narration + {:.2}s pad)",
            topic,
            audio.duration(),
            self.pad
        );

        Ok(Segment {
            topic,
            overlay_text: text.to_string(),
            audio,
            image,
            duration,
            clip,
        })
    }
}
