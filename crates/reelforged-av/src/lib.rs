//! # reelforged-av
//!
//! Render and encode primitives for compilation videos.
//!
//! This crate provides functionality for:
//! - Composing a still image, a title and a caption over a narration track
//! - Encoding composed clips and joining them into one output file
//! - Measuring audio durations with ffprobe
//! - Locating the external tools all of the above depend on
//!
//! ## Features
//!
//! - `tracing` - Enable tracing support
//!
//! ## Example
//!
//! ```no_run
//! use reelforged_av::{AudioTrack, CodecParams, Compositor, FfmpegCompositor, VisualLayer};
//!
//! let compositor = FfmpegCompositor::new();
//! let clip = compositor.compose(
//!     &[
//!         VisualLayer::image("/images/aries.jpg"),
//!         VisualLayer::title("Aries"),
//!     ],
//!     &AudioTrack::new("/tmp/aries.mp3"),
//!     12.5,
//! )?;
//! compositor.write(
//!     &[clip],
//!     std::path::Path::new("/tmp/out.mp4"),
//!     &CodecParams::default(),
//! )?;
//! # Ok::<(), reelforged_av::Error>(())
//! ```

mod command;
mod compose;
mod error;
mod ffmpeg;
pub mod probe;
pub mod tools;
pub mod workspace;

// Re-exports
pub use compose::{wrap_text, AudioTrack, CodecParams, Compositor, Renderable, VisualLayer};
pub use error::{Error, Result};
pub use ffmpeg::FfmpegCompositor;
pub use probe::{AudioProbe, FfprobeAudioProbe};
pub use tools::{check_tool, check_tools, get_tool_path, require_tool, ToolInfo};
pub use workspace::Workspace;
