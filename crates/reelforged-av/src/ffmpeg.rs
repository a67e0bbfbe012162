//! ffmpeg-backed [`Compositor`].

use crate::command::run_tool;
use crate::compose::{wrap_text, AudioTrack, CodecParams, Compositor, Renderable, VisualLayer};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Characters per caption line; fits the 1200 px caption box at size 30.
const DEFAULT_CAPTION_WIDTH: usize = 80;

const TITLE_FONT_SIZE: u32 = 70;
const CAPTION_FONT_SIZE: u32 = 30;

/// Text files backing the drawtext filters of one clip.
#[derive(Debug, Default)]
struct TextFiles {
    title: Option<PathBuf>,
    caption: Option<PathBuf>,
}

/// Composes clips as ffmpeg filter graphs and encodes them with the ffmpeg CLI.
#[derive(Debug, Clone)]
pub struct FfmpegCompositor {
    binary: PathBuf,
    font: Option<PathBuf>,
    caption_width: usize,
}

impl FfmpegCompositor {
    /// Use `ffmpeg` from PATH and fontconfig's default font.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
            font: None,
            caption_width: DEFAULT_CAPTION_WIDTH,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Draw overlays with this font file instead of the fontconfig default.
    pub fn with_font(mut self, font: impl Into<PathBuf>) -> Self {
        self.font = Some(font.into());
        self
    }

    pub fn with_caption_width(mut self, chars: usize) -> Self {
        self.caption_width = chars.max(1);
        self
    }

    fn font_option(&self) -> String {
        match &self.font {
            Some(font) => format!(":fontfile={}", quote_filter_value(font)),
            None => String::new(),
        }
    }

    fn write_text_files(&self, clip: &Renderable, dir: &Path, index: usize) -> Result<TextFiles> {
        let mut files = TextFiles::default();

        if let Some(title) = clip.title() {
            let path = dir.join(format!("segment_{:02}_title.txt", index));
            std::fs::write(&path, title)?;
            files.title = Some(path);
        }

        if !clip.caption_lines().is_empty() {
            let path = dir.join(format!("segment_{:02}_caption.txt", index));
            std::fs::write(&path, clip.caption_lines().join("\n"))?;
            files.caption = Some(path);
        }

        Ok(files)
    }

    fn filter_graph(&self, codec: &CodecParams, text: &TextFiles) -> String {
        let (w, h) = (codec.width, codec.height);
        let base = format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black,setsar=1,fps={fps}",
            w = w,
            h = h,
            fps = codec.fps
        );

        let mut overlays = Vec::new();
        if let Some(title) = &text.title {
            overlays.push(format!(
                "drawtext=textfile={}:fontsize={}:fontcolor=yellow:borderw=2:bordercolor=black:\
                 x=(w-text_w)/2:y=h*0.1{}",
                quote_filter_value(title),
                TITLE_FONT_SIZE,
                self.font_option()
            ));
        }
        if let Some(caption) = &text.caption {
            overlays.push(format!(
                "drawtext=textfile={}:fontsize={}:fontcolor=white:line_spacing=6:\
                 x=(w-text_w)/2:y=h*0.75{}",
                quote_filter_value(caption),
                CAPTION_FONT_SIZE,
                self.font_option()
            ));
        }

        if overlays.is_empty() {
            return format!("[0:v]{}[v]", base);
        }

        let mut graph = format!("[0:v]{}[base]", base);
        let mut prev = "base".to_string();
        let last = overlays.len() - 1;
        for (i, overlay) in overlays.iter().enumerate() {
            let next = if i == last {
                "v".to_string()
            } else {
                format!("ov{}", i)
            };
            graph.push_str(&format!(";[{}]{}[{}]", prev, overlay, next));
            prev = next;
        }
        graph
    }

    fn encode_clip(
        &self,
        clip: &Renderable,
        graph: &str,
        part: &Path,
        codec: &CodecParams,
    ) -> Result<()> {
        let fps = codec.fps.to_string();
        run_tool(
            "ffmpeg",
            Command::new(&self.binary)
                .args(["-y", "-v", "error", "-loop", "1", "-framerate", fps.as_str(), "-i"])
                .arg(clip.image())
                .arg("-i")
                .arg(clip.audio())
                .arg("-filter_complex")
                .arg(graph)
                .args(["-map", "[v]", "-map", "1:a", "-af", "apad", "-t"])
                .arg(format!("{:.3}", clip.duration()))
                .args(["-c:v", codec.video_codec.as_str()])
                .args(["-pix_fmt", codec.pixel_format.as_str()])
                .args(["-r", fps.as_str()])
                .args(["-c:a", codec.audio_codec.as_str()])
                .arg(part),
        )?;
        Ok(())
    }
}

impl Default for FfmpegCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor for FfmpegCompositor {
    fn compose(
        &self,
        layers: &[VisualLayer],
        audio: &AudioTrack,
        duration: f64,
    ) -> Result<Renderable> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(Error::InvalidInput(format!(
                "clip duration must be non-negative, got {}",
                duration
            )));
        }

        let mut images = layers.iter().filter_map(|layer| match layer {
            VisualLayer::Image { path } => Some(path),
            _ => None,
        });
        let image = images
            .next()
            .ok_or_else(|| Error::composition("no image layer"))?;
        if images.next().is_some() {
            return Err(Error::composition("more than one image layer"));
        }
        if !image.is_file() {
            return Err(Error::file_not_found(image));
        }
        if !audio.path().is_file() {
            return Err(Error::file_not_found(audio.path()));
        }

        if layers.iter().any(VisualLayer::is_overlay) {
            if let Some(font) = &self.font {
                if !font.is_file() {
                    return Err(Error::composition(format!(
                        "font not found: {}",
                        font.display()
                    )));
                }
            }
        }

        let mut clip = Renderable::new(image, audio.path(), duration);
        for layer in layers {
            match layer {
                VisualLayer::Image { .. } => {}
                VisualLayer::Title { text } => {
                    let text = text.trim();
                    if text.is_empty() {
                        return Err(Error::composition("empty title"));
                    }
                    clip = clip.with_title(text);
                }
                VisualLayer::Caption { text } => {
                    let lines = wrap_text(text, self.caption_width);
                    if lines.is_empty() {
                        return Err(Error::composition("empty caption"));
                    }
                    clip = clip.with_caption_lines(lines);
                }
            }
        }

        Ok(clip)
    }

    fn write(&self, clips: &[Renderable], output: &Path, codec: &CodecParams) -> Result<()> {
        if clips.is_empty() {
            return Err(Error::InvalidInput("no clips to write".to_string()));
        }
        if codec.fps == 0 {
            return Err(Error::InvalidInput("frame rate must be positive".to_string()));
        }

        let work_dir = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut parts = Vec::with_capacity(clips.len());
        for (i, clip) in clips.iter().enumerate() {
            // Zero-length clips hold no frames and add nothing to the timeline.
            if clip.duration() <= 0.0 {
                #[cfg(feature = "tracing")]
                tracing::debug!("Skipping empty clip {}", i);
                continue;
            }

            let text = self.write_text_files(clip, &work_dir, i)?;
            let graph = self.filter_graph(codec, &text);
            let part = work_dir.join(format!("segment_{:02}.mp4", i));

            #[cfg(feature = "tracing")]
            tracing::debug!(
                "Encoding clip {} ({:.2}s, overlay: {})",
                i,
                clip.duration(),
                clip.has_overlay()
            );

            match self.encode_clip(clip, &graph, &part, codec) {
                Ok(()) => {}
                Err(e) if clip.has_overlay() => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Overlay encode of clip {} failed, retrying without text: {}", i, e);
                    #[cfg(not(feature = "tracing"))]
                    let _ = e;

                    let plain = self.filter_graph(codec, &TextFiles::default());
                    self.encode_clip(clip, &plain, &part, codec)?;
                }
                Err(e) => return Err(e),
            }
            parts.push(part);
        }

        if parts.is_empty() {
            return Err(Error::InvalidInput(
                "every clip has zero duration".to_string(),
            ));
        }

        let list = work_dir.join("segments.txt");
        std::fs::write(&list, concat_list(&parts))?;

        #[cfg(feature = "tracing")]
        tracing::info!("Joining {} clips into {:?}", parts.len(), output);

        run_tool(
            "ffmpeg",
            Command::new(&self.binary)
                .args(["-y", "-v", "error", "-f", "concat", "-safe", "0", "-i"])
                .arg(&list)
                .args(["-c", "copy", "-movflags", "+faststart"])
                .arg(output),
        )?;

        Ok(())
    }
}

/// Single-quote a value for use inside an ffmpeg filter graph.
fn quote_filter_value(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', "'\\''"))
}

/// Input list for the concat demuxer.
fn concat_list(parts: &[PathBuf]) -> String {
    parts
        .iter()
        .map(|p| format!("file {}\n", quote_filter_value(p)))
        .collect()
}
