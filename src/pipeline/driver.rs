use super::report::{RenderWriteError, RunError, RunOutcome, RunReport, TopicState};
use crate::config::Config;
use crate::credentials::{
    acquire_token, CredentialError, CredentialMaterializer, MaterializedCredentials, TokenStore,
};
use crate::fetch::{narrate, FailureScreen, HttpTextSource, TextSource};
use crate::segment::{AudioAsset, ImageAsset, SegmentBuilder, SkipReason, SkipSignal};
use crate::synth::{GoogleTtsSynthesizer, SynthesisError, Synthesizer, VoiceParams};
use crate::template::Template;
use crate::timeline::{Timeline, TimelineAssembler};
use crate::upload::{ResumableTransport, UploadMetadata, Uploader, YouTubeTransport};
use chrono::NaiveDate;
use reelforged_av::{
    get_tool_path, AudioProbe, Compositor, FfmpegCompositor, FfprobeAudioProbe, Workspace,
};
use reelforged_common::paths::{find_default_image, find_topic_image};
use reelforged_common::Topic;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything the driver talks to outside its own process.
pub struct Collaborators {
    pub text_source: Box<dyn TextSource>,
    pub synthesizer: Box<dyn Synthesizer>,
    pub probe: Box<dyn AudioProbe>,
    pub compositor: Box<dyn Compositor>,
    pub transport: Box<dyn ResumableTransport>,
    /// Used instead of a store over the materialized credential files.
    pub token_store: Option<Box<dyn TokenStore>>,
}

impl Collaborators {
    /// HTTP services, ffmpeg and ffprobe as configured.
    pub fn from_config(config: &Config) -> Self {
        let mut compositor = FfmpegCompositor::new()
            .with_binary(resolve_tool("ffmpeg", config.tools.ffmpeg_path.as_deref()))
            .with_caption_width(config.render.caption_width);
        if let Some(font) = &config.render.font {
            compositor = compositor.with_font(font);
        }

        let probe = FfprobeAudioProbe::with_binary(resolve_tool(
            "ffprobe",
            config.tools.ffprobe_path.as_deref(),
        ));

        Self {
            text_source: Box::new(HttpTextSource::new(&config.fetch)),
            synthesizer: Box::new(GoogleTtsSynthesizer::new(&config.synthesis)),
            probe: Box::new(probe),
            compositor: Box::new(compositor),
            transport: Box::new(YouTubeTransport::new(&config.upload)),
            token_store: None,
        }
    }
}

/// Configured path if it exists, else PATH lookup. An unresolved tool keeps
/// its configured path or bare name and fails when first spawned.
fn resolve_tool(name: &str, configured: Option<&Path>) -> PathBuf {
    match get_tool_path(name, configured) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!("{}", e);
            configured
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(name))
        }
    }
}

/// Runs every topic in order, assembles, renders and uploads.
pub struct PipelineDriver {
    config: Arc<Config>,
    collaborators: Collaborators,
    run_date: NaiveDate,
}

impl PipelineDriver {
    pub fn new(config: Arc<Config>, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
            run_date: chrono::Local::now().date_naive(),
        }
    }

    /// Date used in the upload title.
    pub fn with_run_date(mut self, date: NaiveDate) -> Self {
        self.run_date = date;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute one run. Every failure is folded into the report.
    ///
    /// Credential files are written before any topic is processed and removed
    /// when this returns, whichever way the run ended. Credentials that cannot
    /// be written only cost the upload.
    pub async fn run(&self) -> RunReport {
        let credentials = if self.config.upload.enabled {
            match CredentialMaterializer::materialize(
                &self.config.credentials,
                &self.config.output.dir,
            ) {
                Ok(guard) => UploadCredentials::Ready(guard),
                Err(e) => {
                    tracing::error!("Credential setup failed, upload will be skipped: {}", e);
                    UploadCredentials::Unavailable(e)
                }
            }
        } else {
            UploadCredentials::Disabled
        };

        self.run_stages(credentials).await
    }

    async fn run_stages(&self, credentials: UploadCredentials) -> RunReport {
        let destination = self.config.output.video_path();
        let mut report = RunReport {
            built: Vec::new(),
            skipped: Vec::new(),
            chapters: Vec::new(),
            outcome: RunOutcome::Rendered {
                path: destination.clone(),
            },
        };

        let workspace = match Workspace::new(&destination) {
            Ok(workspace) => workspace,
            Err(source) => {
                return abort(
                    report,
                    RenderWriteError {
                        path: destination,
                        source,
                    }
                    .into(),
                )
            }
        };

        let states = self.process_topics(&workspace).await;

        let mut segments = Vec::new();
        for state in states {
            match state {
                TopicState::Built(segment) => {
                    report.built.push(segment.topic());
                    segments.push(segment);
                }
                TopicState::Skipped(skip) => report.skipped.push(skip),
                TopicState::Pending => {}
            }
        }

        let timeline = match TimelineAssembler::new().assemble(segments) {
            Ok(timeline) => timeline,
            Err(e) => return abort(report, e.into()),
        };
        report.chapters = timeline.chapters().to_vec();

        tracing::info!(
            "Timeline: {} segments, {:.2}s",
            timeline.segments().len(),
            timeline.total_duration()
        );
        for chapter in timeline.chapters() {
            tracing::debug!("  {}", chapter);
        }

        let path = match self.render(&timeline, workspace) {
            Ok(path) => path,
            Err(e) => return abort(report, e.into()),
        };
        tracing::info!("Wrote {:?}", path);

        report.outcome = match credentials {
            UploadCredentials::Ready(credentials) => {
                self.upload(&timeline, path, &credentials).await
            }
            UploadCredentials::Unavailable(reason) => {
                tracing::warn!("Skipping upload: {}", reason);
                RunOutcome::UploadSkipped { path, reason }
            }
            UploadCredentials::Disabled => RunOutcome::Rendered { path },
        };
        report
    }

    async fn process_topics(&self, workspace: &Workspace) -> Vec<TopicState> {
        let images_dir = &self.config.assets.images_dir;
        let default_image = find_default_image(images_dir).map(|p| Arc::new(ImageAsset::new(p)));
        if default_image.is_none() {
            tracing::warn!("No default image in {:?}", images_dir);
        }

        let builder = SegmentBuilder::new(
            self.collaborators.compositor.as_ref(),
            self.config.render.pad_secs,
        )
        .with_default_image(default_image);
        let screen = FailureScreen::new(&self.config.fetch.failure_markers);
        let narration = Template::parse(&self.config.fetch.narration_template);
        let voice = VoiceParams::from_config(&self.config.synthesis);

        let mut states: Vec<TopicState> = Topic::ALL.iter().map(|_| TopicState::Pending).collect();

        for (state, topic) in states.iter_mut().zip(Topic::ALL) {
            tracing::info!("Processing {}", topic);

            let text = match self.collaborators.text_source.fetch(topic).await {
                Ok(text) => screen.check(text),
                Err(e) => Err(e),
            };
            let text = match text {
                Ok(text) => narrate(&narration, topic, &text),
                Err(e) => {
                    *state = skipped(SkipSignal::new(topic, SkipReason::FetchFailed, e.to_string()));
                    continue;
                }
            };

            let audio = match self.synthesize(topic, &text, &voice, workspace).await {
                Ok(audio) => audio,
                Err(e) => {
                    *state = skipped(SkipSignal::new(
                        topic,
                        SkipReason::SynthesisFailed,
                        e.to_string(),
                    ));
                    continue;
                }
            };

            let image = find_topic_image(images_dir, topic).map(|p| Arc::new(ImageAsset::new(p)));

            *state = match builder.build(topic, &text, audio, image) {
                Ok(segment) => TopicState::Built(segment),
                Err(skip) => skipped(skip),
            };
        }

        states
    }

    /// Synthesize, store and measure one narration. An empty payload is no
    /// audio rather than an error.
    async fn synthesize(
        &self,
        topic: Topic,
        text: &str,
        voice: &VoiceParams,
        workspace: &Workspace,
    ) -> Result<Option<AudioAsset>, SynthesisError> {
        let bytes = match self.collaborators.synthesizer.synthesize(text, voice).await {
            Ok(bytes) if bytes.is_empty() => return Ok(None),
            Err(SynthesisError::EmptyAudio) => return Ok(None),
            other => other?,
        };

        let name = format!("{}_narration.{}", topic.slug(), voice.extension());
        let path = workspace
            .write_file(&name, &bytes)
            .map_err(|e| SynthesisError::Store(e.to_string()))?;
        let duration = self
            .collaborators
            .probe
            .duration(&path)
            .map_err(|e| SynthesisError::Measure(e.to_string()))?;

        tracing::debug!("{} narration: {} bytes, {:.2}s", topic, bytes.len(), duration);
        Ok(Some(AudioAsset::new(path, bytes.len() as u64, duration)))
    }

    fn render(&self, timeline: &Timeline, workspace: Workspace) -> Result<PathBuf, RenderWriteError> {
        let destination = workspace.destination().to_path_buf();
        let write_error = |source| RenderWriteError {
            path: destination.clone(),
            source,
        };

        tracing::info!("Rendering {} clips", timeline.segments().len());
        self.collaborators
            .compositor
            .write(&timeline.clips(), workspace.output(), &self.config.render.codec)
            .map_err(write_error)?;
        workspace.finalize().map_err(write_error)
    }

    async fn upload(
        &self,
        timeline: &Timeline,
        path: PathBuf,
        credentials: &MaterializedCredentials,
    ) -> RunOutcome {
        let file_store;
        let store: &dyn TokenStore = match &self.collaborators.token_store {
            Some(store) => store.as_ref(),
            None => {
                file_store = credentials.token_store();
                &file_store
            }
        };

        let token = match acquire_token(store).await {
            Ok(token) => token,
            Err(reason) => {
                tracing::warn!("Skipping upload: {}", reason);
                return RunOutcome::UploadSkipped { path, reason };
            }
        };

        let metadata = UploadMetadata::for_run(&self.config.upload, timeline, self.run_date);
        tracing::info!("Uploading \"{}\"", metadata.title);

        let uploader = Uploader::new(
            self.collaborators.transport.as_ref(),
            token,
            &self.config.upload,
        );
        match uploader
            .upload(&path, &metadata, |report| {
                tracing::debug!("Sent {}/{} bytes", report.bytes_sent, report.total_bytes)
            })
            .await
        {
            Ok(video_id) => RunOutcome::Uploaded { path, video_id },
            Err(error) => RunOutcome::UploadFailed { path, error },
        }
    }
}

/// Upload stage inputs, settled before the first topic.
enum UploadCredentials {
    Disabled,
    Ready(MaterializedCredentials),
    Unavailable(CredentialError),
}

fn skipped(skip: SkipSignal) -> TopicState {
    tracing::warn!("{}", skip);
    TopicState::Skipped(skip)
}

fn abort(mut report: RunReport, error: RunError) -> RunReport {
    tracing::error!("Aborting run: {}", error);
    report.outcome = RunOutcome::Aborted(error);
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_configured_tool() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(
            resolve_tool("nonexistent_tool_12345", Some(file.path())),
            file.path()
        );
    }

    #[test]
    fn test_resolve_unknown_tool_keeps_name() {
        assert_eq!(
            resolve_tool("nonexistent_tool_12345", None),
            PathBuf::from("nonexistent_tool_12345")
        );
        assert_eq!(
            resolve_tool("nonexistent_tool_12345", Some(Path::new("/opt/missing/ffmpeg"))),
            PathBuf::from("/opt/missing/ffmpeg")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_falls_back_to_path_lookup() {
        let resolved = resolve_tool("sh", Some(Path::new("/opt/missing/sh")));
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("sh"));
    }
}
