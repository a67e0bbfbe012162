//! Shared test harness for integration tests.
//!
//! Provides in-memory doubles for every collaborator the pipeline talks to,
//! plus a [`Fixture`] that lays out an images directory and an output
//! directory under a temp dir. Doubles record what they were asked to do in
//! shared state so tests can inspect it after handing them to the driver.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use chrono::{Duration, Utc};
use tempfile::TempDir;

use reelforged::config::Config;
use reelforged::credentials::{CredentialError, Token, TokenStore};
use reelforged::fetch::{FetchError, TextSource};
use reelforged::pipeline::Collaborators;
use reelforged::synth::{SynthesisError, Synthesizer, VoiceParams};
use reelforged::upload::{ChunkAck, ResumableTransport, UploadMetadata, UploadTransferError};
use reelforged_av::{AudioProbe, AudioTrack, CodecParams, Compositor, Renderable, VisualLayer};
use reelforged_common::Topic;

/// Temp directory with `images/` and `out/`.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    /// Images for `topics` plus `default.jpg` when `with_default` is set.
    pub fn new(topics: &[Topic], with_default: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        std::fs::create_dir_all(&images).unwrap();
        for topic in topics {
            std::fs::write(images.join(format!("{}.jpg", topic.slug())), b"jpeg").unwrap();
        }
        if with_default {
            std::fs::write(images.join("default.jpg"), b"jpeg").unwrap();
        }
        Self { dir }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.dir.path().join("images")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    /// Config pointing at this fixture with upload disabled.
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.output.dir = self.output_dir();
        config.assets.images_dir = self.images_dir();
        config.upload.enabled = false;
        config
    }
}

/// Text per topic; topics without an entry fail to fetch.
#[derive(Default)]
pub struct StaticTextSource {
    pub texts: HashMap<Topic, String>,
    pub calls: Arc<Mutex<Vec<Topic>>>,
}

impl StaticTextSource {
    pub fn all() -> Self {
        let texts = Topic::ALL
            .iter()
            .map(|t| (*t, format!("A fine day for {}.", t.slug())))
            .collect();
        Self {
            texts,
            calls: Arc::default(),
        }
    }

    pub fn without(mut self, topic: Topic) -> Self {
        self.texts.remove(&topic);
        self
    }

    pub fn with_text(mut self, topic: Topic, text: &str) -> Self {
        self.texts.insert(topic, text.to_string());
        self
    }
}

#[async_trait::async_trait]
impl TextSource for StaticTextSource {
    async fn fetch(&self, topic: Topic) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(topic);
        self.texts
            .get(&topic)
            .cloned()
            .ok_or_else(|| FetchError::Request("connection refused".to_string()))
    }
}

/// Returns fixed bytes, failing or returning nothing for texts that mention
/// the configured topic names.
#[derive(Default)]
pub struct FixedSynthesizer {
    pub fail_for: Vec<Topic>,
    pub empty_for: Vec<Topic>,
}

#[async_trait::async_trait]
impl Synthesizer for FixedSynthesizer {
    async fn synthesize(&self, text: &str, _voice: &VoiceParams) -> Result<Bytes, SynthesisError> {
        let mentions = |topics: &[Topic]| topics.iter().any(|t| text.contains(&t.to_string()));
        if mentions(&self.fail_for) {
            return Err(SynthesisError::Status {
                status: 500,
                body: "backend error".to_string(),
            });
        }
        if mentions(&self.empty_for) {
            return Ok(Bytes::new());
        }
        Ok(Bytes::from_static(b"ID3fake-mp3"))
    }
}

/// Duration by topic slug prefix of the audio file name.
pub struct TableProbe {
    pub durations: HashMap<Topic, f64>,
    pub default: f64,
}

impl TableProbe {
    pub fn constant(seconds: f64) -> Self {
        Self {
            durations: HashMap::new(),
            default: seconds,
        }
    }

    pub fn with(mut self, topic: Topic, seconds: f64) -> Self {
        self.durations.insert(topic, seconds);
        self
    }
}

impl AudioProbe for TableProbe {
    fn duration(&self, path: &Path) -> reelforged_av::Result<f64> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        Ok(Topic::ALL
            .iter()
            .find(|t| name.starts_with(&format!("{}_", t.slug())))
            .and_then(|t| self.durations.get(t).copied())
            .unwrap_or(self.default))
    }
}

/// What the recording compositor saw.
#[derive(Debug, Default)]
pub struct CompositorLog {
    pub composed: Vec<usize>,
    pub written: Vec<Vec<Renderable>>,
}

/// Builds renderables without spawning anything; `write` drops a small file
/// at the output path.
#[derive(Default)]
pub struct RecordingCompositor {
    pub log: Arc<Mutex<CompositorLog>>,
    pub fail_overlays: bool,
    pub fail_write: bool,
}

impl Compositor for RecordingCompositor {
    fn compose(
        &self,
        layers: &[VisualLayer],
        audio: &AudioTrack,
        duration: f64,
    ) -> reelforged_av::Result<Renderable> {
        self.log.lock().unwrap().composed.push(layers.len());

        let overlays = layers.iter().any(VisualLayer::is_overlay);
        if overlays && self.fail_overlays {
            return Err(reelforged_av::Error::composition("font file missing"));
        }

        let image = layers
            .iter()
            .find_map(|l| match l {
                VisualLayer::Image { path } => Some(path.clone()),
                _ => None,
            })
            .ok_or_else(|| reelforged_av::Error::composition("no image layer"))?;

        let mut clip = Renderable::new(image, audio.path(), duration);
        for layer in layers {
            match layer {
                VisualLayer::Title { text } => clip = clip.with_title(text.clone()),
                VisualLayer::Caption { text } => clip = clip.with_caption_lines(vec![text.clone()]),
                VisualLayer::Image { .. } => {}
            }
        }
        Ok(clip)
    }

    fn write(&self, clips: &[Renderable], output: &Path, _codec: &CodecParams) -> reelforged_av::Result<()> {
        if self.fail_write {
            return Err(reelforged_av::Error::tool_failed("ffmpeg", "disk full"));
        }
        self.log.lock().unwrap().written.push(clips.to_vec());
        std::fs::write(output, b"mp4")?;
        Ok(())
    }
}

/// Token store held entirely in memory.
#[derive(Default)]
pub struct MemoryTokenStore {
    pub token: Option<Token>,
}

impl MemoryTokenStore {
    pub fn valid() -> Self {
        Self {
            token: Some(Token {
                access_token: "access".to_string(),
                refresh_token: Some("refresh".to_string()),
                expires_at: Some(Utc::now() + Duration::hours(1)),
                ..Token::default()
            }),
        }
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<Token>, CredentialError> {
        Ok(self.token.clone())
    }

    async fn refresh(&self, _token: &Token) -> Result<Token, CredentialError> {
        Err(CredentialError::Refresh {
            status: 400,
            body: "invalid_grant".to_string(),
        })
    }

    async fn persist(&self, _token: &Token) -> Result<(), CredentialError> {
        Ok(())
    }
}

/// What the recording transport saw.
#[derive(Debug, Default)]
pub struct TransportLog {
    pub metadata: Vec<UploadMetadata>,
    pub tokens: Vec<String>,
    pub chunks: Vec<(u64, usize)>,
}

/// Accepts every upload in one chunk unless scripted otherwise.
pub struct RecordingTransport {
    pub log: Arc<Mutex<TransportLog>>,
    pub acks: Mutex<VecDeque<Result<ChunkAck, UploadTransferError>>>,
}

impl RecordingTransport {
    pub fn accepting(id: &str) -> Self {
        Self::scripted(vec![Ok(ChunkAck::Done { id: id.to_string() })])
    }

    pub fn scripted(acks: Vec<Result<ChunkAck, UploadTransferError>>) -> Self {
        Self {
            log: Arc::default(),
            acks: Mutex::new(acks.into()),
        }
    }
}

#[async_trait::async_trait]
impl ResumableTransport for RecordingTransport {
    async fn initiate(
        &self,
        metadata: &UploadMetadata,
        _total_bytes: u64,
        token: &Token,
    ) -> Result<String, UploadTransferError> {
        let mut log = self.log.lock().unwrap();
        log.metadata.push(metadata.clone());
        log.tokens.push(token.access_token.clone());
        Ok("https://upload.test/session/1".to_string())
    }

    async fn put_chunk(
        &self,
        _session_uri: &str,
        offset: u64,
        chunk: Bytes,
        _total_bytes: u64,
        _token: &Token,
    ) -> Result<ChunkAck, UploadTransferError> {
        self.log.lock().unwrap().chunks.push((offset, chunk.len()));
        self.acks
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(ChunkAck::Incomplete { committed: 0 }))
    }
}

/// Doubles for a run in which every topic succeeds and upload is accepted.
pub fn collaborators() -> Collaborators {
    Collaborators {
        text_source: Box::new(StaticTextSource::all()),
        synthesizer: Box::new(FixedSynthesizer::default()),
        probe: Box::new(TableProbe::constant(5.0)),
        compositor: Box::new(RecordingCompositor::default()),
        transport: Box::new(RecordingTransport::accepting("video-1")),
        token_store: Some(Box::new(MemoryTokenStore::valid())),
    }
}
