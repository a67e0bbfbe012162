use reelforged_av::CodecParams;
use reelforged_common::Privacy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub synthesis: SynthesisConfig,

    #[serde(default)]
    pub assets: AssetsConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub credentials: CredentialsConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory receiving the finished video and materialized credentials
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_file_name")]
    pub file_name: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_file_name() -> String {
    "daily_horoscope_compilation.mp4".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            file_name: default_file_name(),
        }
    }
}

impl OutputConfig {
    pub fn video_path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_url")]
    pub base_url: String,

    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Substrings that mark a response as an apology rather than content
    #[serde(default = "default_failure_markers")]
    pub failure_markers: Vec<String>,

    /// Wraps fetched text before narration; `{topic}` and `{text}` are substituted
    #[serde(default = "default_narration_template")]
    pub narration_template: String,
}

fn default_fetch_url() -> String {
    "https://aztro.sameerkumar.website".to_string()
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_failure_markers() -> Vec<String> {
    vec!["Could not fetch".to_string(), "couldn't retrieve".to_string()]
}

fn default_narration_template() -> String {
    "Hello {topic}, your horoscope for today: {text} Have a wonderful day!".to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_fetch_url(),
            timeout_secs: default_fetch_timeout(),
            failure_markers: default_failure_markers(),
            narration_template: default_narration_template(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SynthesisConfig {
    #[serde(default = "default_tts_url")]
    pub endpoint: String,

    /// API key for the synthesis service (usually supplied through the environment)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_language_code")]
    pub language_code: String,

    #[serde(default = "default_voice_name")]
    pub voice_name: String,

    #[serde(default = "default_audio_encoding")]
    pub audio_encoding: String,

    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,
}

fn default_tts_url() -> String {
    "https://texttospeech.googleapis.com/v1/text:synthesize".to_string()
}

fn default_language_code() -> String {
    "en-US".to_string()
}

fn default_voice_name() -> String {
    "en-US-Neural2-A".to_string()
}

fn default_audio_encoding() -> String {
    "MP3".to_string()
}

fn default_tts_timeout() -> u64 {
    30
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            endpoint: default_tts_url(),
            api_key: None,
            language_code: default_language_code(),
            voice_name: default_voice_name(),
            audio_encoding: default_audio_encoding(),
            timeout_secs: default_tts_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetsConfig {
    /// Holds `<topic>.jpg` images and the shared `default.jpg`
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("images")
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    /// Seconds of silence appended after each narration
    #[serde(default = "default_pad_secs")]
    pub pad_secs: f64,

    /// Font used for title and caption overlays (fontconfig default when unset)
    #[serde(default)]
    pub font: Option<PathBuf>,

    #[serde(default = "default_caption_width")]
    pub caption_width: usize,

    #[serde(default)]
    pub codec: CodecParams,
}

fn default_pad_secs() -> f64 {
    1.0
}

fn default_caption_width() -> usize {
    80
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pad_secs: default_pad_secs(),
            font: None,
            caption_width: default_caption_width(),
            codec: CodecParams::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    #[serde(default = "default_upload_enabled")]
    pub enabled: bool,

    #[serde(default = "default_upload_url")]
    pub base_url: String,

    /// Bytes per chunk; 0 sends the whole file in one request
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,

    /// Consecutive acknowledgements without progress before giving up
    #[serde(default = "default_max_stalled_chunks")]
    pub max_stalled_chunks: u32,

    #[serde(default = "default_upload_timeout")]
    pub timeout_secs: u64,

    /// `{date}` is replaced with the run date
    #[serde(default = "default_title_template")]
    pub title_template: String,

    #[serde(default = "default_tags")]
    pub tags: Vec<String>,

    #[serde(default = "default_category")]
    pub category: String,

    #[serde(default)]
    pub privacy: Privacy,
}

fn default_upload_enabled() -> bool {
    true
}

fn default_upload_url() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_chunk_size() -> u64 {
    8 * 1024 * 1024
}

fn default_max_stalled_chunks() -> u32 {
    5
}

fn default_upload_timeout() -> u64 {
    300
}

fn default_title_template() -> String {
    "Daily Horoscope Compilation - {date}".to_string()
}

fn default_tags() -> Vec<String> {
    ["horoscope", "astrology", "daily horoscope", "zodiac"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_category() -> String {
    "24".to_string()
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            enabled: default_upload_enabled(),
            base_url: default_upload_url(),
            chunk_size: default_chunk_size(),
            max_stalled_chunks: default_max_stalled_chunks(),
            timeout_secs: default_upload_timeout(),
            title_template: default_title_template(),
            tags: default_tags(),
            category: default_category(),
            privacy: Privacy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CredentialsConfig {
    /// Base64 of the token JSON, materialized into the output directory for the run
    #[serde(default)]
    pub token_b64: Option<String>,

    /// OAuth client secret JSON content, materialized alongside the token
    #[serde(default)]
    pub client_secret_json: Option<String>,

    /// Token endpoint used for refresh (taken from the client secret when unset)
    #[serde(default)]
    pub token_uri: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,
}
