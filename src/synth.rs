//! Text-to-speech collaborator.

use crate::config::SynthesisConfig;
use base64::Engine;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("no API key configured for speech synthesis")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Request(String),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unreadable response: {0}")]
    Decode(String),

    #[error("service returned empty audio")]
    EmptyAudio,

    #[error("could not measure audio: {0}")]
    Measure(String),

    #[error("could not store audio: {0}")]
    Store(String),
}

impl From<reqwest::Error> for SynthesisError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// Voice selection passed to every synthesis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceParams {
    pub language_code: String,
    pub voice_name: String,
    pub audio_encoding: String,
}

impl VoiceParams {
    pub fn from_config(config: &SynthesisConfig) -> Self {
        Self {
            language_code: config.language_code.clone(),
            voice_name: config.voice_name.clone(),
            audio_encoding: config.audio_encoding.clone(),
        }
    }

    /// File extension matching the requested encoding.
    pub fn extension(&self) -> &'static str {
        match self.audio_encoding.to_ascii_uppercase().as_str() {
            "LINEAR16" => "wav",
            "OGG_OPUS" => "ogg",
            _ => "mp3",
        }
    }
}

/// Turns narration text into encoded audio bytes.
#[async_trait::async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &VoiceParams) -> Result<Bytes, SynthesisError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig<'a>,
}

#[derive(Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig<'a> {
    audio_encoding: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: Option<String>,
}

/// Google Cloud Text-to-Speech `text:synthesize` over REST.
pub struct GoogleTtsSynthesizer {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl GoogleTtsSynthesizer {
    pub fn new(config: &SynthesisConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait::async_trait]
impl Synthesizer for GoogleTtsSynthesizer {
    async fn synthesize(&self, text: &str, voice: &VoiceParams) -> Result<Bytes, SynthesisError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SynthesisError::MissingApiKey)?;

        let request = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: &voice.language_code,
                name: &voice.voice_name,
            },
            audio_config: AudioConfig {
                audio_encoding: &voice.audio_encoding,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Goog-Api-Key", api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Status { status, body });
        }

        let body: SynthesizeResponse = response.json().await?;
        let encoded = body.audio_content.ok_or(SynthesisError::EmptyAudio)?;
        let audio = base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| SynthesisError::Decode(e.to_string()))?;

        if audio.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }

        Ok(Bytes::from(audio))
    }
}
