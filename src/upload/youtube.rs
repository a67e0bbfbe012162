use super::{ChunkAck, ResumableTransport, UploadMetadata, UploadTransferError};
use crate::config::UploadConfig;
use crate::credentials::Token;
use bytes::Bytes;
use reqwest::header::{CONTENT_RANGE, LOCATION, RANGE};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

const UPLOAD_PATH: &str = "/upload/youtube/v3/videos";

#[derive(Deserialize)]
struct InsertedVideo {
    id: Option<String>,
}

/// YouTube Data API resumable uploads.
pub struct YouTubeTransport {
    client: Client,
    base_url: String,
}

impl YouTubeTransport {
    pub fn new(config: &UploadConfig) -> Self {
        // 308 means "resume incomplete" here, never a redirect to follow.
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

async fn status_error(response: Response) -> UploadTransferError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    UploadTransferError::Status { status, body }
}

/// `Content-Range` for a chunk, or the status-query form for an empty one.
fn content_range(offset: u64, len: u64, total: u64) -> String {
    if len == 0 {
        format!("bytes */{}", total)
    } else {
        format!("bytes {}-{}/{}", offset, offset + len - 1, total)
    }
}

/// Bytes committed according to a `Range: bytes=0-N` header.
fn committed_from_range(range: Option<&str>) -> Result<u64, UploadTransferError> {
    let Some(range) = range else {
        return Ok(0);
    };
    range
        .trim()
        .strip_prefix("bytes=")
        .and_then(|r| r.split_once('-'))
        .and_then(|(_, end)| end.trim().parse::<u64>().ok())
        .map(|end| end + 1)
        .ok_or_else(|| UploadTransferError::Protocol(format!("unparseable Range header: {}", range)))
}

#[async_trait::async_trait]
impl ResumableTransport for YouTubeTransport {
    async fn initiate(
        &self,
        metadata: &UploadMetadata,
        total_bytes: u64,
        token: &Token,
    ) -> Result<String, UploadTransferError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, UPLOAD_PATH))
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(&token.access_token)
            .header("X-Upload-Content-Length", total_bytes.to_string())
            .header("X-Upload-Content-Type", "video/mp4")
            .json(&metadata.to_json())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| UploadTransferError::Protocol("session response had no Location".into()))
    }

    async fn put_chunk(
        &self,
        session_uri: &str,
        offset: u64,
        chunk: Bytes,
        total_bytes: u64,
        token: &Token,
    ) -> Result<ChunkAck, UploadTransferError> {
        let range = content_range(offset, chunk.len() as u64, total_bytes);
        tracing::trace!("PUT {} ({})", session_uri, range);

        let response = self
            .client
            .put(session_uri)
            .bearer_auth(&token.access_token)
            .header(CONTENT_RANGE, range)
            .body(chunk)
            .send()
            .await?;

        match response.status() {
            StatusCode::PERMANENT_REDIRECT => {
                let range = response.headers().get(RANGE).and_then(|v| v.to_str().ok());
                let committed = committed_from_range(range)?;
                Ok(ChunkAck::Incomplete { committed })
            }
            StatusCode::OK | StatusCode::CREATED => {
                let video: InsertedVideo = response.json().await?;
                video
                    .id
                    .map(|id| ChunkAck::Done { id })
                    .ok_or_else(|| UploadTransferError::Protocol("completed upload had no id".into()))
            }
            _ => Err(status_error(response).await),
        }
    }
}
