//! Per-topic text retrieval.

use crate::config::FetchConfig;
use crate::template::Template;
use reelforged_common::Topic;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unreadable response: {0}")]
    Decode(String),

    #[error("service returned no text")]
    Empty,

    #[error("service returned a failure notice: {0}")]
    FailureText(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// Source of the raw text for one topic.
#[async_trait::async_trait]
pub trait TextSource: Send + Sync {
    async fn fetch(&self, topic: Topic) -> Result<String, FetchError>;
}

#[derive(Debug, Deserialize)]
struct DailyReading {
    description: Option<String>,
}

/// Fetches the daily reading over HTTP (`POST /?sign=<topic>&day=today`).
pub struct HttpTextSource {
    client: Client,
    base_url: String,
}

impl HttpTextSource {
    pub fn new(config: &FetchConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
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

#[async_trait::async_trait]
impl TextSource for HttpTextSource {
    async fn fetch(&self, topic: Topic) -> Result<String, FetchError> {
        let response = self
            .client
            .post(format!("{}/", self.base_url))
            .query(&[("sign", topic.slug()), ("day", "today")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let reading: DailyReading = response.json().await?;
        reading.description.ok_or(FetchError::Empty)
    }
}

/// Recognizes apology text that some services return with a success status.
#[derive(Debug, Clone)]
pub struct FailureScreen {
    markers: Vec<String>,
}

impl FailureScreen {
    pub fn new(markers: &[String]) -> Self {
        Self {
            markers: markers.iter().map(|m| m.to_lowercase()).collect(),
        }
    }

    /// Pass `text` through unchanged unless it is blank or carries a marker.
    pub fn check(&self, text: String) -> Result<String, FetchError> {
        if text.trim().is_empty() {
            return Err(FetchError::Empty);
        }
        let lowered = text.to_lowercase();
        if self.markers.iter().any(|m| lowered.contains(m.as_str())) {
            return Err(FetchError::FailureText(text));
        }
        Ok(text)
    }
}

/// Wrap fetched text in the narration template.
pub fn narrate(template: &Template, topic: Topic, text: &str) -> String {
    let name = topic.to_string();
    let vars: HashMap<&str, &str> = [("topic", name.as_str()), ("text", text.trim())]
        .into_iter()
        .collect();
    template.render(&vars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> FetchConfig {
        FetchConfig {
            base_url: server.uri(),
            ..FetchConfig::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_reads_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(query_param("sign", "gemini"))
            .and(query_param("day", "today"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"description": "Talk it out."})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpTextSource::new(&config_for(&server));
        let text = source.fetch(Topic::Gemini).await.unwrap();
        assert_eq!(text, "Talk it out.");
    }

    #[tokio::test]
    async fn test_fetch_maps_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let source = HttpTextSource::new(&config_for(&server));
        let err = source.fetch(Topic::Leo).await.unwrap_err();
        assert_matches!(err, FetchError::Status { status: 503, .. });
    }

    #[tokio::test]
    async fn test_fetch_missing_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let source = HttpTextSource::new(&config_for(&server));
        assert_matches!(source.fetch(Topic::Leo).await, Err(FetchError::Empty));
    }

    #[test]
    fn test_failure_screen() {
        let screen = FailureScreen::new(&FetchConfig::default().failure_markers);

        assert_eq!(screen.check("A calm day.".to_string()).unwrap(), "A calm day.");
        assert_matches!(screen.check("  ".to_string()), Err(FetchError::Empty));
        assert_matches!(
            screen.check("Apologies, leo. We couldn't retrieve your horoscope.".to_string()),
            Err(FetchError::FailureText(_))
        );
        assert_matches!(
            screen.check("could not fetch horoscope today.".to_string()),
            Err(FetchError::FailureText(_))
        );
    }

    #[test]
    fn test_narrate() {
        let template = Template::parse(&FetchConfig::default().narration_template);
        assert_eq!(
            narrate(&template, Topic::Pisces, " Rest. "),
            "Hello Pisces, your horoscope for today: Rest. Have a wonderful day!"
        );
    }
}
