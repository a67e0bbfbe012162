use super::{CredentialError, Token};
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const REFRESH_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Where tokens come from and go back to.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<Token>, CredentialError>;

    async fn refresh(&self, token: &Token) -> Result<Token, CredentialError>;

    async fn persist(&self, token: &Token) -> Result<(), CredentialError>;
}

/// Client id and secret from an OAuth client JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    /// Parse the `installed` or `web` section of a client secret JSON.
    pub fn from_json(json: &str) -> Result<Self, CredentialError> {
        let file: ClientSecretFile =
            serde_json::from_str(json).map_err(|e| CredentialError::ClientSecret(e.to_string()))?;
        file.installed.or(file.web).ok_or_else(|| {
            CredentialError::ClientSecret("neither an \"installed\" nor a \"web\" section".into())
        })
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Token JSON on disk, refreshed against an OAuth token endpoint.
pub struct FileTokenStore {
    client: Client,
    token_path: PathBuf,
    client_secret_path: Option<PathBuf>,
    token_uri: Option<String>,
}

impl FileTokenStore {
    pub fn new(token_path: impl Into<PathBuf>) -> Self {
        let client = Client::builder()
            .timeout(REFRESH_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            token_path: token_path.into(),
            client_secret_path: None,
            token_uri: None,
        }
    }

    pub fn with_client_secret(mut self, path: impl Into<PathBuf>) -> Self {
        self.client_secret_path = Some(path.into());
        self
    }

    /// Token endpoint to use instead of the one named by the client secret.
    pub fn with_token_uri(mut self, uri: impl Into<String>) -> Self {
        self.token_uri = Some(uri.into());
        self
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    async fn client_secret(&self) -> Result<Option<ClientSecret>, CredentialError> {
        let Some(path) = &self.client_secret_path else {
            return Ok(None);
        };
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CredentialError::ClientSecret(format!("{}: {}", path.display(), e)))?;
        ClientSecret::from_json(&json).map(Some)
    }
}

#[async_trait::async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<Token>, CredentialError> {
        let json = match tokio::fs::read_to_string(&self.token_path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CredentialError::Store(e.to_string())),
        };

        let token = serde_json::from_str(&json)
            .map_err(|e| CredentialError::Store(format!("{}: {}", self.token_path.display(), e)))?;
        Ok(Some(token))
    }

    async fn refresh(&self, token: &Token) -> Result<Token, CredentialError> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or(CredentialError::Expired)?;

        let secret = self.client_secret().await?;
        let (client_id, client_secret) = match &secret {
            Some(secret) => (secret.client_id.as_str(), secret.client_secret.as_str()),
            None => match (&token.client_id, &token.client_secret) {
                (Some(id), Some(secret)) => (id.as_str(), secret.as_str()),
                _ => {
                    return Err(CredentialError::ClientSecret(
                        "no client id/secret available for refresh".into(),
                    ))
                }
            },
        };

        let token_uri = self
            .token_uri
            .as_deref()
            .or(secret.as_ref().and_then(|s| s.token_uri.as_deref()))
            .or(token.token_uri.as_deref())
            .unwrap_or(DEFAULT_TOKEN_URI);

        tracing::debug!("Refreshing access token at {}", token_uri);

        let response = self
            .client
            .post(token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::Refresh { status, body });
        }

        let body: RefreshResponse = response.json().await?;

        Ok(Token {
            access_token: body.access_token,
            refresh_token: body.refresh_token.or_else(|| token.refresh_token.clone()),
            expires_at: body.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
            ..token.clone()
        })
    }

    async fn persist(&self, token: &Token) -> Result<(), CredentialError> {
        let json = serde_json::to_string_pretty(token)
            .map_err(|e| CredentialError::Store(e.to_string()))?;
        tokio::fs::write(&self.token_path, json)
            .await
            .map_err(|e| CredentialError::Store(format!("{}: {}", self.token_path.display(), e)))
    }
}
