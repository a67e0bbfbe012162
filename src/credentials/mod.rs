//! Token lifecycle for the upload stage.
//!
//! Credential material arrives through the environment, is written to disk
//! for the duration of one run by [`CredentialMaterializer`], and is removed
//! again when the returned guard drops. The uploader only ever sees a
//! [`Token`] obtained through [`acquire_token`].

mod materialize;
mod store;
mod token;

pub use materialize::{
    CredentialMaterializer, MaterializedCredentials, CLIENT_SECRET_FILE_NAME, TOKEN_FILE_NAME,
};
pub use store::{ClientSecret, FileTokenStore, TokenStore, DEFAULT_TOKEN_URI};
pub use token::{Token, EXPIRY_SKEW_SECS};

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("no stored token, interactive authorization is required")]
    Missing,

    #[error("token has expired and carries no refresh token")]
    Expired,

    #[error("failed to materialize credentials: {0}")]
    Materialize(String),

    #[error("client secret unusable: {0}")]
    ClientSecret(String),

    #[error("token refresh request failed: {0}")]
    Request(String),

    #[error("token endpoint returned {status}: {body}")]
    Refresh { status: u16, body: String },

    #[error("token store error: {0}")]
    Store(String),
}

impl From<reqwest::Error> for CredentialError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}

/// Produce a usable token from `store`, refreshing and persisting it when it
/// has expired. Never attempts interactive authorization.
pub async fn acquire_token(store: &dyn TokenStore) -> Result<Token, CredentialError> {
    let token = store.load().await?.ok_or(CredentialError::Missing)?;

    if !token.is_expired(chrono::Utc::now()) {
        tracing::debug!("Stored token is valid");
        return Ok(token);
    }

    if token.refresh_token.is_none() {
        return Err(CredentialError::Expired);
    }

    tracing::info!("Stored token expired, refreshing");
    let refreshed = store.refresh(&token).await?;

    if let Err(e) = store.persist(&refreshed).await {
        tracing::warn!("Failed to persist refreshed token: {}", e);
    }

    Ok(refreshed)
}
