use super::UploadMetadata;
use crate::credentials::Token;
use bytes::Bytes;
use std::fmt;

/// Whether retrying the same request later could succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transience {
    Transient,
    Permanent,
}

impl fmt::Display for Transience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Permanent => write!(f, "permanent"),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum UploadTransferError {
    #[error("could not read upload file: {0}")]
    File(String),

    #[error("request failed: {message}")]
    Request {
        message: String,
        transience: Transience,
    },

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("no progress after {0} consecutive chunks")]
    Stalled(u32),
}

impl UploadTransferError {
    pub fn transience(&self) -> Transience {
        match self {
            Self::Request { transience, .. } => *transience,
            Self::Status { status, .. } if *status >= 500 || *status == 429 => {
                Transience::Transient
            }
            Self::Stalled(_) => Transience::Transient,
            Self::File(_) | Self::Status { .. } | Self::Protocol(_) => Transience::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.transience() == Transience::Transient
    }
}

impl From<reqwest::Error> for UploadTransferError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Protocol(err.to_string());
        }
        let transience = if err.is_timeout() || err.is_connect() || err.is_request() {
            Transience::Transient
        } else {
            Transience::Permanent
        };
        Self::Request {
            message: err.to_string(),
            transience,
        }
    }
}

/// Server acknowledgement for one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkAck {
    /// Bytes `0..committed` are stored; the upload is not finished.
    Incomplete { committed: u64 },
    /// The upload finished and the server assigned this identifier.
    Done { id: String },
}

/// The wire half of a resumable upload.
#[async_trait::async_trait]
pub trait ResumableTransport: Send + Sync {
    /// Open a session and return its URI. Transfers no file bytes.
    async fn initiate(
        &self,
        metadata: &UploadMetadata,
        total_bytes: u64,
        token: &Token,
    ) -> Result<String, UploadTransferError>;

    /// Send `chunk` starting at `offset`. An empty chunk asks for status only.
    async fn put_chunk(
        &self,
        session_uri: &str,
        offset: u64,
        chunk: Bytes,
        total_bytes: u64,
        token: &Token,
    ) -> Result<ChunkAck, UploadTransferError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let status = |status| UploadTransferError::Status {
            status,
            body: String::new(),
        };
        assert!(status(500).is_transient());
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
        assert!(!status(400).is_transient());
        assert!(!status(401).is_transient());
        assert!(!status(404).is_transient());
        assert!(UploadTransferError::Stalled(5).is_transient());
        assert!(!UploadTransferError::Protocol("x".into()).is_transient());
        assert!(!UploadTransferError::File("x".into()).is_transient());
    }

    #[test]
    fn test_transience_display() {
        assert_eq!(Transience::Transient.to_string(), "transient");
        assert_eq!(Transience::Permanent.to_string(), "permanent");
    }
}
