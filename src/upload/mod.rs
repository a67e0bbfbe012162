//! Chunked resumable transfer of the finished video.
//!
//! An [`UploadSession`] moves `Idle -> Negotiating -> Transferring ->
//! Completed`, or to `Failed` from either of the middle states. The driver
//! calls [`Uploader::advance`] until it returns a terminal result; the
//! terminal result is reported exactly once and every later call is a no-op.

mod metadata;
mod transport;
mod youtube;

pub use metadata::UploadMetadata;
pub use transport::{ChunkAck, ResumableTransport, Transience, UploadTransferError};
pub use youtube::YouTubeTransport;

use crate::config::UploadConfig;
use crate::credentials::Token;
use bytes::Bytes;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Negotiating,
    Transferring,
    Completed { id: String },
    Failed { cause: UploadTransferError },
}

impl UploadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    pub bytes_sent: u64,
    pub total_bytes: u64,
}

impl ProgressReport {
    /// Fraction in `[0, 1]`; an empty file counts as fully sent.
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            1.0
        } else {
            (self.bytes_sent as f64 / self.total_bytes as f64).clamp(0.0, 1.0)
        }
    }

    pub fn percent(&self) -> u8 {
        (self.fraction() * 100.0).floor() as u8
    }
}

/// Result of one [`Uploader::advance`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Progress(ProgressReport),
    Completed(String),
    Failed(UploadTransferError),
    /// The terminal result was already returned; nothing was done.
    Settled,
}

/// One upload attempt. Retrying after failure needs a new session.
#[derive(Debug)]
pub struct UploadSession {
    path: PathBuf,
    file: tokio::fs::File,
    total_bytes: u64,
    bytes_sent: u64,
    resumable_token: Option<String>,
    state: UploadState,
    stalled: u32,
    reported: bool,
}

impl UploadSession {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Session URI handed out by the server.
    pub fn resumable_token(&self) -> Option<&str> {
        self.resumable_token.as_deref()
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    fn progress(&self) -> ProgressReport {
        ProgressReport {
            bytes_sent: self.bytes_sent,
            total_bytes: self.total_bytes,
        }
    }

    fn fail(&mut self, cause: UploadTransferError) -> Advance {
        tracing::warn!(
            "Upload of {:?} failed ({}): {}",
            self.path,
            cause.transience(),
            cause
        );
        self.state = UploadState::Failed {
            cause: cause.clone(),
        };
        self.reported = true;
        Advance::Failed(cause)
    }

    async fn read_chunk(&mut self, len: u64) -> std::io::Result<Bytes> {
        let mut buf = vec![0u8; len as usize];
        self.file.seek(SeekFrom::Start(self.bytes_sent)).await?;
        self.file.read_exact(&mut buf).await?;
        Ok(Bytes::from(buf))
    }
}

/// Drives upload sessions over a [`ResumableTransport`].
pub struct Uploader<'a> {
    transport: &'a dyn ResumableTransport,
    token: Token,
    chunk_size: u64,
    max_stalled_chunks: u32,
}

impl<'a> Uploader<'a> {
    pub fn new(transport: &'a dyn ResumableTransport, token: Token, config: &UploadConfig) -> Self {
        Self {
            transport,
            token,
            chunk_size: config.chunk_size,
            max_stalled_chunks: config.max_stalled_chunks.max(1),
        }
    }

    /// Open `path` and negotiate a session. No file bytes are sent.
    ///
    /// Only local file errors are returned as `Err`. A failed negotiation
    /// yields a session already in `Failed`, reported by the first
    /// [`advance`](Self::advance).
    pub async fn start(
        &self,
        path: &Path,
        metadata: &UploadMetadata,
    ) -> Result<UploadSession, UploadTransferError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| UploadTransferError::File(format!("{}: {}", path.display(), e)))?;
        let total_bytes = file
            .metadata()
            .await
            .map_err(|e| UploadTransferError::File(format!("{}: {}", path.display(), e)))?
            .len();

        let mut session = UploadSession {
            path: path.to_path_buf(),
            file,
            total_bytes,
            bytes_sent: 0,
            resumable_token: None,
            state: UploadState::Idle,
            stalled: 0,
            reported: false,
        };

        tracing::info!("Starting upload of {:?} ({} bytes)", path, total_bytes);
        session.state = UploadState::Negotiating;

        match self
            .transport
            .initiate(metadata, total_bytes, &self.token)
            .await
        {
            Ok(uri) => {
                tracing::debug!("Upload session opened: {}", uri);
                session.resumable_token = Some(uri);
                session.state = UploadState::Transferring;
            }
            Err(cause) => {
                session.state = UploadState::Failed { cause };
            }
        }

        Ok(session)
    }

    fn next_chunk_len(&self, session: &UploadSession) -> u64 {
        let remaining = session.total_bytes - session.bytes_sent;
        if self.chunk_size == 0 {
            remaining
        } else {
            remaining.min(self.chunk_size)
        }
    }

    /// Send the next chunk, or report the terminal result once.
    pub async fn advance(&self, session: &mut UploadSession) -> Advance {
        if session.reported {
            return Advance::Settled;
        }

        match &session.state {
            UploadState::Completed { id } => {
                session.reported = true;
                return Advance::Completed(id.clone());
            }
            UploadState::Failed { cause } => {
                let cause = cause.clone();
                return session.fail(cause);
            }
            UploadState::Idle | UploadState::Negotiating => {
                return session.fail(UploadTransferError::Protocol(
                    "session was never negotiated".into(),
                ));
            }
            UploadState::Transferring => {}
        }

        let Some(uri) = session.resumable_token.clone() else {
            return session.fail(UploadTransferError::Protocol("no session uri".into()));
        };

        let offset = session.bytes_sent;
        let len = self.next_chunk_len(session);
        let chunk = match session.read_chunk(len).await {
            Ok(chunk) => chunk,
            Err(e) => {
                return session.fail(UploadTransferError::File(format!(
                    "{}: {}",
                    session.path.display(),
                    e
                )))
            }
        };

        let ack = self
            .transport
            .put_chunk(&uri, offset, chunk, session.total_bytes, &self.token)
            .await;

        match ack {
            Ok(ChunkAck::Done { id }) => {
                tracing::info!("Upload complete, id {}", id);
                session.bytes_sent = session.total_bytes;
                session.state = UploadState::Completed { id: id.clone() };
                session.reported = true;
                Advance::Completed(id)
            }
            Ok(ChunkAck::Incomplete { committed }) => {
                if committed < session.bytes_sent || committed > session.total_bytes {
                    return session.fail(UploadTransferError::Protocol(format!(
                        "server committed {} bytes after {} of {} were acknowledged",
                        committed, session.bytes_sent, session.total_bytes
                    )));
                }

                if committed == session.bytes_sent {
                    session.stalled += 1;
                    if session.stalled >= self.max_stalled_chunks {
                        return session.fail(UploadTransferError::Stalled(session.stalled));
                    }
                } else {
                    session.stalled = 0;
                }

                session.bytes_sent = committed;
                let report = session.progress();
                tracing::info!("Upload progress: {}%", report.percent());
                Advance::Progress(report)
            }
            Err(cause) => session.fail(cause),
        }
    }

    /// Start a session and advance it to the end, calling `on_progress`
    /// for every intermediate report.
    pub async fn upload<F>(
        &self,
        path: &Path,
        metadata: &UploadMetadata,
        mut on_progress: F,
    ) -> Result<String, UploadTransferError>
    where
        F: FnMut(&ProgressReport),
    {
        let mut session = self.start(path, metadata).await?;
        loop {
            match self.advance(&mut session).await {
                Advance::Progress(report) => on_progress(&report),
                Advance::Completed(id) => return Ok(id),
                Advance::Failed(cause) => return Err(cause),
                Advance::Settled => {
                    return Err(UploadTransferError::Protocol(
                        "session settled without a result".into(),
                    ))
                }
            }
        }
    }
}
