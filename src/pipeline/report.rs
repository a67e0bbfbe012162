use crate::credentials::CredentialError;
use crate::segment::{Segment, SkipSignal};
use crate::timeline::{Chapter, EmptyTimelineError};
use crate::upload::UploadTransferError;
use reelforged_common::Topic;
use std::path::PathBuf;

/// Where a single topic ended up.
#[derive(Debug)]
pub enum TopicState {
    Pending,
    Skipped(SkipSignal),
    Built(Segment),
}

#[derive(Debug, thiserror::Error)]
#[error("failed to write {path:?}: {source}")]
pub struct RenderWriteError {
    pub path: PathBuf,
    #[source]
    pub source: reelforged_av::Error,
}

/// Failures that end the whole run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    EmptyTimeline(#[from] EmptyTimelineError),

    #[error(transparent)]
    RenderWrite(#[from] RenderWriteError),
}

#[derive(Debug)]
pub enum RunOutcome {
    Uploaded { path: PathBuf, video_id: String },
    /// Rendered with upload disabled.
    Rendered { path: PathBuf },
    UploadSkipped { path: PathBuf, reason: CredentialError },
    UploadFailed { path: PathBuf, error: UploadTransferError },
    Aborted(RunError),
}

/// Summary of one run.
#[derive(Debug)]
pub struct RunReport {
    pub built: Vec<Topic>,
    pub skipped: Vec<SkipSignal>,
    pub chapters: Vec<Chapter>,
    pub outcome: RunOutcome,
}

impl RunReport {
    /// The finished video, if one was written.
    pub fn video_path(&self) -> Option<&PathBuf> {
        match &self.outcome {
            RunOutcome::Uploaded { path, .. }
            | RunOutcome::Rendered { path }
            | RunOutcome::UploadSkipped { path, .. }
            | RunOutcome::UploadFailed { path, .. } => Some(path),
            RunOutcome::Aborted(_) => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.outcome, RunOutcome::Aborted(_))
    }

    /// One line describing how the run ended.
    pub fn status_line(&self) -> String {
        let topics = format!("{}/{} topics", self.built.len(), Topic::ALL.len());
        match &self.outcome {
            RunOutcome::Uploaded { video_id, .. } => {
                format!("Uploaded video {} ({})", video_id, topics)
            }
            RunOutcome::Rendered { path } => {
                format!("Rendered {} ({}), upload disabled", path.display(), topics)
            }
            RunOutcome::UploadSkipped { path, reason } => format!(
                "Rendered {} ({}), upload skipped: {}",
                path.display(),
                topics,
                reason
            ),
            RunOutcome::UploadFailed { path, error } => format!(
                "Rendered {} ({}), upload failed ({}): {}",
                path.display(),
                topics,
                error.transience(),
                error
            ),
            RunOutcome::Aborted(error) => format!("Run aborted: {}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SkipReason;

    fn report(outcome: RunOutcome) -> RunReport {
        RunReport {
            built: vec![Topic::Aries, Topic::Leo],
            skipped: vec![SkipSignal::new(Topic::Virgo, SkipReason::FetchFailed, "timeout")],
            chapters: Vec::new(),
            outcome,
        }
    }

    #[test]
    fn test_status_lines() {
        let uploaded = report(RunOutcome::Uploaded {
            path: PathBuf::from("out/v.mp4"),
            video_id: "abc".to_string(),
        });
        assert_eq!(uploaded.status_line(), "Uploaded video abc (2/12 topics)");
        assert!(uploaded.video_path().is_some());

        let skipped = report(RunOutcome::UploadSkipped {
            path: PathBuf::from("out/v.mp4"),
            reason: CredentialError::Missing,
        });
        assert!(skipped.status_line().starts_with("Rendered out/v.mp4 (2/12 topics), upload skipped"));

        let failed = report(RunOutcome::UploadFailed {
            path: PathBuf::from("out/v.mp4"),
            error: UploadTransferError::Stalled(5),
        });
        assert!(failed.status_line().contains("upload failed (transient)"));

        let aborted = report(RunOutcome::Aborted(RunError::EmptyTimeline(EmptyTimelineError)));
        assert_eq!(
            aborted.status_line(),
            "Run aborted: no segments were built, nothing to render"
        );
        assert!(aborted.is_aborted());
        assert!(aborted.video_path().is_none());
    }
}
