//! Ordering built segments and deriving chapter markers.

use crate::segment::Segment;
use reelforged_av::Renderable;
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("no segments were built, nothing to render")]
pub struct EmptyTimelineError;

/// Start marker for one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub label: String,
    pub offset_seconds: f64,
}

impl Chapter {
    /// `MM:SS` of the offset, truncated to whole seconds.
    pub fn timestamp(&self) -> String {
        let whole = self.offset_seconds.max(0.0).trunc() as u64;
        format!("{:02}:{:02}", whole / 60, whole % 60)
    }
}

impl fmt::Display for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.timestamp(), self.label)
    }
}

/// Segments in run order plus one chapter per segment.
#[derive(Debug, Clone)]
pub struct Timeline {
    segments: Vec<Segment>,
    chapters: Vec<Chapter>,
}

impl Timeline {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(Segment::duration).sum()
    }

    /// Chapter lines, one per segment, as used for the upload description.
    pub fn description(&self) -> String {
        self.chapters
            .iter()
            .map(Chapter::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clips(&self) -> Vec<Renderable> {
        self.segments.iter().map(|s| s.clip().clone()).collect()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TimelineAssembler;

impl TimelineAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Concatenate `segments` in the order given.
    ///
    /// Each chapter's offset is taken before its own segment's duration is
    /// added, so it marks the start. Offsets keep full precision; only the
    /// label is truncated.
    pub fn assemble(&self, segments: Vec<Segment>) -> Result<Timeline, EmptyTimelineError> {
        if segments.is_empty() {
            return Err(EmptyTimelineError);
        }

        let mut offset = 0.0;
        let chapters = segments
            .iter()
            .map(|segment| {
                let chapter = Chapter {
                    label: segment.topic().to_string(),
                    offset_seconds: offset,
                };
                offset += segment.duration();
                chapter
            })
            .collect();

        Ok(Timeline { segments, chapters })
    }
}
