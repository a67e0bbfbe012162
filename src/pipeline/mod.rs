//! Run orchestration: topics in, one rendered and uploaded video out.

mod driver;
mod report;

pub use driver::{Collaborators, PipelineDriver};
pub use report::{RenderWriteError, RunError, RunOutcome, RunReport, TopicState};
