//! Reelforged - daily compilation video builder
//!
//! Fetches one text per topic, narrates it, composes a timed segment per
//! topic, joins the segments into a chaptered video and uploads the result
//! with a resumable upload. The library crate exposes every stage for
//! integration testing.

pub mod config;
pub mod credentials;
pub mod fetch;
pub mod pipeline;
pub mod segment;
pub mod synth;
pub mod template;
pub mod timeline;
pub mod upload;
