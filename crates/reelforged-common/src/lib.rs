//! Reelforged-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across reelforged:
//!
//! - **Core Types**: the fixed [`Topic`] list and upload [`Privacy`] levels
//! - **Path Utilities**: image asset lookup by extension
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use reelforged_common::{Topic, Privacy, Error, Result};
//! use reelforged_common::paths::is_image_file;
//! use std::path::Path;
//!
//! // Topics iterate in their fixed order
//! assert_eq!(Topic::ALL[0], Topic::Aries);
//! assert_eq!(Topic::Leo.to_string(), "Leo");
//!
//! // Check file types
//! assert!(is_image_file(Path::new("aries.jpg")));
//!
//! fn example() -> Result<Privacy> {
//!     "secret".parse::<Privacy>()
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
