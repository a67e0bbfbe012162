//! Core type definitions for topics and upload visibility.
//!
//! All enums are serialized in lowercase so they can be written directly
//! into TOML configuration and upload metadata.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One entry of the fixed, ordered topic list.
///
/// The declaration order is the iteration order of a run and therefore the
/// order of segments in the compiled video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl Topic {
    /// Every topic, in run order.
    pub const ALL: [Topic; 12] = [
        Topic::Aries,
        Topic::Taurus,
        Topic::Gemini,
        Topic::Cancer,
        Topic::Leo,
        Topic::Virgo,
        Topic::Libra,
        Topic::Scorpio,
        Topic::Sagittarius,
        Topic::Capricorn,
        Topic::Aquarius,
        Topic::Pisces,
    ];

    /// Lowercase identifier used in URLs, file names and tags.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Aries => "aries",
            Self::Taurus => "taurus",
            Self::Gemini => "gemini",
            Self::Cancer => "cancer",
            Self::Leo => "leo",
            Self::Virgo => "virgo",
            Self::Libra => "libra",
            Self::Scorpio => "scorpio",
            Self::Sagittarius => "sagittarius",
            Self::Capricorn => "capricorn",
            Self::Aquarius => "aquarius",
            Self::Pisces => "pisces",
        }
    }

    /// Position of the topic in [`Topic::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slug = self.slug();
        let mut chars = slug.chars();
        if let Some(first) = chars.next() {
            write!(f, "{}{}", first.to_ascii_uppercase(), chars.as_str())?;
        }
        Ok(())
    }
}

impl FromStr for Topic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Topic::ALL
            .into_iter()
            .find(|t| t.slug() == wanted)
            .ok_or_else(|| Error::invalid_input(format!("unknown topic: {}", s)))
    }
}

/// Visibility of an uploaded video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    #[default]
    Public,
    Private,
    Unlisted,
}

impl fmt::Display for Privacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Private => write!(f, "private"),
            Self::Unlisted => write!(f, "unlisted"),
        }
    }
}

impl FromStr for Privacy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            "unlisted" => Ok(Self::Unlisted),
            other => Err(Error::invalid_input(format!(
                "privacy must be public, private or unlisted, got {}",
                other
            ))),
        }
    }
}
