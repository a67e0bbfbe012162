use crate::config::UploadConfig;
use crate::template::Template;
use crate::timeline::Timeline;
use chrono::NaiveDate;
use reelforged_common::{Privacy, Topic};
use std::collections::HashMap;

/// Fields sent when opening an upload session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category: String,
    pub privacy: Privacy,
}

impl UploadMetadata {
    /// Metadata for a run on `date`: templated title, chapter description,
    /// configured tags followed by every topic slug.
    pub fn for_run(config: &UploadConfig, timeline: &Timeline, date: NaiveDate) -> Self {
        let date = date.format("%B %d, %Y").to_string();
        let vars: HashMap<&str, &str> = [("date", date.as_str())].into_iter().collect();
        let title = Template::parse(&config.title_template).render(&vars);

        let mut tags = config.tags.clone();
        for topic in Topic::ALL {
            if !tags.iter().any(|t| t == topic.slug()) {
                tags.push(topic.slug().to_string());
            }
        }

        Self {
            title,
            description: timeline.description(),
            tags,
            category: config.category.clone(),
            privacy: config.privacy,
        }
    }

    /// Request body for the videos insert endpoint.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "snippet": {
                "title": self.title,
                "description": self.description,
                "tags": self.tags,
                "categoryId": self.category,
            },
            "status": {
                "privacyStatus": self.privacy.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_json_shape() {
        let metadata = UploadMetadata {
            title: "Daily".to_string(),
            description: "00:00 Aries".to_string(),
            tags: vec!["zodiac".to_string()],
            category: "24".to_string(),
            privacy: Privacy::Unlisted,
        };

        assert_eq!(
            metadata.to_json(),
            serde_json::json!({
                "snippet": {
                    "title": "Daily",
                    "description": "00:00 Aries",
                    "tags": ["zodiac"],
                    "categoryId": "24"
                },
                "status": {"privacyStatus": "unlisted"}
            })
        );
    }
}
