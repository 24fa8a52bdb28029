// Story records — what collectors hand us and what enrichment adds.
//
// Input fields come straight from the feed (missing title/text are accepted
// and treated as empty). `entities` and `keywords` are derived: they are
// written once by entity extraction before anything compares stories.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::types::EntityMap;

/// One collected news or intelligence item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// Unique key (deduplicated upstream)
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// Body text or description, possibly empty
    #[serde(default, alias = "description")]
    pub text: String,
    #[serde(default)]
    pub source: String,
    /// Absent means unknown; unknown dates sort last
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "EntityMap::is_empty")]
    pub entities: EntityMap,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl Story {
    pub fn new(url: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    /// True when extraction found nothing to compare this story on.
    pub fn has_features(&self) -> bool {
        !self.entities.is_empty() || !self.keywords.is_empty()
    }
}

/// Load a batch of stories from a JSON array file.
pub fn load_batch(path: &Path) -> Result<Vec<Story>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read story batch {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse story batch {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_record_deserializes() {
        let json = r#"[{"url": "https://example.com/a"}]"#;
        let stories: Vec<Story> = serde_json::from_str(json).unwrap();
        assert_eq!(stories[0].title, "");
        assert_eq!(stories[0].text, "");
        assert!(stories[0].published_at.is_none());
        assert!(!stories[0].has_features());
    }

    #[test]
    fn test_description_alias() {
        let json = r#"{"url": "u", "title": "t", "description": "body",
                       "published_at": "2025-03-01T12:00:00Z"}"#;
        let story: Story = serde_json::from_str(json).unwrap();
        assert_eq!(story.text, "body");
        assert!(story.published_at.is_some());
    }

    #[test]
    fn test_load_batch_missing_file() {
        let path = std::env::temp_dir().join("mosaic-missing-batch.json");
        assert!(load_batch(&path).is_err());
    }
}
