use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Title, description and tags attached to a published video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl VideoMetadata {
    pub fn new(title: impl Into<String>, description: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            tags,
        }
    }

    /// Metadata used when the generator returns nothing usable: the topic
    /// doubles as the title.
    pub fn from_topic(topic: &str) -> Self {
        Self {
            title: topic.to_string(),
            ..Default::default()
        }
    }
}
