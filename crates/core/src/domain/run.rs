use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{CoreError, Result};

/// Output video shape. Portrait runs are published as Shorts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VideoFormat {
    #[default]
    Landscape,
    Portrait,
}

impl VideoFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
        }
    }

    /// Maps a trigger token onto a format. Case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" | "landscape" | "long" => Some(Self::Landscape),
            "short" | "shorts" | "portrait" => Some(Self::Portrait),
            _ => None,
        }
    }

    pub fn is_short(&self) -> bool {
        matches!(self, Self::Portrait)
    }

    /// Target frame size in pixels, `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Landscape => (1920, 1080),
            Self::Portrait => (1080, 1920),
        }
    }
}

impl std::fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical, immutable configuration of one run.
///
/// Built once per trigger, either directly through [`RunConfig::new`] or by
/// normalizing a [`crate::RunRequest`]. Fields are private so that the
/// invariants established here hold for the whole run:
///
/// - the topic is trimmed and non-empty;
/// - visibility is `private` whenever `publish` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RunConfig {
    topic: String,
    format: VideoFormat,
    publish: bool,
    visibility: Visibility,
}

impl RunConfig {
    pub fn new(
        topic: impl Into<String>,
        format: VideoFormat,
        publish: bool,
        visibility: Visibility,
    ) -> Result<Self> {
        let topic = topic.into().trim().to_string();
        if topic.is_empty() {
            return Err(CoreError::validation("topic", "Topic is required"));
        }

        let visibility = if publish {
            visibility
        } else {
            Visibility::Private
        };

        Ok(Self {
            topic,
            format,
            publish,
            visibility,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn format(&self) -> VideoFormat {
        self.format
    }

    pub fn publish(&self) -> bool {
        self.publish
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_short(&self) -> bool {
        self.format.is_short()
    }

    /// Portrait runs never produce a thumbnail.
    pub fn wants_thumbnail(&self) -> bool {
        !self.is_short()
    }
}
