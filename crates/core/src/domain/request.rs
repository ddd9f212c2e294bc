//! Loosely typed run request, as received from the CLI or the HTTP trigger.
//!
//! Callers are automation tools and shells, so every field arrives as an
//! arbitrary JSON value. [`RunRequest::into_config`] is the single place
//! where that input becomes a strict [`RunConfig`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::run::{RunConfig, VideoFormat, Visibility};
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RunRequest {
    /// Video topic. Required, non-empty after trimming.
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "volcanoes")]
    pub topic: Option<Value>,
    /// `"video"` (default) or `"short"`.
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "video")]
    pub format: Option<Value>,
    /// Boolean-like publish flag: `true`, `"yes"`, `"0"`, ...
    #[serde(default, alias = "publish")]
    #[schema(value_type = Option<bool>)]
    pub upload: Option<Value>,
    /// `"public"` or `"private"` (default). Ignored unless publishing.
    #[serde(default, alias = "visibility")]
    #[schema(value_type = Option<String>, example = "private")]
    pub privacy: Option<Value>,
}

impl RunRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: Some(Value::String(topic.into())),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(Value::String(format.into()));
        self
    }

    pub fn with_upload(mut self, upload: impl Into<Value>) -> Self {
        self.upload = Some(upload.into());
        self
    }

    pub fn with_privacy(mut self, privacy: impl Into<String>) -> Self {
        self.privacy = Some(Value::String(privacy.into()));
        self
    }

    /// Accepts either a JSON object or a single-element array wrapping one.
    pub fn from_json(body: Value) -> Result<Self> {
        let body = match body {
            Value::Array(mut items) => match items.len() {
                0 => return Err(CoreError::validation("body", "Empty array received")),
                1 => items.remove(0),
                n => {
                    return Err(CoreError::validation(
                        "body",
                        format!("Expected a single request, got an array of {n}"),
                    ))
                }
            },
            other => other,
        };

        if !body.is_object() {
            return Err(CoreError::validation("body", "Expected a JSON object"));
        }

        serde_json::from_value(body).map_err(|e| CoreError::validation("body", e.to_string()))
    }

    pub fn into_config(self) -> Result<RunConfig> {
        let topic = text_field(self.topic.as_ref()).unwrap_or_default();
        if topic.is_empty() {
            return Err(CoreError::validation("topic", "Topic is required"));
        }

        let format = match text_field(self.format.as_ref()) {
            None => VideoFormat::default(),
            Some(token) if token.is_empty() => VideoFormat::default(),
            Some(token) => VideoFormat::parse(&token).ok_or_else(|| {
                CoreError::validation(
                    "format",
                    format!("Invalid format: {token}. Must be 'short' or 'video'"),
                )
            })?,
        };

        let publish = coerce_bool(self.upload.as_ref())?;

        let visibility = match text_field(self.privacy.as_ref()) {
            None => Visibility::default(),
            Some(token) if token.is_empty() => Visibility::default(),
            Some(token) => Visibility::parse(&token).ok_or_else(|| {
                CoreError::validation(
                    "privacy",
                    format!("Invalid privacy: {token}. Must be 'public' or 'private'"),
                )
            })?,
        };

        RunConfig::new(topic, format, publish, visibility)
    }
}

/// Renders a scalar field as trimmed text, dropping the leading `=` that
/// spreadsheet-driven callers prepend to formulas.
fn text_field(value: Option<&Value>) -> Option<String> {
    let raw = match value? {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('=').unwrap_or(trimmed).trim();
    Some(trimmed.to_string())
}

fn coerce_bool(value: Option<&Value>) -> Result<bool> {
    let invalid = |shown: &str| {
        CoreError::validation(
            "upload",
            format!("Invalid upload flag: {shown}. Use true/false, yes/no or 1/0"),
        )
    };

    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(invalid(&n.to_string())),
        },
        Some(other) => {
            let token = text_field(Some(other)).unwrap_or_default().to_ascii_lowercase();
            match token.as_str() {
                "" | "false" | "no" | "0" => Ok(false),
                "true" | "yes" | "1" => Ok(true),
                _ => Err(invalid(&token)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = RunRequest::new("volcanoes").into_config().unwrap();
        assert_eq!(config.topic(), "volcanoes");
        assert_eq!(config.format(), VideoFormat::Landscape);
        assert!(!config.publish());
        assert_eq!(config.visibility(), Visibility::Private);
    }

    #[test]
    fn test_blank_topic_is_rejected() {
        let err = RunRequest::new("   ").into_config().unwrap_err();
        assert_eq!(err.field(), "topic");

        let err = RunRequest::default().into_config().unwrap_err();
        assert_eq!(err.field(), "topic");
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let err = RunRequest::new("volcanoes")
            .with_format("reel")
            .into_config()
            .unwrap_err();
        assert_eq!(err.field(), "format");
        assert!(err.to_string().contains("reel"));
    }

    #[test]
    fn test_short_maps_to_portrait() {
        let config = RunRequest::new("daily tip")
            .with_format("Short")
            .into_config()
            .unwrap();
        assert_eq!(config.format(), VideoFormat::Portrait);
    }

    #[test]
    fn test_publish_coercion() {
        let cases = [
            (json!(true), true),
            (json!(false), false),
            (json!("yes"), true),
            (json!("No"), false),
            (json!("1"), true),
            (json!("0"), false),
            (json!(" TRUE "), true),
            (json!(1), true),
            (json!(0), false),
            (Value::Null, false),
        ];

        for (raw, expected) in cases {
            let config = RunRequest::new("t")
                .with_upload(raw.clone())
                .into_config()
                .unwrap();
            assert_eq!(config.publish(), expected, "input {raw}");
        }
    }

    #[test]
    fn test_publish_rejects_garbage() {
        let err = RunRequest::new("t")
            .with_upload("maybe")
            .into_config()
            .unwrap_err();
        assert_eq!(err.field(), "upload");

        let err = RunRequest::new("t").with_upload(7).into_config().unwrap_err();
        assert_eq!(err.field(), "upload");
    }

    #[test]
    fn test_privacy_only_applies_when_publishing() {
        let config = RunRequest::new("t")
            .with_privacy("public")
            .into_config()
            .unwrap();
        assert_eq!(config.visibility(), Visibility::Private);

        let config = RunRequest::new("t")
            .with_upload(true)
            .with_privacy("public")
            .into_config()
            .unwrap();
        assert_eq!(config.visibility(), Visibility::Public);
    }

    #[test]
    fn test_invalid_privacy_is_rejected() {
        let err = RunRequest::new("t")
            .with_upload(true)
            .with_privacy("friends")
            .into_config()
            .unwrap_err();
        assert_eq!(err.field(), "privacy");
    }

    #[test]
    fn test_formula_prefix_is_stripped() {
        let request = RunRequest::from_json(json!({
            "topic": "=  black holes",
            "format": "=short",
            "upload": "=true",
            "privacy": "=public"
        }))
        .unwrap();
        let config = request.into_config().unwrap();

        assert_eq!(config.topic(), "black holes");
        assert_eq!(config.format(), VideoFormat::Portrait);
        assert!(config.publish());
        assert_eq!(config.visibility(), Visibility::Public);
    }

    #[test]
    fn test_from_json_unwraps_single_element_array() {
        let request = RunRequest::from_json(json!([{ "topic": "volcanoes" }])).unwrap();
        assert_eq!(request.into_config().unwrap().topic(), "volcanoes");
    }

    #[test]
    fn test_from_json_rejects_empty_and_multi_arrays() {
        let err = RunRequest::from_json(json!([])).unwrap_err();
        assert_eq!(err.field(), "body");

        let err = RunRequest::from_json(json!([{ "topic": "a" }, { "topic": "b" }])).unwrap_err();
        assert_eq!(err.field(), "body");
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = RunRequest::from_json(json!("volcanoes")).unwrap_err();
        assert_eq!(err.field(), "body");
    }

    #[test]
    fn test_publish_alias() {
        let request = RunRequest::from_json(json!({
            "topic": "t",
            "publish": "yes",
            "visibility": "public"
        }))
        .unwrap();
        let config = request.into_config().unwrap();
        assert!(config.publish());
        assert_eq!(config.visibility(), Visibility::Public);
    }

    #[test]
    fn test_numeric_topic_is_accepted() {
        let request = RunRequest::from_json(json!({ "topic": 1984 })).unwrap();
        assert_eq!(request.into_config().unwrap().topic(), "1984");
    }
}
