//! Common types and data structures

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Caption tone passed to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Funny,
    Sarcastic,
    Wholesome,
    Dark,
}

impl Style {
    pub const ALL: [Style; 4] = [Style::Funny, Style::Sarcastic, Style::Wholesome, Style::Dark];

    pub fn label(self) -> &'static str {
        match self {
            Style::Funny => "Funny",
            Style::Sarcastic => "Sarcastic",
            Style::Wholesome => "Wholesome",
            Style::Dark => "Dark",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Body of `POST /api/generate`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub topic: String,
    pub template_name: Option<String>,
    pub style: Style,
    pub use_imgflip: bool,
}

impl GenerationRequest {
    pub fn new(topic: impl Into<String>, template_name: Option<String>, style: Style) -> Self {
        Self {
            topic: topic.into(),
            template_name,
            style,
            use_imgflip: false,
        }
    }
}

/// Body of `POST /api/caption`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionRequest {
    pub topic: String,
    pub template_name: Option<String>,
    pub style: Style,
}

impl From<&GenerationRequest> for CaptionRequest {
    fn from(req: &GenerationRequest) -> Self {
        Self {
            topic: req.topic.clone(),
            template_name: req.template_name.clone(),
            style: req.style,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TemplateInfo {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Caption {
    #[serde(default)]
    pub top_text: Option<String>,
    #[serde(default)]
    pub bottom_text: Option<String>,
}

/// Response of `POST /api/generate`. Everything but `success` may be missing on failure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GenerationResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub meme_url: Option<String>,
    #[serde(default)]
    pub template: Option<TemplateInfo>,
    #[serde(default)]
    pub caption: Option<Caption>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of `POST /api/caption`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CaptionResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub caption: Option<Caption>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Individual template entry, only the name is used for suggestions
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TemplateSuggestion {
    pub name: String,
}

/// Response of `GET /api/templates`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateList {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub templates: Vec<TemplateSuggestion>,
}

/// Response of `GET /api/health`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub templates_loaded: u64,
    #[serde(default)]
    pub components: BTreeMap<String, bool>,
}

/// A decoded meme image, kept together with the bytes it was decoded from
#[derive(Clone)]
pub struct MemeImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub encoded: Vec<u8>,
}

impl MemeImage {
    pub fn decode(bytes: Vec<u8>) -> Result<Self, image::ImageError> {
        let rgba = image::load_from_memory(&bytes)?.to_rgba8();
        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
            encoded: bytes,
        })
    }
}

impl fmt::Debug for MemeImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemeImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("encoded_len", &self.encoded.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_request_serializes_blank_template_as_null() {
        let req = GenerationRequest::new("mondays", None, Style::Sarcastic);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "topic": "mondays",
                "template_name": null,
                "style": "sarcastic",
                "use_imgflip": false
            })
        );
    }

    #[test]
    fn failed_generation_parses_without_payload() {
        let res: GenerationResult =
            serde_json::from_str(r#"{"success": false, "error": "Topic is required"}"#).unwrap();
        assert!(!res.success);
        assert_eq!(res.error.as_deref(), Some("Topic is required"));
        assert!(res.template.is_none());
        assert!(res.caption.is_none());
    }

    #[test]
    fn generation_result_ignores_extra_template_fields() {
        let res: GenerationResult = serde_json::from_str(
            r#"{
                "success": true,
                "meme_url": "/generated_memes/meme_1.jpg",
                "caption": {"top_text": "ME", "bottom_text": null},
                "template": {"name": "Drake Hotline Bling", "url": "https://i.imgflip.com/30b1gx.jpg", "id": 181913649}
            }"#,
        )
        .unwrap();
        assert_eq!(res.template.unwrap().name, "Drake Hotline Bling");
        let caption = res.caption.unwrap();
        assert_eq!(caption.top_text.as_deref(), Some("ME"));
        assert_eq!(caption.bottom_text, None);
    }

    #[test]
    fn health_status_reads_components() {
        let health: HealthStatus = serde_json::from_str(
            r#"{"status": "healthy", "templates_loaded": 42,
                "components": {"caption_generator": true, "meme_creator": false}}"#,
        )
        .unwrap();
        assert_eq!(health.templates_loaded, 42);
        assert_eq!(health.components.get("meme_creator"), Some(&false));
    }

    #[test]
    fn decode_rejects_garbage_bytes() {
        assert!(MemeImage::decode(b"not an image".to_vec()).is_err());
    }
}
