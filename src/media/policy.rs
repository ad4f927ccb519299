//! Upload acceptance rules: type classification, size ceiling and names.

use crate::config::MediaConfig;
use crate::{MediaError, Result};

use super::types::MediaType;

/// Maximum length of a display name set by rename.
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum length of a caller-chosen storage id.
pub const MAX_CUSTOM_ID_LENGTH: usize = 100;

/// MIME types that carry no information about the content.
const GENERIC_CONTENT_TYPES: &[&str] = &["", "application/octet-stream", "binary/octet-stream"];

/// Decides which uploads are accepted.
#[derive(Debug, Clone)]
pub struct MediaPolicy {
    max_bytes: u64,
    image_types: Vec<String>,
    video_types: Vec<String>,
}

impl MediaPolicy {
    /// Create a policy with an explicit ceiling and MIME allow-lists.
    pub fn new(max_bytes: u64, image_types: Vec<String>, video_types: Vec<String>) -> Self {
        Self {
            max_bytes,
            image_types: image_types.iter().map(|t| t.to_ascii_lowercase()).collect(),
            video_types: video_types.iter().map(|t| t.to_ascii_lowercase()).collect(),
        }
    }

    /// Build the policy from the `[media]` configuration section.
    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(
            config.max_upload_bytes(),
            config.image_types.clone(),
            config.video_types.clone(),
        )
    }

    /// Size ceiling in bytes.
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Classify an upload as image or video.
    ///
    /// The declared MIME type wins when it is specific. A missing or generic
    /// type falls back to the type guessed from the file name's extension.
    pub fn classify(&self, content_type: Option<&str>, filename: &str) -> Result<MediaType> {
        let resolved = self.effective_content_type(content_type, filename);

        if self.image_types.iter().any(|t| *t == resolved) {
            Ok(MediaType::Image)
        } else if self.video_types.iter().any(|t| *t == resolved) {
            Ok(MediaType::Video)
        } else {
            Err(MediaError::InvalidInput(format!(
                "unsupported file type: {}; only images and videos are allowed",
                if resolved.is_empty() { "unknown" } else { &resolved }
            )))
        }
    }

    /// MIME type recorded for an upload.
    pub fn effective_content_type(&self, content_type: Option<&str>, filename: &str) -> String {
        let declared = content_type.map(essence).unwrap_or_default();
        if !GENERIC_CONTENT_TYPES.contains(&declared.as_str()) {
            return declared;
        }

        mime_guess::from_path(filename)
            .first()
            .map(|m| m.essence_str().to_ascii_lowercase())
            .unwrap_or(declared)
    }

    /// Reject empty files and files above the ceiling.
    pub fn check_size(&self, size: u64) -> Result<()> {
        if size == 0 {
            return Err(MediaError::InvalidInput("file is empty".to_string()));
        }
        if size > self.max_bytes {
            return Err(MediaError::TooLarge {
                size,
                max: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// Lowercase MIME type without parameters.
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Validate a new display name and return it trimmed.
pub fn validate_rename(new_name: &str) -> Result<String> {
    let name = new_name.trim();

    if name.is_empty() {
        return Err(MediaError::InvalidInput("new name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(MediaError::InvalidInput(format!(
            "new name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    if name.chars().any(|c| c.is_control() || c == '/' || c == '\\') {
        return Err(MediaError::InvalidInput(
            "new name must not contain path separators or control characters".to_string(),
        ));
    }

    Ok(name.to_string())
}

/// Validate a caller-chosen id for the stored file name.
///
/// The id only sets the stem of the recorded file name; remote ids are
/// always generated. Only ASCII letters, digits, `-` and `_` are allowed.
pub fn validate_custom_id(custom_id: &str) -> Result<()> {
    if custom_id.is_empty() || custom_id.len() > MAX_CUSTOM_ID_LENGTH {
        return Err(MediaError::InvalidInput(format!(
            "customId must be between 1 and {MAX_CUSTOM_ID_LENGTH} characters"
        )));
    }
    if !custom_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(MediaError::InvalidInput(
            "customId may only contain letters, digits, '-' and '_'".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> MediaPolicy {
        MediaPolicy::from_config(&MediaConfig::default())
    }

    #[test]
    fn test_classify_by_content_type() {
        let p = policy();
        assert_eq!(p.classify(Some("image/jpeg"), "x").unwrap(), MediaType::Image);
        assert_eq!(p.classify(Some("IMAGE/PNG"), "x").unwrap(), MediaType::Image);
        assert_eq!(p.classify(Some("video/mp4"), "x").unwrap(), MediaType::Video);
        assert_eq!(
            p.classify(Some("video/webm; codecs=vp9"), "x").unwrap(),
            MediaType::Video
        );
    }

    #[test]
    fn test_classify_falls_back_to_extension() {
        let p = policy();
        assert_eq!(p.classify(None, "photo.png").unwrap(), MediaType::Image);
        assert_eq!(
            p.classify(Some("application/octet-stream"), "clip.mov").unwrap(),
            MediaType::Video
        );
    }

    #[test]
    fn test_classify_rejects_other_types() {
        let p = policy();
        assert!(matches!(
            p.classify(Some("application/pdf"), "doc.pdf"),
            Err(MediaError::InvalidInput(_))
        ));
        assert!(matches!(
            p.classify(None, "noext"),
            Err(MediaError::InvalidInput(_))
        ));
        // Declared type is authoritative when specific
        assert!(p.classify(Some("text/plain"), "photo.jpg").is_err());
    }

    #[test]
    fn test_effective_content_type() {
        let p = policy();
        assert_eq!(p.effective_content_type(Some("image/gif"), "a.png"), "image/gif");
        assert_eq!(p.effective_content_type(None, "a.png"), "image/png");
        assert_eq!(p.effective_content_type(Some(""), "a"), "");
    }

    #[test]
    fn test_check_size() {
        let p = MediaPolicy::new(100, vec![], vec![]);
        assert!(p.check_size(1).is_ok());
        assert!(p.check_size(100).is_ok());
        assert!(matches!(p.check_size(0), Err(MediaError::InvalidInput(_))));
        assert!(matches!(
            p.check_size(101),
            Err(MediaError::TooLarge { size: 101, max: 100 })
        ));
    }

    #[test]
    fn test_default_ceiling() {
        assert_eq!(policy().max_bytes(), 10 * 1024 * 1024);
    }

    #[test]
    fn test_validate_rename() {
        assert_eq!(validate_rename("  vacation ").unwrap(), "vacation");
        assert_eq!(validate_rename("Sommer 2024 (1)").unwrap(), "Sommer 2024 (1)");
        assert!(validate_rename("").is_err());
        assert!(validate_rename("   ").is_err());
        assert!(validate_rename("a/b").is_err());
        assert!(validate_rename("a\\b").is_err());
        assert!(validate_rename("a\nb").is_err());
        assert!(validate_rename(&"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_custom_id() {
        assert!(validate_custom_id("holiday-2024_01").is_ok());
        assert!(validate_custom_id("").is_err());
        assert!(validate_custom_id("has space").is_err());
        assert!(validate_custom_id("dot.dot").is_err());
        assert!(validate_custom_id("../up").is_err());
        assert!(validate_custom_id(&"a".repeat(MAX_CUSTOM_ID_LENGTH + 1)).is_err());
    }
}
