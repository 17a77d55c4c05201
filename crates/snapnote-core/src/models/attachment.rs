//! Image attachment model

use serde::{Deserialize, Serialize};

use crate::util::{bytes_to_data_url, generate_id, unix_millis_now};

/// Attachments carried by a note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachments {
    /// Screenshots and pasted/imported images
    #[serde(default)]
    pub images: Vec<Image>,
}

/// An image attachment stored inline as a data URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Unique attachment identifier
    pub id: String,
    /// `data:<mime>;base64,<payload>` encoded bytes
    #[serde(default)]
    pub data_url: Option<String>,
    /// Content MIME type
    #[serde(default)]
    pub mime_type: String,
    /// Advisory pixel width
    #[serde(default)]
    pub width: Option<f64>,
    /// Advisory pixel height
    #[serde(default)]
    pub height: Option<f64>,
    /// Creation timestamp (Unix ms)
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl Image {
    /// Build an attachment from raw bytes.
    pub fn from_bytes(
        mime_type: impl Into<String>,
        bytes: &[u8],
        width: Option<f64>,
        height: Option<f64>,
    ) -> Self {
        let mime_type = mime_type.into().trim().to_string();
        Self {
            id: generate_id("img"),
            data_url: Some(bytes_to_data_url(&mime_type, bytes)),
            mime_type,
            width,
            height,
            created_at: Some(unix_millis_now()),
        }
    }

    /// Data URL when present and non-blank.
    pub fn data_url(&self) -> Option<&str> {
        self.data_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::data_url_to_bytes;

    #[test]
    fn test_image_from_bytes() {
        let image = Image::from_bytes(" image/jpeg ", &[0xff, 0xd8], Some(640.0), Some(480.0));

        assert!(image.id.starts_with("img_"));
        assert_eq!(image.mime_type, "image/jpeg");
        let decoded = data_url_to_bytes(image.data_url().unwrap()).unwrap();
        assert_eq!(decoded.mime_type, "image/jpeg");
        assert_eq!(decoded.bytes, vec![0xff, 0xd8]);
    }

    #[test]
    fn test_blank_data_url_is_absent() {
        let mut image = Image::from_bytes("image/png", &[1], None, None);
        image.data_url = Some("   ".to_string());
        assert!(image.data_url().is_none());
        image.data_url = None;
        assert!(image.data_url().is_none());
    }
}
