//! Binary and text helpers shared by the export encoders and the storage layer.

use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use regex::Regex;

use crate::error::{Error, Result};

static DATA_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^data:([^;,]*);base64,(.*)$").expect("Invalid regex"));

static SEPARATOR_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s/\\]+").expect("Invalid regex"));

/// MIME type assumed for `data:;base64,...` URLs.
pub const DEFAULT_DATA_URL_MIME: &str = "application/octet-stream";

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Bytes and MIME type recovered from a `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedDataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Parse a `data:<mime>;base64,<payload>` URL.
///
/// Only the base64 form is accepted; anything else is a [`Error::Format`].
/// A blank MIME type reads as `application/octet-stream`, and whitespace
/// inside the payload (wrapped base64) is ignored.
pub fn data_url_to_bytes(data_url: &str) -> Result<DecodedDataUrl> {
    let captures = DATA_URL_RE
        .captures(data_url.trim())
        .ok_or_else(|| Error::Format("Invalid data URL".to_string()))?;

    let mime_type = match captures[1].trim() {
        "" => DEFAULT_DATA_URL_MIME.to_string(),
        mime => mime.to_string(),
    };
    let payload = captures[2]
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect::<String>();
    let bytes = BASE64_STANDARD
        .decode(payload)
        .map_err(|error| Error::Format(format!("Invalid base64 payload in data URL: {error}")))?;

    Ok(DecodedDataUrl { mime_type, bytes })
}

/// Standard base64 with padding and no line wrapping.
pub fn bytes_to_base64(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

/// Build a `data:` URL from raw bytes.
pub fn bytes_to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", bytes_to_base64(bytes))
}

/// Map an image MIME type to a file extension.
///
/// Unknown types fall back to `png` so an export never fails on an odd
/// attachment type.
pub fn infer_extension(mime_type: &str) -> &'static str {
    match mime_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "png",
    }
}

/// Escape text for inclusion in XML text nodes and attribute values.
pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Turn arbitrary text into a safe, lowercase archive file name.
///
/// Reserved characters become `-`; runs of whitespace and path separators
/// collapse into a single `_`.
pub fn sanitize_file_name(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|ch| match ch {
            '?' | '%' | '*' | ':' | '|' | '"' | '<' | '>' => '-',
            other => other,
        })
        .collect();

    SEPARATOR_RUN_RE
        .replace_all(&replaced, "_")
        .to_lowercase()
}

/// Generate a local identifier: `<prefix>_<base36 ms timestamp>_<6 random chars>`.
///
/// Uniqueness is probabilistic, which is enough for locally created records.
pub fn generate_id(prefix: &str) -> String {
    let timestamp = u64::try_from(unix_millis_now()).unwrap_or_default();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| char::from(BASE36_DIGITS[rng.gen_range(0..BASE36_DIGITS.len())]))
        .collect();

    format!("{prefix}_{}_{suffix}", to_base36(timestamp))
}

/// Format a non-negative integer in lowercase base 36.
pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        // value % 36 is always a valid index
        #[allow(clippy::cast_possible_truncation)]
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Convert Unix milliseconds into a UTC `DateTime`, clamping invalid values to the epoch.
pub fn datetime_from_millis(timestamp_ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(timestamp_ms).unwrap_or(DateTime::UNIX_EPOCH)
}

/// ISO-8601 / W3CDTF timestamp with millisecond precision, e.g. `1970-01-01T00:00:00.000Z`.
pub fn to_iso8601(timestamp_ms: i64) -> String {
    datetime_from_millis(timestamp_ms).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current Unix timestamp in milliseconds.
pub fn unix_millis_now() -> i64 {
    Utc::now().timestamp_millis()
}

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
