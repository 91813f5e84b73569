use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::session::ImageVersion;

/// Split a `data:<mime>;base64,<payload>` URI into its MIME type and decoded bytes
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| anyhow::anyhow!("Not a data URI: {}", truncate(uri, 40)))?;

    let (header, payload) = rest
        .split_once(',')
        .context("Malformed data URI: missing ',' separator")?;

    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| anyhow::anyhow!("Only base64 data URIs are supported"))?;

    let bytes = STANDARD
        .decode(payload.trim())
        .context("Data URI payload is not valid base64")?;

    let mime_type = if mime_type.is_empty() { "image/png" } else { mime_type };
    Ok((mime_type.to_string(), bytes))
}

/// File extension for an image MIME type, `png` when unknown
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        _ => "png",
    }
}

/// Format file size in human-readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let unit_index = ((bytes_f.log10() / THRESHOLD.log10()).floor() as usize).min(UNITS.len() - 1);

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", bytes_f / THRESHOLD.powi(unit_index as i32), UNITS[unit_index])
    }
}

/// Sanitize a video title for use in a filename
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            c if c.is_alphanumeric() || c == '-' || c == '_' => c,
            _ => '_',
        })
        .collect();

    let collapsed = cleaned
        .split('_')
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    truncate(&collapsed, 60).to_string()
}

/// `<title>_<style>_<id>.<ext>`, with `infographic` standing in for a missing title
pub fn image_filename(version: &ImageVersion, title: Option<&str>, mime_type: &str) -> String {
    let base = title
        .map(sanitize_filename)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "infographic".to_string());

    format!(
        "{}_{}_{}.{}",
        base,
        version.style,
        version.id,
        extension_for_mime(mime_type)
    )
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::InfographicStyle;

    fn version() -> ImageVersion {
        ImageVersion {
            id: "1700000000000-3".into(),
            image_url: "data:image/png;base64,aGVsbG8=".into(),
            prompt: "prompt".into(),
            style: InfographicStyle::Dark,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_decode_data_uri() {
        let (mime, bytes) = decode_data_uri("data:image/jpeg;base64,aGVsbG8=").unwrap();
        assert_eq!(mime, "image/jpeg");
        assert_eq!(bytes, b"hello");

        let (mime, _) = decode_data_uri("data:;base64,aGVsbG8=").unwrap();
        assert_eq!(mime, "image/png");
    }

    #[test]
    fn test_decode_data_uri_rejects_other_shapes() {
        assert!(decode_data_uri("https://example.com/image.png").is_err());
        assert!(decode_data_uri("data:image/png,raw").is_err());
        assert!(decode_data_uri("data:image/png;base64").is_err());
        assert!(decode_data_uri("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime("IMAGE/JPEG"), "jpg");
        assert_eq!(extension_for_mime("image/webp"), "webp");
        assert_eq!(extension_for_mime("application/octet-stream"), "png");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1048576), "1.0 MB");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Rust in 10 minutes!"), "Rust_in_10_minutes");
        assert_eq!(sanitize_filename("a/b?c"), "a_b_c");
        assert_eq!(sanitize_filename("  "), "");
        assert_eq!(sanitize_filename(&"x".repeat(100)).len(), 60);
    }

    #[test]
    fn test_image_filename() {
        let version = version();
        assert_eq!(
            image_filename(&version, Some("Rust: Ownership"), "image/png"),
            "Rust_Ownership_dark_1700000000000-3.png"
        );
        assert_eq!(
            image_filename(&version, None, "image/jpeg"),
            "infographic_dark_1700000000000-3.jpg"
        );
        assert_eq!(
            image_filename(&version, Some("???"), "image/png"),
            "infographic_dark_1700000000000-3.png"
        );
    }
}
