//! Receipt files - type detection and inline `data:` URL handling
//!
//! Receipts are uploaded inline by the browser as `data:<mime>;base64,<payload>` URLs,
//! but a plain remote URL is accepted too.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Largest accepted receipt, in bytes (10 MiB)
pub const MAX_RECEIPT_BYTES: i64 = 10 * 1024 * 1024;

pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_PNG: &str = "image/png";
pub const MIME_PDF: &str = "application/pdf";

/// Header fields of a `data:` URL
#[derive(Debug, PartialEq)]
pub struct DataUrl<'a> {
    pub media_type: &'a str,
    pub is_base64: bool,
    pub payload: &'a str,
}

pub fn parse_data_url(url: &str) -> Option<DataUrl<'_>> {
    let rest = url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mut params = header.split(';');
    let media_type = params.next().unwrap_or_default();
    let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));
    Some(DataUrl {
        media_type,
        is_base64,
        payload,
    })
}

/// Decodes the bytes carried by a `data:` URL.
/// Returns `None` for remote URLs or a malformed payload.
pub fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    let data = parse_data_url(url)?;
    if data.is_base64 {
        STANDARD.decode(data.payload.trim()).ok()
    } else {
        Some(data.payload.as_bytes().to_vec())
    }
}

/// Maps a declared media type onto one of the accepted receipt types.
fn normalize_media_type(media_type: &str) -> Option<&'static str> {
    match media_type.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some(MIME_JPEG),
        "image/png" => Some(MIME_PNG),
        "application/pdf" => Some(MIME_PDF),
        _ => None,
    }
}

fn media_type_from_extension(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some(MIME_JPEG),
        "png" => Some(MIME_PNG),
        "pdf" => Some(MIME_PDF),
        _ => None,
    }
}

/// Detects the receipt type, preferring the media type declared by a `data:` URL
/// over the file extension. `None` means the file is not an accepted receipt.
pub fn detect_mime(file_name: &str, url: &str) -> Option<&'static str> {
    match parse_data_url(url) {
        Some(data) if !data.media_type.is_empty() => normalize_media_type(data.media_type),
        _ => media_type_from_extension(file_name),
    }
}
