use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};

const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

fn strip_whitespace(encoded: &str) -> String {
    encoded.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Decoded size implied by a base64 payload, without decoding it.
pub fn estimate_decoded_bytes(encoded: &str) -> usize {
    let normalized = strip_whitespace(encoded);
    let padding = if normalized.ends_with("==") {
        2
    } else if normalized.ends_with('=') {
        1
    } else {
        0
    };
    (normalized.len() * 3 / 4).saturating_sub(padding)
}

pub fn decode_image_payload(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    LENIENT_BASE64.decode(strip_whitespace(encoded))
}

pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

pub fn format_bytes(bytes: usize) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let kb = bytes as f64 / 1024.0;
    if kb < 1024.0 {
        return format!("{:.1} KB", kb);
    }
    format!("{:.1} MB", kb / 1024.0)
}
