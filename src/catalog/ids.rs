//! Record identifier encoding.
//!
//! Identifiers arrive either as raw store-assigned ids or as URL-safe
//! base64 from an upstream link-generation step, and nothing marks which
//! form a given request carries. Lookups therefore try the decoded form
//! first and fall back to the literal input.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;

/// Decode a URL-safe base64 identifier, reconstructing omitted padding.
///
/// Never fails loudly: malformed input, non-UTF-8 bytes, and empty
/// results all collapse to `None` so callers can fall back to the literal
/// input.
pub fn decode_id(input: &str) -> Option<String> {
    let normalized: String = input
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();
    let padded = format!("{}{}", normalized, &"==="[(normalized.len() + 3) % 4..]);

    let bytes = STANDARD.decode(padded).ok()?;
    let decoded = String::from_utf8(bytes).ok()?;
    if decoded.is_empty() {
        return None;
    }
    Some(decoded)
}

/// Encode an identifier the way upstream link generation does.
pub fn encode_id(id: &str) -> String {
    URL_SAFE_NO_PAD.encode(id.as_bytes())
}

/// Lookup candidates for an incoming identifier, in resolution order:
/// decoded form first, literal input second.
pub fn id_candidates(input: &str) -> Vec<String> {
    let mut candidates = Vec::with_capacity(2);
    if let Some(decoded) = decode_id(input) {
        candidates.push(decoded);
    }
    candidates.push(input.to_string());
    candidates
}
