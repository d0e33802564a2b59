//! HTML entity decoding for caption text
//!
//! Closed table; anything else starting with `&` passes through unchanged.

/// Recognized entities and their replacements
pub const ENTITIES: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&#x27;", "'"),
    ("&#x2F;", "/"),
    ("&#x60;", "`"),
    ("&#x3D;", "="),
];

/// Decode the entities in [`ENTITIES`] in a single left-to-right pass.
///
/// Decoded output is never re-scanned, so `&amp;lt;` becomes `&lt;`.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match ENTITIES.iter().find(|(entity, _)| tail.starts_with(entity)) {
            Some((entity, replacement)) => {
                out.push_str(replacement);
                rest = &tail[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
