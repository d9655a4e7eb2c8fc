//! Reversible XOR obfuscation of job tokens against a repeating hex key.
//!
//! Text is encoded one byte per UTF-16 code unit, truncated to 8 bits. ASCII
//! survives a round trip; anything wider does not. Malformed hex decodes to
//! an empty byte sequence, so callers must treat empty output as failure.

/// XOR `text` against `key_hex` and render the result as lowercase hex.
///
/// Returns `None` when the key decodes to zero bytes.
pub fn transform(text: &str, key_hex: &str) -> Option<String> {
    let key = decode_hex(key_hex);
    let data = text_to_bytes(text);
    let out = xor_with_key(&data, &key)?;
    Some(hex::encode(out))
}

/// Undo [`transform`]: decode `hex`, XOR with the key, read bytes back as
/// character codes.
///
/// Returns `None` when the key decodes to zero bytes.
pub fn invert(hex: &str, key_hex: &str) -> Option<String> {
    let key = decode_hex(key_hex);
    let data = decode_hex(hex);
    let out = xor_with_key(&data, &key)?;
    Some(out.into_iter().map(char::from).collect())
}

/// Lenient hex decoding: whitespace is ignored, anything malformed yields an
/// empty vector.
pub fn decode_hex(hex: &str) -> Vec<u8> {
    let clean: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(clean).unwrap_or_default()
}

fn text_to_bytes(text: &str) -> Vec<u8> {
    text.encode_utf16().map(|unit| unit as u8).collect()
}

fn xor_with_key(data: &[u8], key: &[u8]) -> Option<Vec<u8>> {
    if key.is_empty() {
        return None;
    }
    Some(
        data.iter()
            .zip(key.iter().cycle())
            .map(|(b, k)| b ^ k)
            .collect(),
    )
}
