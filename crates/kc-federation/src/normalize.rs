//! Group-name normalisation.
//!
//! Remote group names are free text. Before they are compared with mapping
//! keys or stored as attribute values they pass through
//! [`GroupNameNormalizer::normalize`], which escapes characters that are
//! unsafe in stored configuration and rendered admin views, then trims.
//!
//! Normalisation is idempotent: an existing `%XX` escape is never escaped
//! again, so normalising an already normalised name returns it unchanged.

use std::borrow::Cow;
use std::fmt::Write as _;

/// Characters escaped besides control characters.
const RESERVED: &[char] = &['"', '\'', '<', '>', '&', '\\'];

/// Normalises remote group names into a storage-safe canonical form.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupNameNormalizer;

impl GroupNameNormalizer {
    /// Normalises a raw group name.
    ///
    /// Returns `None` for an absent name or one that is empty after
    /// escaping and trimming.
    #[must_use]
    pub fn normalize(raw: Option<&str>) -> Option<String> {
        let escaped = Self::escape(raw?);
        let trimmed = escaped.trim();

        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Reverses the escaping applied by [`Self::normalize`].
    ///
    /// Input that does not decode to valid UTF-8 is returned unchanged.
    #[must_use]
    pub fn decode(normalized: &str) -> Cow<'_, str> {
        urlencoding::decode(normalized).unwrap_or(Cow::Borrowed(normalized))
    }

    fn escape(raw: &str) -> Cow<'_, str> {
        if !raw.char_indices().any(|(i, c)| Self::needs_escape(raw, i, c)) {
            return Cow::Borrowed(raw);
        }

        let mut out = String::with_capacity(raw.len() + 8);
        for (i, c) in raw.char_indices() {
            if Self::needs_escape(raw, i, c) {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    let _ = write!(out, "%{byte:02X}");
                }
            } else {
                out.push(c);
            }
        }
        Cow::Owned(out)
    }

    fn needs_escape(raw: &str, index: usize, c: char) -> bool {
        match c {
            '%' => !is_escape_sequence(&raw[index..]),
            c if c.is_control() => !c.is_whitespace(),
            c => RESERVED.contains(&c),
        }
    }
}

/// Returns true if `s` starts with `%` followed by two hex digits.
fn is_escape_sequence(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 3 && bytes[1].is_ascii_hexdigit() && bytes[2].is_ascii_hexdigit()
}
