//! Mapping between freeform store keys and file names.
//!
//! ASCII letters, digits, `-` and `_` are kept as-is. Every other byte of the
//! UTF-8 key, including `%`, `.` and `/`, becomes `%xx`. The result can never
//! be `.`, `..`, contain a path separator, or collide with another key.
//!
//! Escaped names longer than [`MAX_FILE_NAME_LEN`] are cut short and
//! suffixed with `~` plus the BLAKE3 hash of the key. `~` is always escaped
//! in ordinary names, so hashed names form a separate namespace.

use crate::error::{SlotError, SlotResult};

/// Upper bound on generated file names, below the 255-byte limit common to
/// most filesystems.
pub const MAX_FILE_NAME_LEN: usize = 200;

const HASH_MARKER: char = '~';

fn is_plain(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_'
}

/// Map a store key to the file name of its slot.
///
/// # Examples
///
/// ```
/// use stowage_slot::slot_file_name;
///
/// assert_eq!(slot_file_name("dino").unwrap(), "dino");
/// assert_eq!(slot_file_name("dino list").unwrap(), "dino%20list");
/// assert_eq!(slot_file_name("../etc").unwrap(), "%2e%2e%2fetc");
/// assert!(slot_file_name("").is_err());
/// ```
pub fn slot_file_name(key: &str) -> SlotResult<String> {
    if key.is_empty() {
        return Err(SlotError::InvalidKey {
            key: key.to_string(),
            reason: "store key must not be empty".into(),
        });
    }

    let mut name = String::with_capacity(key.len());
    for &byte in key.as_bytes() {
        if is_plain(byte) {
            name.push(byte as char);
        } else {
            name.push('%');
            name.push_str(&hex::encode([byte]));
        }
    }

    if name.len() > MAX_FILE_NAME_LEN {
        let digest = blake3::hash(key.as_bytes()).to_hex();
        let keep = MAX_FILE_NAME_LEN - digest.len() - 1;
        name.truncate(keep);
        // Do not leave a dangling partial escape before the marker.
        if let Some(pos) = name[name.len().saturating_sub(2)..].find('%') {
            name.truncate(name.len().saturating_sub(2) + pos);
        }
        name.push(HASH_MARKER);
        name.push_str(digest.as_str());
    }

    Ok(name)
}

/// Recover the key from a file name produced by [`slot_file_name`].
///
/// Returns `None` for hashed names (the key is not recoverable) and for
/// names that are not slot files at all, such as leftover temporary files.
pub fn key_from_file_name(name: &str) -> Option<String> {
    if name.is_empty() || name.contains(HASH_MARKER) {
        return None;
    }

    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        if byte == b'%' {
            let pair = bytes.get(i + 1..i + 3)?;
            let decoded = hex::decode(pair).ok()?;
            let escaped = decoded.first().copied()?;
            // Only canonical escapes round-trip.
            if is_plain(escaped) || pair.iter().any(u8::is_ascii_uppercase) {
                return None;
            }
            out.push(escaped);
            i += 3;
        } else if is_plain(byte) {
            out.push(byte);
            i += 1;
        } else {
            return None;
        }
    }

    String::from_utf8(out).ok()
}
