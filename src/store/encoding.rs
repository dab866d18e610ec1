//! Multi-valued fields are stored as a single comma-joined value.
//!
//! There is no escaping: a value that itself contains a comma is split in
//! two when read back.

use crate::error::{Error, Result};

pub const SEPARATOR: char = ',';

const DISPLAY_TAG_LIMIT: usize = 3;
const DISPLAY_TAG_KEEP: usize = 2;
const DISPLAY_ELLIPSIS: &str = "...";

#[must_use]
pub fn encode_list<S: AsRef<str>>(values: &[S]) -> String {
    let mut out = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        out.push_str(value.as_ref());
    }
    out
}

/// Splits a stored value back into its parts. An empty value is an empty
/// list, never a list holding one empty string.
#[must_use]
pub fn decode_list(stored: &str) -> Vec<String> {
    if stored.is_empty() {
        return Vec::new();
    }
    stored.split(SEPARATOR).map(str::to_string).collect()
}

pub fn try_decode_list_bytes(stored: &[u8]) -> Result<Vec<String>> {
    std::str::from_utf8(stored)
        .map(decode_list)
        .map_err(|e| Error::Encoding(e.to_string()))
}

/// Decodes raw field bytes. Bytes that are not UTF-8 decode to an empty
/// list.
#[must_use]
pub fn decode_list_bytes(stored: &[u8]) -> Vec<String> {
    try_decode_list_bytes(stored).unwrap_or_else(|e| {
        tracing::warn!("Ignoring malformed list value: {e}");
        Vec::new()
    })
}

/// Parses comma separated text typed into a form. Entries are trimmed and
/// blank entries dropped.
#[must_use]
pub fn parse_list_input(text: &str) -> Vec<String> {
    text.split(SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Shortens a tag list for listings. Display only: the result must never be
/// written back.
#[must_use]
pub fn display_tags(tags: &[String]) -> Vec<String> {
    match tags {
        [only] if only.is_empty() => Vec::new(),
        _ if tags.len() > DISPLAY_TAG_LIMIT => {
            let mut shown: Vec<String> = tags[..DISPLAY_TAG_KEEP].to_vec();
            shown.push(DISPLAY_ELLIPSIS.to_string());
            shown
        }
        _ => tags.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_encode_list() {
        assert_eq!(encode_list(&["food", "aid"]), "food,aid");
        assert_eq!(encode_list(&["solo"]), "solo");
        assert_eq!(encode_list::<&str>(&[]), "");
    }

    #[test]
    fn test_decode_empty_is_empty_list() {
        assert!(decode_list("").is_empty());
    }

    #[test]
    fn test_round_trip_without_separator() {
        let cases = [
            strings(&[]),
            strings(&["food"]),
            strings(&["food", "aid", "housing"]),
            strings(&["aid", "food", "aid"]),
            strings(&["with space", "ünïcode"]),
        ];
        for tags in cases {
            assert_eq!(decode_list(&encode_list(&tags)), tags);
        }
    }

    #[test]
    fn test_separator_in_value_splits_on_read() {
        let tags = strings(&["food, drink", "aid"]);
        let decoded = decode_list(&encode_list(&tags));
        assert_eq!(decoded, strings(&["food", " drink", "aid"]));
    }

    #[test]
    fn test_decode_keeps_blank_entries() {
        assert_eq!(decode_list("a,,b"), strings(&["a", "", "b"]));
    }

    #[test]
    fn test_decode_invalid_utf8_is_empty() {
        assert!(matches!(
            try_decode_list_bytes(&[0xff, 0xfe]),
            Err(Error::Encoding(_))
        ));
        assert!(decode_list_bytes(&[0xff, 0xfe, b',']).is_empty());
        assert_eq!(decode_list_bytes(b"x,y"), strings(&["x", "y"]));
    }

    #[test]
    fn test_parse_list_input() {
        assert_eq!(
            parse_list_input(" food, aid ,,housing,"),
            strings(&["food", "aid", "housing"])
        );
        assert!(parse_list_input("").is_empty());
        assert!(parse_list_input(" , ").is_empty());
    }

    #[test]
    fn test_display_tags() {
        assert!(display_tags(&strings(&[""])).is_empty());
        assert_eq!(display_tags(&strings(&["a", "b"])), strings(&["a", "b"]));
        assert_eq!(
            display_tags(&strings(&["a", "b", "c"])),
            strings(&["a", "b", "c"])
        );
        assert_eq!(
            display_tags(&strings(&["a", "b", "c", "d"])),
            strings(&["a", "b", "..."])
        );
    }
}
