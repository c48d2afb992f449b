//! Resource path canonicalization.
//!
//! NetStorage expects every path on the wire to be absolute and encoded with
//! the legacy `escape()` character set, which leaves `@*_+-./` untouched.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters that are percent-encoded in a canonical path.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'@')
    .remove(b'*')
    .remove(b'_')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'/');

/// Turn a user-supplied path into the canonical wire form.
///
/// A leading `/` is added when missing. Nothing is trimmed and empty or
/// directory-like paths pass through; actions decide what they accept.
#[must_use]
pub fn normalize(path: &str) -> String {
    if path.starts_with('/') {
        encode(path)
    } else {
        encode(&format!("/{path}"))
    }
}

/// Encode a value embedded in an action string (rename/symlink targets).
pub(crate) fn encode(input: &str) -> String {
    utf8_percent_encode(input, PATH_ENCODE_SET).to_string()
}

/// Final segment of a slash-separated path, empty when the path ends in `/`.
pub(crate) fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepends_missing_separator() {
        assert_eq!(normalize("dir/file.txt"), "/dir/file.txt");
        assert_eq!(normalize("dir/file.txt"), encode("/dir/file.txt"));
    }

    #[test]
    fn test_keeps_existing_separator() {
        assert_eq!(normalize("/dir/file.txt"), "/dir/file.txt");
    }

    #[test]
    fn test_empty_and_directory_paths_pass_through() {
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/dir/"), "/dir/");
    }

    #[test]
    fn test_does_not_trim() {
        assert_eq!(normalize(" a "), "/%20a%20");
    }

    #[test]
    fn test_escape_charset() {
        assert_eq!(normalize("/a b/c@d*e_f+g-h.i"), "/a%20b/c@d*e_f+g-h.i");
        assert_eq!(normalize("/q?x=1&y#z"), "/q%3Fx%3D1%26y%23z");
        assert_eq!(normalize("/100%"), "/100%25");
    }

    #[test]
    fn test_non_ascii_is_utf8_encoded() {
        assert_eq!(normalize("/caf\u{e9}"), "/caf%C3%A9");
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("/dir/file.txt"), "file.txt");
        assert_eq!(basename("file.txt"), "file.txt");
        assert_eq!(basename("/dir/"), "");
    }
}
