//! [RFC 2047] encoded words
//!
//! Only the `B` encoding with the UTF-8 charset is produced.
//!
//! [RFC 2047]: https://tools.ietf.org/html/rfc2047

use crate::base64;

/// Encodes `s` as a single `=?UTF-8?B?...?=` word, empty input stays empty
pub fn encode(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    format!("=?UTF-8?B?{}?=", base64::encode(s))
}
