//! Inline base64 payloads of the form
//! `data:<type>/<subtype>[;<key>=<value>]*;base64,<payload>`.
//!
//! The scheme and the `base64` marker match case-insensitively and
//! surrounding whitespace is ignored, as browsers do for `src` attributes.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DATA_URI: Regex = Regex::new(
        r"^(?i:data):([A-Za-z0-9.+-]+/[A-Za-z0-9.+-]+)(?:;[^;,=]+=[^;,]*)*;(?i:base64),([A-Za-z0-9+/]+={0,2})$"
    )
    .expect("data uri pattern");
}

/// A borrowed, validated data URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUri<'a> {
    /// Media type, e.g. `image/png`.
    pub mime: &'a str,
    /// Base64 payload, still encoded.
    pub payload: &'a str,
}

impl<'a> DataUri<'a> {
    /// Parse `text` if it matches the data-URI grammar.
    #[must_use]
    pub fn parse(text: &'a str) -> Option<Self> {
        let caps = DATA_URI.captures(text.trim())?;
        Some(Self {
            mime: caps.get(1)?.as_str(),
            payload: caps.get(2)?.as_str(),
        })
    }

    /// File extension matching the media type.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        let subtype = self
            .mime
            .split_once('/')
            .map_or("", |(_, sub)| sub)
            .to_ascii_lowercase();
        match subtype.as_str() {
            "png" => "png",
            "jpeg" | "jpg" => "jpg",
            "gif" => "gif",
            "webp" => "webp",
            "svg+xml" => "svg",
            _ => "bin",
        }
    }
}

/// Whether `text` matches the data-URI grammar.
#[must_use]
pub fn is_data_uri(text: &str) -> bool {
    DATA_URI.is_match(text.trim())
}

/// Whether `text` uses the `data:` scheme at all, well-formed or not.
#[must_use]
pub fn has_data_scheme(text: &str) -> bool {
    text.trim_start()
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}
