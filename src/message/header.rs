//! Headers of a rendered message

use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
};

/// `From` header name
pub const FROM: &str = "From";
/// `To` header name
pub const TO: &str = "To";
/// `Cc` header name
pub const CC: &str = "Cc";
/// `Subject` header name
pub const SUBJECT: &str = "Subject";
/// `Content-Type` header name
pub const CONTENT_TYPE: &str = "Content-Type";
/// `Content-Transfer-Encoding` header name
pub const CONTENT_TRANSFER_ENCODING: &str = "Content-Transfer-Encoding";
/// `MIME-Version` header name
pub const MIME_VERSION: &str = "MIME-Version";

/// Media type of a single-part body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// `text/plain; charset="utf-8"`
    TextPlain,
    /// `text/html; charset="utf-8"`
    TextHtml,
}

impl ContentType {
    /// Guesses the type of `body`: anything containing a closing tag is HTML
    pub fn detect(body: &str) -> Self {
        if body.contains("</") {
            ContentType::TextHtml
        } else {
            ContentType::TextPlain
        }
    }

    /// Header value
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::TextPlain => r#"text/plain; charset="utf-8""#,
            ContentType::TextHtml => r#"text/html; charset="utf-8""#,
        }
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of headers, kept sorted by name
///
/// Names compare byte-wise, so the output order is stable and
/// independent of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: BTreeMap<&'static str, String>,
}

impl Headers {
    /// Creates an empty header set
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header, replacing any previous value
    pub fn insert(&mut self, name: &'static str, value: impl Into<String>) {
        self.headers.insert(name, value.into());
    }

    /// Gets the value of a header
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Header names, in output order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.headers.keys().copied()
    }

    /// Number of headers
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Whether there are no headers
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl Display for Headers {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.headers {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}
