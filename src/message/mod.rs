//! Provides a strongly typed way to build and render emails
//!
//! A [`Message`] is a sender, an ordered list of recipients, a subject and a
//! body. It renders to a single-part MIME message:
//!
//! * the first recipient goes in `To`, the others in `Cc`
//! * the subject is always an RFC 2047 encoded word
//! * the body is HTML if it contains a closing tag (`</`), plain text otherwise
//! * the body is base64 encoded on a single line
//! * headers are sorted by name
//!
//! ```rust
//! use ratemail::Message;
//!
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let m = Message::builder()
//!     .from("NoBody <nobody@domain.tld>".parse()?)
//!     .to("Hei <hei@domain.tld>".parse()?)
//!     .subject("Hello")
//!     .body("Be happy!")?;
//!
//! assert_eq!(
//!     String::from_utf8(m.formatted())?,
//!     concat!(
//!         "Content-Transfer-Encoding: base64\r\n",
//!         "Content-Type: text/plain; charset=\"utf-8\"\r\n",
//!         "From: \"NoBody\" <nobody@domain.tld>\r\n",
//!         "MIME-Version: 1.0\r\n",
//!         "Subject: =?UTF-8?B?SGVsbG8=?=\r\n",
//!         "To: \"Hei\" <hei@domain.tld>\r\n",
//!         "\r\n",
//!         "QmUgaGFwcHkh\r\n",
//!     )
//! );
//! # Ok(())
//! # }
//! ```

pub mod encoded_word;
pub mod header;
mod mailbox;

pub use mailbox::Mailbox;

use crate::{address::Envelope, base64, Error};
use header::{ContentType, Headers};

/// A builder for messages
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: Option<Mailbox>,
    to: Vec<Mailbox>,
    subject: String,
    with_limiter: bool,
}

impl MessageBuilder {
    /// Creates a new default message builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sender
    pub fn from(mut self, mbox: Mailbox) -> Self {
        self.from = Some(mbox);
        self
    }

    /// Add a recipient
    ///
    /// The first one becomes the `To` header, the next ones are copied.
    pub fn to(mut self, mbox: Mailbox) -> Self {
        self.to.push(mbox);
        self
    }

    /// Set the subject
    pub fn subject<S: Into<String>>(mut self, subject: S) -> Self {
        self.subject = subject.into();
        self
    }

    /// Subject this message to the transport's rate limiter
    pub fn with_limiter(mut self, with_limiter: bool) -> Self {
        self.with_limiter = with_limiter;
        self
    }

    /// Create a message with the given body
    ///
    /// Fails only if no sender was set, empty subjects and bodies are caught
    /// by [`Message::validate`].
    pub fn body<T: Into<String>>(self, body: T) -> Result<Message, Error> {
        let from = self.from.ok_or(Error::MissingFrom)?;
        Ok(Message {
            from,
            to: self.to,
            subject: self.subject,
            body: body.into(),
            with_limiter: self.with_limiter,
        })
    }
}

/// Email message which can be formatted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    from: Mailbox,
    to: Vec<Mailbox>,
    subject: String,
    body: String,
    with_limiter: bool,
}

impl Message {
    /// Create a new message builder without headers
    pub fn builder() -> MessageBuilder {
        MessageBuilder::new()
    }

    /// The sender
    pub fn from(&self) -> &Mailbox {
        &self.from
    }

    /// All recipients, in delivery order
    pub fn to(&self) -> &[Mailbox] {
        &self.to
    }

    /// The subject, not encoded
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The body, not encoded
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Whether sending this message counts against the rate limiter
    pub fn with_limiter(&self) -> bool {
        self.with_limiter
    }

    /// Checks that subject and body are set
    pub fn validate(&self) -> Result<(), Error> {
        if self.subject.is_empty() {
            return Err(Error::EmptySubject);
        }
        if self.body.is_empty() {
            return Err(Error::EmptyBody);
        }
        Ok(())
    }

    /// The `Cc` header value: every recipient but the first
    pub fn cc(&self) -> String {
        self.to
            .iter()
            .skip(1)
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Get the headers of the rendered message
    pub fn headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert(header::FROM, self.from.to_string());
        if let Some(to) = self.to.first() {
            headers.insert(header::TO, to.to_string());
        }
        if self.to.len() > 1 {
            headers.insert(header::CC, self.cc());
        }
        headers.insert(header::SUBJECT, encoded_word::encode(&self.subject));
        headers.insert(
            header::CONTENT_TYPE,
            ContentType::detect(&self.body).as_str(),
        );
        headers.insert(header::CONTENT_TRANSFER_ENCODING, "base64");
        headers.insert(header::MIME_VERSION, "1.0");
        headers
    }

    /// Get message content formatted for SMTP `DATA`
    pub fn formatted(&self) -> Vec<u8> {
        let mut out = self.headers().to_string();
        out.push_str("\r\n");
        out.push_str(&base64::encode(&self.body));
        out.push_str("\r\n");
        out.into_bytes()
    }

    /// Get the envelope: sender and recipient addresses
    ///
    /// Fails with [`Error::MissingTo`] when there are no recipients.
    pub fn envelope(&self) -> Result<Envelope, Error> {
        Envelope::new(
            self.from.email.clone(),
            self.to.iter().map(|mbox| mbox.email.clone()).collect(),
        )
    }
}
