//! The SMTP transport sends emails using the SMTP protocol.
//!
//! This SMTP client follows [RFC 5321](https://tools.ietf.org/html/rfc5321)
//! and is meant to hand notifications to a relay server. It opens one plain
//! TCP connection per message and delivers it to each recipient in turn, in a
//! separate `MAIL`/`RCPT`/`DATA` transaction.
//!
//! It implements the following extensions:
//!
//! * 8BITMIME ([RFC 6152](https://tools.ietf.org/html/rfc6152))
//! * SMTPUTF8 ([RFC 6531](http://tools.ietf.org/html/rfc6531))
//!
//! #### Rate limiting
//!
//! Every transport owns a [`RateLimiter`](crate::RateLimiter), shared by its
//! clones. Messages built with [`with_limiter`](crate::message::MessageBuilder::with_limiter)
//! go through it; once it trips they are dropped without any network I/O and
//! `send` still returns `Ok(())`.
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use ratemail::{Message, SmtpTransport, Transport};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let email = Message::builder()
//!     .from("NoBody <nobody@domain.tld>".parse()?)
//!     .to("Hei <hei@domain.tld>".parse()?)
//!     .subject("Happy new year")
//!     .with_limiter(true)
//!     .body("Be happy!")?;
//!
//! // At most 2 messages per hour
//! let mailer = SmtpTransport::new("localhost", 2525, None, 2, Duration::from_secs(3600))?;
//!
//! mailer.send(&email)?;
//! mailer.send(&email)?;
//! // Silently dropped
//! mailer.send(&email)?;
//! assert_eq!(mailer.limiter().rejected(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! #### Connection URLs
//!
//! ```rust,no_run
//! use ratemail::SmtpTransport;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mailer = SmtpTransport::from_url(
//!     "smtp://mail.example.com:2525/app.example.com?timeout=10&limiter_max=5&limiter_period=600",
//! )?
//! .build()?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

pub use self::{
    error::{Error, Phase},
    transport::{SmtpTransport, SmtpTransportBuilder},
};
use crate::transport::smtp::extension::ClientId;

pub mod client;
pub mod commands;
mod connection_url;
mod error;
pub mod extension;
pub mod response;
mod transport;

// Registered port numbers:
// https://www.iana.org/assignments/service-names-port-numbers/service-names-port-numbers.xhtml

/// Default smtp port
pub const SMTP_PORT: u16 = 25;

/// Default timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct SmtpInfo {
    /// Name sent during EHLO
    hello_name: ClientId,
    /// Server we are connecting to
    server: String,
    /// Port to connect to
    port: u16,
    /// Timeout for connecting, reading and writing
    timeout: Option<Duration>,
}

impl Default for SmtpInfo {
    fn default() -> Self {
        Self {
            server: "localhost".to_owned(),
            port: SMTP_PORT,
            hello_name: ClientId::default(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}
