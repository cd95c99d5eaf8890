//! Ratemail is a small SMTP client for application notifications.
//!
//! It renders single-part messages (plain text or HTML, base64 encoded),
//! delivers them over SMTP to every recipient on one connection, and
//! can throttle outbound volume with a sliding-window rate limiter so a
//! misbehaving caller does not get the sending host blacklisted.
//!
//! ## Features
//!
//! * **hostname**: use the machine hostname in `EHLO` (enabled by default)
//! * **tracing**: log wire traffic and throttling with [tracing] (enabled by default)
//! * **serde**: (de)serialize addresses and mailboxes, e.g. from configuration files
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use ratemail::{Message, SmtpTransport, Transport};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let message = Message::builder()
//!     .from("Alerts <alerts@example.com>".parse()?)
//!     .to("Ops <ops@example.com>".parse()?)
//!     .to("oncall@example.com".parse()?)
//!     .subject("Disk almost full")
//!     .with_limiter(true)
//!     .body("/var is at 97%")?;
//! message.validate()?;
//!
//! let mailer = SmtpTransport::builder("mail.example.com")
//!     .port(25)
//!     .timeout(Some(Duration::from_secs(10)))
//!     .limiter(20, Duration::from_secs(30 * 60))
//!     .build()?;
//!
//! mailer.send(&message)?;
//! # Ok(())
//! # }
//! ```
//!
//! Sends with [`Message::with_limiter`] set are silently dropped once the
//! limiter has tripped; [`RateLimiter::rejected`] tells how many were.
//!
//! [tracing]: https://docs.rs/tracing

#![doc(html_root_url = "https://docs.rs/crate/ratemail/0.3.2")]
#![forbid(unsafe_code)]
#![deny(
    trivial_casts,
    unused_import_braces,
    missing_debug_implementations,
    missing_docs,
    clippy::explicit_iter_loop,
    clippy::unwrap_used,
    clippy::string_add
)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod address;
mod base64;
pub mod error;
pub mod limiter;
pub mod message;
pub mod transport;

use std::error::Error as StdError;

pub use crate::{
    address::{first_invalid, Address, Envelope},
    error::Error,
    limiter::RateLimiter,
    message::{Mailbox, Message},
    transport::{
        smtp::{SmtpTransport, SmtpTransportBuilder},
        stub::StubTransport,
        Transport,
    },
};

pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;
