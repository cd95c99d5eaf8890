//! ### Sending Messages
//!
//! A transport delivers [`Message`]s. Callers program against the
//! [`Transport`] trait so the delivery engine can be swapped without
//! touching them.
//!
//! The following transports are available:
//!
//! * The [`SmtpTransport`](smtp::SmtpTransport) speaks SMTP to a relay
//!   server and can throttle messages with a [`RateLimiter`](crate::RateLimiter).
//! * The [`StubTransport`](stub::StubTransport) keeps the messages it is
//!   given and returns a fixed result. It is meant for tests.

use crate::Message;

pub mod smtp;
pub mod stub;

/// Blocking Transport method for emails
pub trait Transport {
    /// Response produced by the Transport
    type Ok;
    /// Error produced by the Transport
    type Error;

    /// Sends the email
    fn send(&self, message: &Message) -> Result<Self::Ok, Self::Error>;
}
