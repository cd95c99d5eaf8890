//! SMTP client
//!
//! `SmtpConnection` allows manually sending SMTP commands.
//!
//! ```rust,no_run
//! use ratemail::{
//!     address::Envelope,
//!     transport::smtp::{
//!         client::SmtpConnection, extension::ClientId, SMTP_PORT,
//!     },
//!     Address,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut email_client = SmtpConnection::connect(
//!     ("localhost", SMTP_PORT),
//!     None,
//!     &ClientId::default(),
//! )?;
//! let envelope = Envelope::new(
//!     "user@example.com".parse::<Address>()?,
//!     vec!["user@example.org".parse::<Address>()?],
//! )?;
//! email_client.send(&envelope, b"Hello\r\n")?;
//! email_client.abort();
//! # Ok(())
//! # }
//! ```

pub use self::{connection::SmtpConnection, mock::MockStream, net::NetworkStream};

mod connection;
mod mock;
mod net;

/// The codec used for transparency
///
/// It doubles every dot starting a line and finishes the data with a lone
/// dot, adding a line break first only when the content does not end with
/// one.
#[derive(Clone, Copy, Debug)]
pub struct ClientCodec {
    escape_count: u8,
}

impl Default for ClientCodec {
    // The data starts on a fresh line, right after `DATA\r\n`.
    fn default() -> Self {
        ClientCodec { escape_count: 2 }
    }
}

impl ClientCodec {
    /// Creates a new client codec
    pub fn new() -> Self {
        ClientCodec::default()
    }

    /// Adds transparency
    pub fn encode(&mut self, frame: &[u8], buf: &mut Vec<u8>) {
        let mut start = 0;
        for (idx, byte) in frame.iter().enumerate() {
            self.escape_count = match (self.escape_count, *byte) {
                (_, b'\r') => 1,
                (1, b'\n') => 2,
                (2, b'.') => 3,
                _ => 0,
            };
            if self.escape_count == 3 {
                self.escape_count = 0;
                buf.extend_from_slice(&frame[start..idx]);
                buf.push(b'.');
                start = idx;
            }
        }
        buf.extend_from_slice(&frame[start..]);
    }

    /// Writes the end of data marker
    pub fn terminate(&mut self, buf: &mut Vec<u8>) {
        match self.escape_count {
            1 => buf.extend_from_slice(b"\n.\r\n"),
            2 => buf.extend_from_slice(b".\r\n"),
            _ => buf.extend_from_slice(b"\r\n.\r\n"),
        }
        self.escape_count = 2;
    }
}

/// Returns the string replacing all the CRLF with "\<CRLF\>"
///
/// Used for debug displays
#[cfg(feature = "tracing")]
pub(super) fn escape_crlf(string: &str) -> String {
    string.replace("\r\n", "<CRLF>")
}
