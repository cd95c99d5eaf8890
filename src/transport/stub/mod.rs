//! The stub transport keeps every message it is asked to send and returns a
//! fixed result. It can be useful for testing purposes.
//!
//! ```rust
//! use ratemail::{Message, StubTransport, Transport};
//!
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let message = Message::builder()
//!     .from("NoBody <nobody@domain.tld>".parse()?)
//!     .to("Hei <hei@domain.tld>".parse()?)
//!     .subject("Happy new year")
//!     .body("Be happy!")?;
//!
//! let sender = StubTransport::new_ok();
//! sender.send(&message)?;
//! assert_eq!(sender.messages(), vec![message]);
//! # Ok(())
//! # }
//! ```

use std::{
    error::Error as StdError,
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{Message, Transport};

/// Error returned by a stub transport built with [`StubTransport::new_error`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Error;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("stub error")
    }
}

impl StdError for Error {}

/// This transport records messages and returns the given response
///
/// Clones share the recorded messages.
#[derive(Debug, Clone)]
pub struct StubTransport {
    response: Result<(), Error>,
    messages: Arc<Mutex<Vec<Message>>>,
}

impl StubTransport {
    /// Creates a new transport that always returns the given response
    pub fn new(response: Result<(), Error>) -> StubTransport {
        StubTransport {
            response,
            messages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates a new transport that always returns a success response
    pub fn new_ok() -> StubTransport {
        Self::new(Ok(()))
    }

    /// Creates a new transport that always returns an error
    pub fn new_error() -> StubTransport {
        Self::new(Err(Error))
    }

    /// Messages given to [`send`](Transport::send), oldest first
    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Transport for StubTransport {
    type Ok = ();
    type Error = Error;

    fn send(&self, message: &Message) -> Result<Self::Ok, Self::Error> {
        #[cfg(feature = "tracing")]
        tracing::info!(
            from = %message.from(),
            recipients = message.to().len(),
            "stub transport got a message"
        );

        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        self.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> Message {
        Message::builder()
            .from("user@localhost".parse().unwrap())
            .to("root@localhost".parse().unwrap())
            .subject("Hello")
            .body("Hello World!")
            .unwrap()
    }

    #[test]
    fn records_messages() {
        let sender = StubTransport::new_ok();
        let clone = sender.clone();

        assert_eq!(sender.send(&message()), Ok(()));
        assert_eq!(clone.send(&message()), Ok(()));
        assert_eq!(sender.messages().len(), 2);
    }

    #[test]
    fn returns_configured_error() {
        let sender = StubTransport::new_error();
        assert_eq!(sender.send(&message()), Err(Error));
        assert_eq!(sender.messages(), vec![message()]);
    }

    #[test]
    fn usable_through_the_trait() {
        fn notify<T: Transport>(transport: &T, message: &Message) -> bool {
            transport.send(message).is_ok()
        }

        assert!(notify(&StubTransport::new_ok(), &message()));
        assert!(!notify(&StubTransport::new_error(), &message()));
    }
}
