//! Error type for message content

use std::{
    error::Error as StdError,
    fmt::{self, Display, Formatter},
};

/// Error type for message content
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
pub enum Error {
    /// No sender was given to the builder
    MissingFrom,
    /// The envelope needs at least one recipient
    MissingTo,
    /// Subject is empty
    EmptySubject,
    /// Body is empty
    EmptyBody,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Error::MissingFrom => "missing source address",
            Error::MissingTo => "missing destination address, invalid envelope",
            Error::EmptySubject => "empty email subject",
            Error::EmptyBody => "empty email body",
        })
    }
}

impl StdError for Error {}
