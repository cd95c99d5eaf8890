//! Representation of an email address

use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use chumsky::{prelude::end, Parser};

use super::parsers;

/// Shortest accepted address, `a@b`
pub(crate) const MIN_ADDRESS_LEN: usize = 3;
/// Longest accepted address
pub(crate) const MAX_ADDRESS_LEN: usize = 255;

/// Represents an email address with a user and a domain name.
///
/// This type contains email in canonical form (_user@domain.tld_).
///
/// **NOTE**: Enable feature "serde" to be able to serialize/deserialize it using [serde](https://serde.rs/).
///
/// # Examples
///
/// ```
/// use ratemail::Address;
///
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let address = "user@email.com".parse::<Address>()?;
/// assert_eq!(address.user(), "user");
/// assert_eq!(address.domain(), "email.com");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Address {
    /// Complete address
    serialized: String,
    /// Index of the '@' in `serialized`, its length when there is none
    at_start: usize,
}

impl Address {
    /// Creates a new email address from a user and domain.
    ///
    /// # Examples
    ///
    /// ```
    /// use ratemail::Address;
    ///
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// let address = Address::new("user", "email.com")?;
    /// let expected = "user@email.com".parse::<Address>()?;
    /// assert_eq!(expected, address);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new<U: AsRef<str>, D: AsRef<str>>(user: U, domain: D) -> Result<Self, AddressError> {
        format!("{}@{}", user.as_ref(), domain.as_ref()).try_into()
    }

    /// Creates a new email address from a string without checking it.
    ///
    /// Addresses loaded from configuration are typically built this way and
    /// checked afterwards with [`first_invalid`](crate::first_invalid).
    /// Sending to an address containing a line break or an angle bracket
    /// fails with a client error.
    pub fn new_unchecked(serialized: String) -> Self {
        let at_start = serialized.rfind('@').unwrap_or(serialized.len());

        Self {
            serialized,
            at_start,
        }
    }

    /// Gets the user portion of the `Address`.
    pub fn user(&self) -> &str {
        &self.serialized[..self.at_start]
    }

    /// Gets the domain portion of the `Address`.
    ///
    /// Empty for an unchecked address without '@'.
    pub fn domain(&self) -> &str {
        self.serialized.get(self.at_start + 1..).unwrap_or_default()
    }

    /// The complete address
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    /// Check if the address contains non-ascii chars
    pub(crate) fn is_ascii(&self) -> bool {
        self.serialized.is_ascii()
    }

    /// Check that the address can not end the `<...>` path it is sent in
    pub(crate) fn is_transmittable(&self) -> bool {
        !self.serialized.contains(is_reserved)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.serialized)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(val: &str) -> Result<Self, AddressError> {
        let at_start = check_address(val)?;
        Ok(Address {
            serialized: val.into(),
            at_start,
        })
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(serialized: String) -> Result<Self, AddressError> {
        let at_start = check_address(&serialized)?;
        Ok(Address {
            serialized,
            at_start,
        })
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.serialized
    }
}

/// Characters that end a command line or an SMTP path
pub(crate) fn is_reserved(c: char) -> bool {
    matches!(c, '\r' | '\n' | '<' | '>')
}

/// Checks length and syntax, returns the index of the '@'
pub(crate) fn check_address(val: &str) -> Result<usize, AddressError> {
    if !(MIN_ADDRESS_LEN..=MAX_ADDRESS_LEN).contains(&val.len()) {
        return Err(AddressError::InvalidLength);
    }

    let (user, _domain) = parsers::addr_spec()
        .then_ignore(end())
        .parse(val)
        .map_err(|_errs| AddressError::InvalidSyntax)?;
    Ok(user.len())
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
/// Errors in email addresses parsing
pub enum AddressError {
    /// Shorter than 3 or longer than 255 bytes
    InvalidLength,
    /// Not `local@domain`, or a part contains forbidden characters
    InvalidSyntax,
    /// Not a mailbox at all
    InvalidInput,
}

impl Error for AddressError {}

impl Display for AddressError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AddressError::InvalidLength => f.write_str("Invalid email length"),
            AddressError::InvalidSyntax => f.write_str("Invalid email syntax"),
            AddressError::InvalidInput => f.write_str("Invalid input"),
        }
    }
}
