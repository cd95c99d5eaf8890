use std::{
    fmt::{Display, Formatter, Result as FmtResult, Write},
    str::FromStr,
};

use chumsky::Parser;

use super::encoded_word;
use crate::address::{parsers, Address, AddressError};

/// Represents an email address with an optional name for the sender/recipient.
///
/// This type contains email address and the sender/recipient name
/// (_"Some Name" \<user@domain.tld\>_ or _withoutname@domain.tld_).
///
/// **NOTE**: Enable feature "serde" to be able to serialize/deserialize it using [serde](https://serde.rs/).
///
/// # Examples
///
/// ```
/// # use ratemail::{Address, Mailbox};
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let mailbox: Mailbox = "John Smith <example@email.com>".parse()?;
/// assert_eq!(mailbox.to_string(), r#""John Smith" <example@email.com>"#);
///
/// let bare = Mailbox::new(None, Address::new("example", "email.com")?);
/// assert_eq!(bare.to_string(), "example@email.com");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mailbox {
    /// The name associated with the address.
    pub name: Option<String>,

    /// The email address itself.
    pub email: Address,
}

impl Mailbox {
    /// Creates a new `Mailbox` using an email address and the name of the recipient if there is one.
    pub fn new(name: Option<String>, email: Address) -> Self {
        Mailbox { name, email }
    }
}

impl Display for Mailbox {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if let Some(name) = &self.name {
            let name = name.trim();
            if !name.is_empty() {
                write_name(f, name)?;
                f.write_str(" <")?;
                self.email.fmt(f)?;
                return f.write_char('>');
            }
        }
        self.email.fmt(f)
    }
}

// Printable ASCII goes in a quoted string, anything else in an encoded word
fn write_name(f: &mut Formatter<'_>, name: &str) -> FmtResult {
    if !name.chars().all(|c| c == ' ' || c.is_ascii_graphic()) {
        return f.write_str(&encoded_word::encode(name));
    }

    f.write_char('"')?;
    for c in name.chars() {
        if matches!(c, '"' | '\\') {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('"')
}

impl<S: Into<String>, T: Into<String>> TryFrom<(S, T)> for Mailbox {
    type Error = AddressError;

    fn try_from(header: (S, T)) -> Result<Self, Self::Error> {
        let (name, address) = header;
        Ok(Mailbox::new(
            Some(name.into()),
            Address::try_from(address.into())?,
        ))
    }
}

impl FromStr for Mailbox {
    type Err = AddressError;

    fn from_str(src: &str) -> Result<Mailbox, Self::Err> {
        let (name, (user, domain)) = parsers::mailbox()
            .parse(src)
            .map_err(|_errs| AddressError::InvalidInput)?;

        Ok(Mailbox::new(name, Address::new(user, domain)?))
    }
}

impl From<Address> for Mailbox {
    fn from(value: Address) -> Self {
        Self::new(None, value)
    }
}
