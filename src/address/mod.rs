//! Email addresses

#[cfg(feature = "serde")]
mod serde;

mod envelope;
pub(crate) mod parsers;
mod types;
mod validate;

pub use self::{
    envelope::Envelope,
    types::{Address, AddressError},
    validate::{first_invalid, is_valid},
};
