use std::fmt::{Formatter, Result as FmtResult};

use serde::{
    de::{Deserializer, Error as DeError, Unexpected, Visitor},
    ser::Serializer,
    Deserialize, Serialize,
};

use super::{types::is_reserved, Address};

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_ref())
    }
}

/// Addresses are read as-is apart from line breaks and angle brackets,
/// which are refused: configuration files are expected to be checked with
/// [`first_invalid`](crate::first_invalid) after loading.
impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AddressVisitor;

        impl Visitor<'_> for AddressVisitor {
            type Value = Address;

            fn expecting(&self, formatter: &mut Formatter<'_>) -> FmtResult {
                formatter.write_str("email address string")
            }

            fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
            where
                E: DeError,
            {
                self.visit_string(s.to_owned())
            }

            fn visit_string<E>(self, s: String) -> Result<Self::Value, E>
            where
                E: DeError,
            {
                if s.contains(is_reserved) {
                    return Err(E::invalid_value(Unexpected::Str(&s), &self));
                }
                Ok(Address::new_unchecked(s))
            }
        }

        deserializer.deserialize_str(AddressVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{first_invalid, Mailbox};

    #[test]
    fn round_trip_string() {
        let address: Address = "ops@example.com".parse().unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, r#""ops@example.com""#);

        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }

    #[test]
    fn config_list_is_checked_afterwards() {
        let json = r#"[
            {"name": "Ops", "email": "ops@example.com"},
            {"name": null, "email": "broken@@example.com"}
        ]"#;
        let mailboxes: Vec<Mailbox> = serde_json::from_str(json).unwrap();

        assert_eq!(mailboxes[0].name.as_deref(), Some("Ops"));
        assert_eq!(first_invalid(&mailboxes), Some("broken@@example.com"));
    }

    #[test]
    fn line_breaks_are_refused() {
        let json = r#""a@example.com>\r\nRCPT TO:<victim@evil.com""#;
        assert!(serde_json::from_str::<Address>(json).is_err());

        let json = r#"[{"name": "Ops", "email": "ops@example.com\r\nBcc: x@evil.com"}]"#;
        assert!(serde_json::from_str::<Vec<Mailbox>>(json).is_err());

        // Grammar errors are still left to `first_invalid`
        let address: Address = serde_json::from_str(r#""not an address""#).unwrap();
        assert_eq!(address.as_str(), "not an address");
    }
}
