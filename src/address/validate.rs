use super::types::check_address;
use crate::message::Mailbox;

/// Checks a mailbox string against the address grammar.
///
/// Valid addresses are 3 to 255 bytes long and look like `local@domain`,
/// where every domain label is 1 to 63 letters, digits or inner hyphens.
///
/// ```
/// use ratemail::address::is_valid;
///
/// assert!(is_valid("a@b.com"));
/// assert!(!is_valid("a@@b.com"));
/// ```
pub fn is_valid(address: &str) -> bool {
    check_address(address).is_ok()
}

/// Returns the first address of `mailboxes` that is not valid.
///
/// Meant for lists loaded from configuration, nothing in the send path
/// calls it.
///
/// ```
/// use ratemail::{first_invalid, Address, Mailbox};
///
/// let mailboxes = vec![
///     Mailbox::new(None, Address::new_unchecked("ops@example.com".into())),
///     Mailbox::new(None, Address::new_unchecked("ops@@example.com".into())),
/// ];
/// assert_eq!(first_invalid(&mailboxes), Some("ops@@example.com"));
/// assert_eq!(first_invalid(&mailboxes[..1]), None);
/// ```
pub fn first_invalid(mailboxes: &[Mailbox]) -> Option<&str> {
    mailboxes
        .iter()
        .map(|mailbox| mailbox.email.as_str())
        .find(|address| !is_valid(address))
}
