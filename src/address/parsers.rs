//! Parsers for the mailbox grammar accepted by this crate.
//!
//! This is narrower than [RFC 5322]: no quoted local parts,
//! no comments, no address literals. Domains are dot-separated labels of
//! letters, digits and inner hyphens.
//!
//! [RFC 5322]: https://datatracker.ietf.org/doc/html/rfc5322

use chumsky::{error::Cheap, prelude::*, Error as _};

/// Longest domain label, RFC 1035 section 2.3.4
const MAX_LABEL_LEN: usize = 63;

// atext, without the characters that would need quoting
fn local_char(c: &char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            *c,
            '.' | '!'
                | '#'
                | '$'
                | '%'
                | '&'
                | '\''
                | '*'
                | '+'
                | '/'
                | '='
                | '?'
                | '^'
                | '_'
                | '`'
                | '{'
                | '|'
                | '}'
                | '~'
                | '-'
        )
}

// local-part = 1*local-char
fn local_part() -> impl Parser<char, String, Error = Cheap<char>> {
    filter(local_char).repeated().at_least(1).collect()
}

fn is_valid_label(label: &str) -> bool {
    let starts_alnum = label.starts_with(|c: char| c.is_ascii_alphanumeric());
    let ends_alnum = label.ends_with(|c: char| c.is_ascii_alphanumeric());
    label.len() <= MAX_LABEL_LEN && starts_alnum && ends_alnum
}

// label = alnum [ *61( alnum / "-" ) alnum ]
fn label() -> impl Parser<char, String, Error = Cheap<char>> {
    filter(|c: &char| c.is_ascii_alphanumeric() || *c == '-')
        .repeated()
        .at_least(1)
        .collect::<String>()
        .try_map(|label, span| {
            if is_valid_label(&label) {
                Ok(label)
            } else {
                Err(Cheap::expected_input_found(span, std::iter::empty(), None))
            }
        })
}

// domain = label *( "." label )
fn domain() -> impl Parser<char, String, Error = Cheap<char>> {
    label()
        .separated_by(just('.'))
        .at_least(1)
        .map(|labels| labels.join("."))
}

// addr-spec = local-part "@" domain
pub(crate) fn addr_spec() -> impl Parser<char, (String, String), Error = Cheap<char>> {
    local_part().then_ignore(just('@')).then(domain())
}

// quoted-string, with backslash escapes
fn quoted_name() -> impl Parser<char, String, Error = Cheap<char>> {
    just('\\')
        .ignore_then(any())
        .or(filter(|c: &char| *c != '"' && *c != '\\'))
        .repeated()
        .delimited_by(just('"'), just('"'))
        .collect()
}

fn plain_name() -> impl Parser<char, String, Error = Cheap<char>> {
    filter(|c: &char| *c != '<' && *c != '"')
        .repeated()
        .at_least(1)
        .collect()
}

// mailbox = [display-name] "<" addr-spec ">" / addr-spec
pub(crate) fn mailbox() -> impl Parser<char, (Option<String>, (String, String)), Error = Cheap<char>>
{
    let name = quoted_name().or(plain_name()).map(|name| {
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_owned())
    });
    let named = name
        .or_not()
        .map(Option::flatten)
        .padded()
        .then(addr_spec().delimited_by(just('<'), just('>')));
    let bare = addr_spec().map(|addr| (None, addr));

    named.or(bare).padded().then_ignore(end())
}
