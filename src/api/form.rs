//! Decoding for `application/x-www-form-urlencoded` request bodies.

use std::{borrow::Cow, collections::HashMap};

use percent_encoding::percent_decode;
use thiserror::Error;

/// Decoded form data, mapping each key to its values in the order they appeared.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub(crate) struct Form(HashMap<String, Vec<String>>);

impl Form {
    /// Gets the first value of a key, if the key is present.
    pub(crate) fn first(&self, key: &str) -> Option<&str> {
        self.0.get(key)?.first().map(String::as_str)
    }
}

/// An error decoding a [`Form`].
#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub(crate) enum FormError {
    /// A `%` wasn't followed by two hexadecimal digits.
    #[error("invalid URL escape {0:?}")]
    InvalidEscape(String),

    /// A pair contained a `;`, which some parsers treat as a separator and others don't.
    #[error("invalid semicolon separator in query")]
    Semicolon,

    /// A key or value wasn't valid UTF-8 once decoded.
    #[error("invalid UTF-8 in form data")]
    InvalidUtf8,
}

/// Decodes a form body.
///
/// Pairs are separated by `&` and empty pairs are skipped. A pair without `=` is a key with an
/// empty value. Keys may repeat, in which case their values accumulate.
///
/// # Errors
///
/// See [`FormError`].
pub(crate) fn parse(body: &[u8]) -> Result<Form, FormError> {
    let mut fields: HashMap<String, Vec<String>> = HashMap::new();

    for pair in body.split(|&byte| byte == b'&') {
        if pair.is_empty() {
            continue;
        }

        if pair.contains(&b';') {
            return Err(FormError::Semicolon);
        }

        let mut parts = pair.splitn(2, |&byte| byte == b'=');
        let key = decode_component(parts.next().unwrap_or_default())?;
        let value = decode_component(parts.next().unwrap_or_default())?;

        fields.entry(key).or_default().push(value);
    }

    Ok(Form(fields))
}

/// Decodes a single key or value, turning `+` into a space and `%XX` into the byte `0xXX`.
fn decode_component(component: &[u8]) -> Result<String, FormError> {
    check_escapes(component)?;

    let spaced: Vec<u8> = component
        .iter()
        .map(|&byte| if byte == b'+' { b' ' } else { byte })
        .collect();

    percent_decode(&spaced)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|_| FormError::InvalidUtf8)
}

/// Checks that every `%` in a component starts a valid escape.
fn check_escapes(component: &[u8]) -> Result<(), FormError> {
    for (index, _) in component
        .iter()
        .enumerate()
        .filter(|&(_, &byte)| byte == b'%')
    {
        let digits = component.get(index + 1..index + 3);

        if !digits.is_some_and(|digits| digits.iter().all(u8::is_ascii_hexdigit)) {
            let escape = component
                .get(index..(index + 3).min(component.len()))
                .unwrap_or_default();

            return Err(FormError::InvalidEscape(
                String::from_utf8_lossy(escape).into_owned(),
            ));
        }
    }

    Ok(())
}
