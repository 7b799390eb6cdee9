//! URL with a decoded and a raw (percent-encoded) path.
//!
//! # Responsibilities
//! - Parse route destinations and request targets without normalizing escapes away
//! - Keep `path` (decoded) next to `raw_path` (as presented, when it differs
//!   from the canonical escaping)
//! - Serialize back to the exact escapes the input carried
//!
//! # Design Decisions
//! - `raw_path` is empty whenever the canonical escaping of `path` reproduces
//!   the input, so most URLs carry a single representation
//! - Serialization only trusts `raw_path` while it is a valid encoding of `path`;
//!   otherwise `path` is escaped canonically
//! - Hosts are kept verbatim, which lets route templates embed `$path` in them

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;

/// Bytes escaped in a path segment: everything but unreserved characters and
/// `$ & + , / : ; = @`.
const PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b',')
    .remove(b'/')
    .remove(b':')
    .remove(b';')
    .remove(b'=')
    .remove(b'@');

/// Errors produced while parsing a URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("invalid URL escape {0:?}")]
    InvalidEscape(String),

    #[error("invalid control character in URL")]
    ControlCharacter,
}

/// A parsed URL carrying both path representations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Url {
    /// Lower-cased scheme, empty for relative references.
    pub scheme: String,
    /// Host (and port) exactly as written.
    pub host: String,
    /// Percent-decoded path.
    pub path: String,
    /// Path as presented; empty when `escape_path(path)` reproduces it.
    pub raw_path: String,
    /// Encoded query without the leading `?`.
    pub raw_query: String,
}

impl Url {
    /// Parse an absolute URL (`http://host/p?q`) or a relative reference (`/p?q`).
    pub fn parse(input: &str) -> Result<Self, UrlError> {
        if input.bytes().any(|b| b < 0x20 || b == 0x7f) {
            return Err(UrlError::ControlCharacter);
        }

        let rest = input.split_once('#').map_or(input, |(before, _)| before);
        let (rest, raw_query) = match rest.split_once('?') {
            Some((before, query)) => (before, query.to_string()),
            None => (rest, String::new()),
        };

        let (scheme, rest) = split_scheme(rest);
        let (host, rest) = match rest.strip_prefix("//") {
            Some(authority) => match authority.find('/') {
                Some(idx) => (authority[..idx].to_string(), &authority[idx..]),
                None => (authority.to_string(), ""),
            },
            None => (String::new(), rest),
        };

        let mut url = Url {
            scheme,
            host,
            raw_query,
            ..Default::default()
        };
        url.set_path(rest)?;
        Ok(url)
    }

    /// Set both path representations from an encoded path.
    ///
    /// Escapes that are not UTF-8 decode to U+FFFD in `path`; `raw_path` then
    /// keeps the bytes as presented.
    pub fn set_path(&mut self, encoded: &str) -> Result<(), UrlError> {
        let (path, lossy) = unescape(encoded)?;
        self.raw_path = if !lossy && Self::escape_path(&path) == encoded {
            String::new()
        } else {
            encoded.to_string()
        };
        self.path = path;
        Ok(())
    }

    /// Canonical escaping of a decoded path.
    pub fn escape_path(path: &str) -> String {
        utf8_percent_encode(path, PATH).to_string()
    }

    /// The encoded path used for serialization.
    ///
    /// Returns `raw_path` when it is a valid encoding of `path`, and the
    /// canonical escaping of `path` otherwise.
    pub fn escaped_path(&self) -> String {
        if !self.raw_path.is_empty()
            && valid_encoded(&self.raw_path)
            && unescape(&self.raw_path).is_ok_and(|(p, _)| p == self.path)
        {
            return self.raw_path.clone();
        }
        Self::escape_path(&self.path)
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.scheme.is_empty() {
            write!(f, "{}:", self.scheme)?;
        }
        if !self.host.is_empty() {
            write!(f, "//{}", self.host)?;
        }
        let path = self.escaped_path();
        if !path.is_empty() && !path.starts_with('/') && !self.host.is_empty() {
            f.write_str("/")?;
        }
        f.write_str(&path)?;
        if !self.raw_query.is_empty() {
            write!(f, "?{}", self.raw_query)?;
        }
        Ok(())
    }
}

/// Split a leading `scheme:` off, returning the lower-cased scheme.
fn split_scheme(input: &str) -> (String, &str) {
    for (i, c) in input.char_indices() {
        match c {
            'a'..='z' | 'A'..='Z' => {}
            '0'..='9' | '+' | '-' | '.' if i > 0 => {}
            ':' if i > 0 => return (input[..i].to_ascii_lowercase(), &input[i + 1..]),
            _ => break,
        }
    }
    (String::new(), input)
}

/// Percent-decode, rejecting malformed escapes.
///
/// Returns the decoded text and whether invalid UTF-8 was replaced.
fn unescape(s: &str) -> Result<(String, bool), UrlError> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                let end = (i + 3).min(bytes.len());
                return Err(UrlError::InvalidEscape(
                    String::from_utf8_lossy(&bytes[i..end]).into_owned(),
                ));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    let bytes: Vec<u8> = percent_decode_str(s).collect();
    let lossy = std::str::from_utf8(&bytes).is_err();
    Ok((String::from_utf8_lossy(&bytes).into_owned(), lossy))
}

/// Whether `s` only contains characters allowed in an encoded path.
fn valid_encoded(s: &str) -> bool {
    s.bytes().all(|b| {
        b.is_ascii_alphanumeric()
            || matches!(
                b,
                b'-' | b'_'
                    | b'.'
                    | b'~'
                    | b'/'
                    | b'!'
                    | b'$'
                    | b'&'
                    | b'\''
                    | b'('
                    | b')'
                    | b'*'
                    | b'+'
                    | b','
                    | b';'
                    | b'='
                    | b':'
                    | b'@'
                    | b'['
                    | b']'
                    | b'%'
            )
    })
}
