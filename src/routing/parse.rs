//! Route table command parsing.
//!
//! ```text
//! route add <svc> <src> <dst> [weight <w>] [tags "<t1>,<t2>"] [opts "<k>=<v> <k>=<v>"]
//! route del <svc> [<src> [<dst>]]
//! ```
//!
//! Lines starting with `#` and blank lines are ignored. `<src>` is
//! `[host]/path`.

use std::collections::HashMap;

use thiserror::Error;

use crate::routing::target::Target;
use crate::url::{Url, UrlError};

/// Error for a single route table line.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// 1-based line number.
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    #[error("missing {0}")]
    Missing(&'static str),

    #[error("unexpected token {0:?}")]
    UnexpectedToken(String),

    #[error("unterminated quote")]
    UnterminatedQuote,

    #[error("source {0:?} must contain a path")]
    InvalidSource(String),

    #[error("invalid destination {url:?}: {source}")]
    InvalidDestination { url: String, source: UrlError },

    #[error("invalid weight {0:?}")]
    InvalidWeight(String),

    #[error("invalid option {0:?}")]
    InvalidOption(String),

    #[error("redirect code {0:?} is not in 300-399")]
    InvalidRedirectCode(String),
}

/// A parsed route table command.
#[derive(Debug, Clone)]
pub enum Command {
    Add {
        host: String,
        path: String,
        target: Target,
    },
    Del {
        service: String,
        source: Option<(String, String)>,
        dst: Option<String>,
    },
}

/// Parse a route table into commands, in order.
pub fn parse(input: &str) -> Result<Vec<Command>, ParseError> {
    let mut commands = Vec::new();
    for (idx, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let command = parse_line(line).map_err(|kind| ParseError { line: idx + 1, kind })?;
        commands.push(command);
    }
    Ok(commands)
}

fn parse_line(line: &str) -> Result<Command, ParseErrorKind> {
    let tokens = tokenize(line)?;
    let mut tokens = tokens.into_iter();

    match tokens.next().as_deref() {
        Some("route") => {}
        Some(other) => return Err(ParseErrorKind::UnknownCommand(other.to_string())),
        None => return Err(ParseErrorKind::Missing("command")),
    }

    match tokens.next().as_deref() {
        Some("add") => parse_add(tokens),
        Some("del") => {
            let service = tokens.next().ok_or(ParseErrorKind::Missing("service"))?;
            let source = tokens.next().map(|s| split_source(&s)).transpose()?;
            let dst = tokens.next();
            if let Some(extra) = tokens.next() {
                return Err(ParseErrorKind::UnexpectedToken(extra));
            }
            Ok(Command::Del { service, source, dst })
        }
        Some(other) => Err(ParseErrorKind::UnknownCommand(format!("route {other}"))),
        None => Err(ParseErrorKind::Missing("route command")),
    }
}

fn parse_add(mut tokens: impl Iterator<Item = String>) -> Result<Command, ParseErrorKind> {
    let service = tokens.next().ok_or(ParseErrorKind::Missing("service"))?;
    let source = tokens.next().ok_or(ParseErrorKind::Missing("source"))?;
    let dst = tokens.next().ok_or(ParseErrorKind::Missing("destination"))?;

    let (host, path) = split_source(&source)?;
    let url = Url::parse(&dst).map_err(|source| ParseErrorKind::InvalidDestination {
        url: dst.clone(),
        source,
    })?;

    let mut target = Target {
        timer_name: format!("{service}.{host}{path}.{}", url.host),
        service,
        url,
        ..Default::default()
    };

    while let Some(keyword) = tokens.next() {
        let value = tokens.next().ok_or(ParseErrorKind::Missing("value"))?;
        match keyword.as_str() {
            "weight" => {
                target.fixed_weight = value
                    .parse::<f64>()
                    .ok()
                    .filter(|w| (0.0..=1.0).contains(w))
                    .ok_or(ParseErrorKind::InvalidWeight(value))?;
            }
            "tags" => {
                target.tags = value
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect();
            }
            "opts" => target.opts = parse_opts(&value)?,
            _ => return Err(ParseErrorKind::UnexpectedToken(keyword)),
        }
    }

    apply_opts(&mut target)?;
    Ok(Command::Add { host, path, target })
}

fn parse_opts(value: &str) -> Result<HashMap<String, String>, ParseErrorKind> {
    value
        .split_whitespace()
        .map(|kv| match kv.split_once('=') {
            Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
            _ => Err(ParseErrorKind::InvalidOption(kv.to_string())),
        })
        .collect()
}

fn apply_opts(target: &mut Target) -> Result<(), ParseErrorKind> {
    if let Some(strip) = target.opts.get("strip") {
        target.strip_path = strip.clone();
    }
    if let Some(host) = target.opts.get("host") {
        target.host = host.clone();
    }
    if let Some(skip) = target.opts.get("tlsskipverify") {
        target.tls_skip_verify = skip == "true";
    }
    if let Some(code) = target.opts.get("redirect") {
        target.redirect_code = code
            .parse::<u16>()
            .ok()
            .filter(|c| (300..=399).contains(c))
            .ok_or_else(|| ParseErrorKind::InvalidRedirectCode(code.clone()))?;
    }
    for kind in ["allow", "deny"] {
        if let Some(rules) = target.opts.get(kind) {
            let rules = rules.split(',').map(String::from).collect();
            target.access_rules.insert(kind.to_string(), rules);
        }
    }
    Ok(())
}

/// Split `[host]/path` into a lower-cased host and the path.
fn split_source(source: &str) -> Result<(String, String), ParseErrorKind> {
    match source.find('/') {
        Some(idx) => Ok((source[..idx].to_ascii_lowercase(), source[idx..].to_string())),
        None => Err(ParseErrorKind::InvalidSource(source.to_string())),
    }
}

/// Split on whitespace, keeping double-quoted strings together.
fn tokenize(line: &str) -> Result<Vec<String>, ParseErrorKind> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut token = String::new();
        if c == '"' {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some(ch) => token.push(ch),
                    None => return Err(ParseErrorKind::UnterminatedQuote),
                }
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                token.push(ch);
                chars.next();
            }
        }
        tokens.push(token);
    }
    Ok(tokens)
}
