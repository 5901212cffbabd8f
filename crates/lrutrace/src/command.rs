//! Batch command interpreter
//!
//! Input is free-form text, one command per line or comma-separated:
//! ```text
//! put 1 100, put 2 200
//! get 1
//! put 3
//! ```
//! `put <key> [<value...>]` stores the remaining words joined by single
//! spaces, or the key itself when no value is given. `get <key>` ignores any
//! trailing words. Keywords are case-insensitive.

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_till1, take_while1},
    combinator::{map, opt, rest},
    sequence::{preceded, tuple},
    IResult,
};

use crate::cache::LruCache;
use crate::error::{Error, Result};
use crate::trace::Trace;

/// A recognized batch command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `put <key> [<value...>]`
    Put {
        /// Key to store
        key: String,
        /// Value to store
        value: String,
    },
    /// `get <key>`
    Get {
        /// Key to look up
        key: String,
    },
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Put { key, value } => write!(f, "put {} {}", key, value),
            Command::Get { key } => write!(f, "get {}", key),
        }
    }
}

fn word(input: &str) -> IResult<&str, &str> {
    take_till1(char::is_whitespace)(input)
}

/// Any run of Unicode whitespace, matching what `word` stops at
fn separator(input: &str) -> IResult<&str, &str> {
    take_while1(char::is_whitespace)(input)
}

fn put_command(input: &str) -> IResult<&str, Command> {
    map(
        tuple((
            tag_no_case("put"),
            preceded(separator, word),
            opt(preceded(separator, rest)),
        )),
        |(_, key, tail): (&str, &str, Option<&str>)| {
            let value = tail
                .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| key.to_string());
            Command::Put {
                key: key.to_string(),
                value,
            }
        },
    )(input)
}

fn get_command(input: &str) -> IResult<&str, Command> {
    map(
        tuple((
            tag_no_case("get"),
            preceded(separator, word),
            opt(preceded(separator, rest)),
        )),
        |(_, key, _): (&str, &str, Option<&str>)| Command::Get {
            key: key.to_string(),
        },
    )(input)
}

/// Parse a single command token
pub fn parse_command(token: &str) -> Result<Command> {
    let token = token.trim();
    match alt((put_command, get_command))(token) {
        Ok(("", cmd)) => Ok(cmd),
        Ok((trailing, _)) => Err(Error::invalid_command(
            token,
            Error::Parse(format!("unexpected trailing input \"{}\"", trailing)),
        )),
        Err(e) => Err(Error::invalid_command(token, e.into())),
    }
}

/// Split batch text into tokens and parse each one independently.
///
/// A malformed token yields an error in its slot; the rest still parse.
pub fn parse_batch(text: &str) -> Vec<Result<Command>> {
    tokens(text).map(parse_command).collect()
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split([',', '\n'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Outcome of one batch token
#[derive(Debug, Clone, PartialEq)]
pub enum BatchItem {
    /// Command ran against the cache
    Executed {
        /// Parsed command
        command: Command,
        /// `get` result (always `None` for `put`)
        value: Option<String>,
        /// Steps the cache recorded
        trace: Trace<String, String>,
    },
    /// Token could not be parsed; nothing ran
    Rejected {
        /// Offending token
        token: String,
        /// Why it was rejected
        error: Error,
    },
}

/// Run every command in `text` against `cache`, in order.
///
/// Rejected tokens are reported in place and never stop the batch.
pub fn run_batch(cache: &mut LruCache<String, String>, text: &str) -> Vec<BatchItem> {
    tokens(text)
        .map(|token| match parse_command(token) {
            Ok(command) => execute(cache, command),
            Err(error) => BatchItem::Rejected {
                token: token.to_string(),
                error,
            },
        })
        .collect()
}

/// Run one parsed command against `cache`
pub fn execute(cache: &mut LruCache<String, String>, command: Command) -> BatchItem {
    match &command {
        Command::Put { key, value } => {
            let outcome = cache.put(key.clone(), value.clone());
            BatchItem::Executed {
                command,
                value: None,
                trace: outcome.trace,
            }
        }
        Command::Get { key } => {
            let outcome = cache.get(key);
            BatchItem::Executed {
                command,
                value: outcome.value,
                trace: outcome.trace,
            }
        }
    }
}
