//! Error types for lrutrace

use std::fmt;

/// Result type alias for lrutrace operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache construction, command parsing and consistency checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Capacity must be at least 1
    InvalidCapacity(usize),

    /// Unknown or malformed batch command
    InvalidCommand {
        /// Offending token, as typed
        token: String,
        /// Parser failure that rejected it
        cause: Box<Error>,
    },

    /// Parse error
    Parse(String),

    /// Internal list/index invariant violated
    Invariant(String),
}

impl Error {
    /// Wrap a parser failure with the token it was raised for
    pub fn invalid_command(token: &str, cause: Error) -> Self {
        Error::InvalidCommand {
            token: token.to_string(),
            cause: Box::new(cause),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCapacity(cap) => {
                write!(f, "Invalid capacity: {} (must be at least 1)", cap)
            }
            Error::InvalidCommand { token, cause } => {
                write!(f, "Unknown/invalid command: \"{}\" ({})", token, cause)
            }
            Error::Parse(msg) => write!(f, "Parse error: {}", msg),
            Error::Invariant(msg) => write!(f, "Invariant violated: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidCommand { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl From<nom::Err<nom::error::Error<&str>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&str>>) -> Self {
        match err {
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                Error::Parse(format!("expected {:?} at \"{}\"", e.code, e.input))
            }
            nom::Err::Incomplete(_) => Error::Parse("incomplete input".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nom::error::ErrorKind;
    use std::error::Error as _;

    #[test]
    fn test_display() {
        assert_eq!(
            Error::InvalidCapacity(0).to_string(),
            "Invalid capacity: 0 (must be at least 1)"
        );
        assert_eq!(
            Error::invalid_command("pop 1", Error::Parse("expected Tag at \"pop 1\"".into()))
                .to_string(),
            "Unknown/invalid command: \"pop 1\" (Parse error: expected Tag at \"pop 1\")"
        );
    }

    #[test]
    fn test_from_nom_error() {
        let err: Error = nom::Err::Error(nom::error::Error::new("x 1", ErrorKind::Tag)).into();
        assert_eq!(err, Error::Parse("expected Tag at \"x 1\"".to_string()));
    }

    #[test]
    fn test_invalid_command_source() {
        let err = Error::invalid_command("get", Error::Parse("expected space".into()));
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "Parse error: expected space");
    }
}
