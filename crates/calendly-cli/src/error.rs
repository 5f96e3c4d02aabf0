//! Command line usage errors

use std::fmt;

/// Errors raised while parsing the command line
#[derive(Debug, PartialEq, Eq)]
pub enum UsageError {
    /// No command given
    MissingCommand,
    /// Unknown command or subcommand
    UnknownCommand(String),
    /// Required positional argument missing
    MissingArgument(&'static str),
    /// Flag given without its value
    MissingFlagValue(String),
    /// Value that could not be parsed
    InvalidValue { name: &'static str, value: String },
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCommand => write!(f, "no command given (see --help)"),
            Self::UnknownCommand(cmd) => write!(f, "unknown command: {}", cmd),
            Self::MissingArgument(name) => write!(f, "missing argument: <{}>", name),
            Self::MissingFlagValue(flag) => write!(f, "flag {} requires a value", flag),
            Self::InvalidValue { name, value } => write!(f, "invalid {}: {}", name, value),
        }
    }
}

impl std::error::Error for UsageError {}

/// Result type alias
pub type Result<T> = std::result::Result<T, UsageError>;
