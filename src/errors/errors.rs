use std::fmt::Display;

use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_internal_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnterminatedString => "UnterminatedString",
            ErrorImpl::UnbalancedParens { .. } => "UnbalancedParens",
            ErrorImpl::EmptyTree => "EmptyTree",
            ErrorImpl::NestingTooDeep { .. } => "NestingTooDeep",
            ErrorImpl::UnknownSource { .. } => "UnknownSource",
            ErrorImpl::InvalidCheckLevel { .. } => "InvalidCheckLevel",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, every node must start with `(` and a kind",
                token
            )),
            ErrorImpl::UnterminatedString => ErrorTip::None,
            ErrorImpl::UnbalancedParens { open } => ErrorTip::Suggestion(format!(
                "{} node(s) left open, did you miss a `)`?",
                open
            )),
            ErrorImpl::EmptyTree => ErrorTip::None,
            ErrorImpl::NestingTooDeep { limit } => ErrorTip::Suggestion(format!(
                "Nodes may nest at most {} levels deep",
                limit
            )),
            ErrorImpl::UnknownSource { filename } => ErrorTip::Suggestion(format!(
                "Map `{}` into the index before checking it",
                filename
            )),
            ErrorImpl::InvalidCheckLevel { level } => ErrorTip::Suggestion(format!(
                "Unknown level `{}`, expected one of normal, typed, strict",
                level
            )),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.internal_error, self.position)
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unbalanced parentheses: {open} left open")]
    UnbalancedParens { open: usize },
    #[error("tree text contains no nodes")]
    EmptyTree,
    #[error("nodes nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
    #[error("source {filename:?} has not been mapped")]
    UnknownSource { filename: String },
    #[error("invalid check level {level:?}")]
    InvalidCheckLevel { level: String },
}
