use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::MalformedTokenError;

/// A rule's token list could not be turned into a condition tree.
///
/// `position` is an index into the token list that was being parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("parse error at token {position}: {kind}")]
pub struct ParseError {
    pub position: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(position: usize, kind: ParseErrorKind) -> Self {
        Self { position, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ParseErrorKind {
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("'(' is never closed")]
    UnclosedBracket,
    #[error("'[' is never closed")]
    UnterminatedCoreq,
    #[error("unexpected token '{0}' in co-requisite")]
    UnexpectedCoreqToken(String),
    #[error("GRADE must be followed by 'in'")]
    MissingIn,
    #[error("GRADE ... in is missing its course")]
    MissingGradeCourse,
    #[error("unrecognised category after 'in'")]
    InvalidCategory,
    #[error("brackets are nested too deeply")]
    TooDeep,
    #[error(transparent)]
    MalformedToken(#[from] MalformedTokenError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ParseError::new(1, ParseErrorKind::UnexpectedToken("&&&".into()));
        assert_eq!(err.to_string(), "parse error at token 1: unexpected token '&&&'");

        let err = ParseError::new(0, ParseErrorKind::UnclosedBracket);
        assert_eq!(err.to_string(), "parse error at token 0: '(' is never closed");
    }
}
