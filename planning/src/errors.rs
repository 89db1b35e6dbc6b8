use std::fmt::{Display, Formatter};

use crate::parsing::sexpr::Pos;

/// Failure while reading PDDL text: unbalanced parentheses, a missing
/// `define`, a malformed typed list. Carries the position of the offending
/// token or subexpression when one is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub pos: Option<Pos>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, pos: Option<Pos>) -> ParseError {
        ParseError {
            message: message.into(),
            pos,
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.pos {
            Some(pos) => write!(f, "{}: {}", pos, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ParseError {}

/// Fatal failures of the planning core.
///
/// Search timeout and exhaustion are *results*, not errors: they are reported
/// through [`crate::search::SearchResult`]. Likewise a failed validation is a
/// regular [`crate::validation::ValidationResult`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    /// A binding or task could not be grounded. Individual unbindable
    /// schema instantiations are dropped silently; this surfaces only for
    /// failures that invalidate the whole task.
    #[error("grounding error: {0}")]
    Grounding(String),
    #[error("internal error: {0}")]
    Internal(String),
}
