use crate::ir::FragmentKind;
use thiserror::Error;

/// Structural errors raised while parsing a sequence diagram.
///
/// Line numbers are 1-based and refer to the raw input, blank lines included.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("diagram must start with \"sequence:\"")]
    MissingHeader,

    #[error("line {line}: 'else' is only valid inside an 'alt' fragment")]
    MisplacedElse { line: usize },

    #[error("line {line}: 'end' without an open fragment")]
    UnmatchedEnd { line: usize },

    #[error("'{kind}' fragment opened on line {line} is never closed")]
    UnclosedFragment { kind: FragmentKind, line: usize },
}

impl ParseError {
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::MissingHeader => None,
            Self::MisplacedElse { line }
            | Self::UnmatchedEnd { line }
            | Self::UnclosedFragment { line, .. } => Some(*line),
        }
    }
}
