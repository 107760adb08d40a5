//! Diagnostics produced by the compilation pipeline.
//!
//! Errors are plain accumulated values, never control flow: the lexer,
//! parser, and binder record them and keep scanning. Only the driver turns
//! a non-empty accumulation into a failed run.

use thiserror::Error;

use crate::ast::SourceLoc;

/// A single diagnostic, optionally anchored at a source location.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("{loc}: {message}")]
    At { loc: SourceLoc, message: String },
    #[error("{message}")]
    Bare { message: String },
}

impl CompileError {
    /// An error anchored at a source location.
    pub fn at(loc: SourceLoc, message: impl Into<String>) -> Self {
        CompileError::At {
            loc,
            message: message.into(),
        }
    }

    /// An error with no position, e.g. an unreadable input file.
    pub fn new(message: impl Into<String>) -> Self {
        CompileError::Bare {
            message: message.into(),
        }
    }

    pub fn loc(&self) -> Option<&SourceLoc> {
        match self {
            CompileError::At { loc, .. } => Some(loc),
            CompileError::Bare { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CompileError::At { message, .. } | CompileError::Bare { message } => message,
        }
    }
}

/// Orders diagnostics by (file, line, column), unlocated errors first.
/// The sort is stable, so diagnostics at the same position keep their
/// detection order.
pub fn sort_errors(errors: &mut [CompileError]) {
    errors.sort_by(|a, b| a.loc().cmp(&b.loc()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn located_error_displays_position_prefix() {
        let err = CompileError::at(SourceLoc::new("a.opt", 2, 5), "unexpected token");
        assert_eq!(err.to_string(), "a.opt:2:5: unexpected token");
    }

    #[test]
    fn bare_error_displays_message_only() {
        let err = CompileError::new("failed to read b.opt");
        assert_eq!(err.to_string(), "failed to read b.opt");
    }

    #[test]
    fn sort_orders_by_file_then_position_then_detection() {
        let mut errors = vec![
            CompileError::at(SourceLoc::new("b.opt", 1, 1), "third"),
            CompileError::at(SourceLoc::new("a.opt", 2, 9), "second"),
            CompileError::at(SourceLoc::new("a.opt", 2, 9), "also second"),
            CompileError::new("first"),
            CompileError::at(SourceLoc::new("a.opt", 1, 4), "early"),
        ];
        sort_errors(&mut errors);
        let messages: Vec<_> = errors.iter().map(|e| e.message()).collect();
        assert_eq!(
            messages,
            vec!["first", "early", "second", "also second", "third"]
        );
    }
}
