use std::io;

use thiserror::Error;

use crate::diagnostic::{Diagnostic, Span};
use crate::token::{Token, TokenKind};

/// A grammar violation found while parsing. The parser records it and keeps
/// going; it never aborts the whole parse.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    /// `at end` or `at '<lexeme>'`
    pub location: String,
    pub span: Span,
}

impl SyntaxError {
    pub fn at(token: &Token, message: impl Into<String>) -> Self {
        let location = if token.kind == TokenKind::Eof {
            "at end".to_string()
        } else {
            format!("at '{}'", token.lexeme)
        };
        Self {
            message: message.into(),
            line: token.line,
            location,
            span: token.span,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::syntax(self.message.clone(), self.line)
            .with_location(self.location.clone())
            .with_span(self.span)
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Undefined variable '{}'.", .name.lexeme)]
    UndefinedVariable { name: Token },

    #[error("{message}")]
    TypeError { message: &'static str, token: Token },

    #[error("Division by zero is not allowed.")]
    DivisionByZero { token: Token },

    #[error("Expected {expected} arguments but got {actual}.")]
    ArityMismatch { expected: usize, actual: usize, token: Token },

    #[error("Can only call functions and classes.")]
    NotCallable { token: Token },

    #[error("{feature} not implemented.")]
    NotImplemented { feature: &'static str, token: Token },

    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl RuntimeError {
    pub fn type_error(token: &Token, message: &'static str) -> Self {
        Self::TypeError {
            message,
            token: token.clone(),
        }
    }

    pub fn not_implemented(token: &Token, feature: &'static str) -> Self {
        Self::NotImplemented {
            feature,
            token: token.clone(),
        }
    }

    /// The token the error is reported against, if it came from source.
    pub fn token(&self) -> Option<&Token> {
        match self {
            Self::UndefinedVariable { name } => Some(name),
            Self::TypeError { token, .. }
            | Self::DivisionByZero { token }
            | Self::ArityMismatch { token, .. }
            | Self::NotCallable { token }
            | Self::NotImplemented { token, .. } => Some(token),
            Self::Output(_) => None,
        }
    }

    pub fn line(&self) -> usize {
        self.token().map_or(0, |token| token.line)
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::runtime(self.to_string(), self.line());
        match self.token() {
            Some(token) => diagnostic.with_span(token.span),
            None => diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TokenKind, lexeme: &str, line: usize) -> Token {
        Token::new(kind, lexeme, None, line, Span::new(4, 4 + lexeme.len()))
    }

    #[test]
    fn test_syntax_error_location() {
        let semicolon = token(TokenKind::Semicolon, ";", 2);
        let error = SyntaxError::at(&semicolon, "Expect expression.");
        assert_eq!(
            error.to_diagnostic().to_string(),
            "[line: 2 Error at ';': Expect expression.]"
        );

        let eof = Token::eof(5, 40);
        let error = SyntaxError::at(&eof, "Expect ';' after value.");
        assert_eq!(
            error.to_diagnostic().to_string(),
            "[line: 5 Error at end: Expect ';' after value.]"
        );
    }

    #[test]
    fn test_runtime_messages() {
        let name = token(TokenKind::Identifier, "missing", 3);
        let error = RuntimeError::UndefinedVariable { name };
        assert_eq!(error.to_string(), "Undefined variable 'missing'.");
        assert_eq!(error.to_diagnostic().to_string(), "Undefined variable 'missing'. [line:3]");

        let paren = token(TokenKind::RightParen, ")", 1);
        let error = RuntimeError::ArityMismatch {
            expected: 2,
            actual: 3,
            token: paren,
        };
        assert_eq!(error.to_string(), "Expected 2 arguments but got 3.");
    }

    #[test]
    fn test_not_implemented_names_feature() {
        let this = token(TokenKind::This, "this", 8);
        let error = RuntimeError::not_implemented(&this, "This");
        assert_eq!(error.to_diagnostic().to_string(), "This not implemented. [line:8]");
    }

    #[test]
    fn test_output_error_has_no_line() {
        let error = RuntimeError::from(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        assert_eq!(error.line(), 0);
        assert!(error.to_diagnostic().span.is_dummy());
    }
}
