pub mod ast;
pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod interpreter;
pub mod lexer;
pub mod token;
pub mod value;

pub use ast::{Expr, FunctionDecl, Stmt};
pub use diagnostic::Diagnostic;
pub use interpreter::{parse_and_run, Interpreter, RunOutcome, Session};
pub use token::{Token, TokenKind};
pub use value::Value;
