use crate::ast::Stmt;
use crate::diagnostic::Diagnostic;
use crate::lexer::scan;
use super::evaluator::{CapturedOutput, Interpreter};
use super::parser::parse;
use std::io::Write;
use tracing::debug;

pub const EXIT_SYNTAX_ERROR: u8 = 65;
pub const EXIT_RUNTIME_ERROR: u8 = 70;

/// What happened to one batch of source.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed,
    /// Nothing was executed.
    SyntaxErrors(Vec<Diagnostic>),
    /// Execution stopped at this error; earlier effects stand.
    RuntimeError(Diagnostic),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Completed)
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Completed => 0,
            RunOutcome::SyntaxErrors(_) => EXIT_SYNTAX_ERROR,
            RunOutcome::RuntimeError(_) => EXIT_RUNTIME_ERROR,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            RunOutcome::Completed => &[],
            RunOutcome::SyntaxErrors(diagnostics) => diagnostics,
            RunOutcome::RuntimeError(diagnostic) => std::slice::from_ref(diagnostic),
        }
    }
}

/// Scan and parse `source`. Lexical and grammar errors are reported together,
/// in that order.
pub fn compile(source: &str) -> Result<Vec<Stmt>, Vec<Diagnostic>> {
    let scanned = scan(source);
    debug!(tokens = scanned.tokens.len(), errors = scanned.errors.len(), "scanned source");

    let parsed = parse(scanned.tokens);
    if scanned.errors.is_empty() && parsed.is_ok() {
        return Ok(parsed.statements);
    }

    let mut diagnostics = scanned.errors;
    diagnostics.extend(parsed.errors.iter().map(|error| error.to_diagnostic()));
    Err(diagnostics)
}

/// An interpreter whose global scope lives across runs, as a REPL needs.
pub struct Session {
    interpreter: Interpreter,
}

impl Session {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    pub fn with_output(output: impl Write + 'static) -> Self {
        Self {
            interpreter: Interpreter::with_output(output),
        }
    }

    /// Run a whole program.
    pub fn run(&mut self, source: &str) -> RunOutcome {
        self.execute(source, false)
    }

    /// Run one REPL line, echoing the value of each expression statement.
    pub fn run_line(&mut self, source: &str) -> RunOutcome {
        self.execute(source, true)
    }

    fn execute(&mut self, source: &str, echo: bool) -> RunOutcome {
        let statements = match compile(source) {
            Ok(statements) => statements,
            Err(diagnostics) => {
                debug!(count = diagnostics.len(), "syntax errors, skipping execution");
                return RunOutcome::SyntaxErrors(diagnostics);
            }
        };

        let result = if echo {
            self.interpreter.interpret_echo(&statements)
        } else {
            self.interpreter.interpret(&statements)
        };

        match result {
            Ok(()) => RunOutcome::Completed,
            Err(error) => {
                debug!(line = error.line(), "runtime error");
                RunOutcome::RuntimeError(error.to_diagnostic())
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `source` in a fresh session and return everything it printed.
pub fn parse_and_run(source: &str) -> Result<String, Vec<Diagnostic>> {
    let output = CapturedOutput::new();
    let mut session = Session::with_output(output.clone());
    match session.run(source) {
        RunOutcome::Completed => Ok(output.contents()),
        outcome => Err(outcome.diagnostics().to_vec()),
    }
}

/// Like [`parse_and_run`], but also returns what was printed before a
/// runtime error stopped the program.
pub fn run_with_output(source: &str) -> (String, RunOutcome) {
    let output = CapturedOutput::new();
    let mut session = Session::with_output(output.clone());
    let outcome = session.run(source);
    (output.contents(), outcome)
}
