#![allow(dead_code)]

use loxwalk::interpreter::{run_with_output, RunOutcome};
use loxwalk::parse_and_run;

/// Run a program that is expected to succeed and return its printed output.
pub fn run_ok(source: &str) -> String {
    match parse_and_run(source) {
        Ok(output) => output,
        Err(diagnostics) => {
            let rendered: Vec<String> = diagnostics.iter().map(|d| d.to_string()).collect();
            panic!("program failed:\n{}\n--- source ---\n{}", rendered.join("\n"), source)
        }
    }
}

/// Printed lines of a program expected to succeed.
pub fn lines(source: &str) -> Vec<String> {
    run_ok(source).lines().map(str::to_string).collect()
}

/// The single runtime error a program stops with.
pub fn runtime_error(source: &str) -> String {
    match run_with_output(source).1 {
        RunOutcome::RuntimeError(diagnostic) => diagnostic.to_string(),
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

/// Every syntax error reported for a program.
pub fn syntax_errors(source: &str) -> Vec<String> {
    match run_with_output(source).1 {
        RunOutcome::SyntaxErrors(diagnostics) => diagnostics.iter().map(|d| d.to_string()).collect(),
        other => panic!("expected syntax errors, got {:?}", other),
    }
}
