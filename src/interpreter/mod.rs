pub mod parser;
pub mod environment;
pub mod error;
pub mod control_flow;
pub mod builtins;
pub mod evaluator;
pub mod session;

pub use error::{RuntimeError, SyntaxError};
pub use control_flow::ControlFlow;
pub use environment::Environment;
pub use parser::{parse, ParseResult, Parser};
pub use evaluator::{char_code_sum, CapturedOutput, Interpreter};
pub use session::{compile, parse_and_run, run_with_output, RunOutcome, Session};
