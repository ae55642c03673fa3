use crate::ast::{Expr, Stmt};
use crate::token::{Token, TokenKind};
use crate::value::{LoxFunction, Value};
use super::builtins;
use super::control_flow::ControlFlow;
use super::environment::Environment;
use super::error::RuntimeError;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use tracing::trace;

/// Sum of UTF-16 code units; strings are ordered by this, not lexically.
pub fn char_code_sum(s: &str) -> u64 {
    s.encode_utf16().map(u64::from).sum()
}

/// In-memory print sink. Clones share one buffer, so a test can hand one
/// handle to the interpreter and read the output back through another.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput(Rc<RefCell<Vec<u8>>>);

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct Interpreter {
    globals: Environment,
    environment: Environment,
    output: Box<dyn Write>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }

    pub fn with_output(output: impl Write + 'static) -> Self {
        let globals = Environment::new();
        builtins::define_globals(&globals);
        Self {
            environment: globals.clone(),
            globals,
            output: Box::new(output),
        }
    }

    /// Run a program. Stops at the first runtime error; bindings made before
    /// it stay in place.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        self.run_top_level(statements, false)
    }

    /// Like [`interpret`](Self::interpret), but also writes the value of
    /// every top-level expression statement to the output.
    pub fn interpret_echo(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        self.run_top_level(statements, true)
    }

    fn run_top_level(&mut self, statements: &[Stmt], echo: bool) -> Result<(), RuntimeError> {
        // A previous run may have stopped inside a block.
        self.environment = self.globals.clone();

        for statement in statements {
            match statement {
                Stmt::Expression(expr) if echo => {
                    let value = self.evaluate(expr)?;
                    writeln!(self.output, "{}", value)?;
                }
                _ => {
                    self.execute(statement)?;
                }
            }
        }
        self.output.flush()?;
        Ok(())
    }

    fn execute(&mut self, statement: &Stmt) -> Result<ControlFlow, RuntimeError> {
        match statement {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(ControlFlow::Normal)
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
                Ok(ControlFlow::Normal)
            }
            Stmt::Let { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.define(name.lexeme.as_ref(), value);
                Ok(ControlFlow::Normal)
            }
            Stmt::Block(statements) => {
                let scope = Environment::with_parent(&self.environment);
                self.execute_block(statements, scope)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(ControlFlow::Normal)
                }
            }
            Stmt::While {
                condition,
                body,
                increment,
            } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        ControlFlow::Break => break,
                        ControlFlow::Return(value) => return Ok(ControlFlow::Return(value)),
                        ControlFlow::Normal | ControlFlow::Continue => {}
                    }
                    if let Some(increment) = increment {
                        self.evaluate(increment)?;
                    }
                }
                Ok(ControlFlow::Normal)
            }
            Stmt::Break { .. } => Ok(ControlFlow::Break),
            Stmt::Continue { .. } => Ok(ControlFlow::Continue),
            Stmt::Function(declaration) => {
                let function = LoxFunction::new(Rc::clone(declaration), self.environment.clone());
                if let Some(name) = &declaration.name {
                    self.environment.define(name.lexeme.as_ref(), Value::Callable(Rc::new(function)));
                }
                Ok(ControlFlow::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Ok(ControlFlow::Return(value))
            }
            Stmt::Class { name, .. } => Err(RuntimeError::not_implemented(name, "Classes")),
        }
    }

    /// Run `statements` with `environment` as the current scope, then put the
    /// previous scope back however the block finished.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: Environment) -> Result<ControlFlow, RuntimeError> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = self.execute_all(statements);
        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<ControlFlow, RuntimeError> {
        for statement in statements {
            let flow = self.execute(statement)?;
            if !flow.is_normal() {
                return Ok(flow);
            }
        }
        Ok(ControlFlow::Normal)
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(literal) => Ok(Value::from(literal)),
            Expr::Variable { name } => self.environment.get(name),
            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.environment.assign(name, value.clone())?;
                Ok(value)
            }
            Expr::Binary { left, operator, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(operator, left, right)
            }
            Expr::Logical { left, operator, right } => {
                let left = self.evaluate(left)?;
                let decided = match operator.kind {
                    TokenKind::Or => left.is_truthy(),
                    _ => !left.is_truthy(),
                };
                if decided {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }
            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                match operator.kind {
                    TokenKind::Minus => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::type_error(operator, "Operand must be a number.")),
                    },
                    _ => Ok(Value::Bool(!right.is_truthy())),
                }
            }
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }
            Expr::Comma { left, right, .. } => {
                self.evaluate(left)?;
                self.evaluate(right)
            }
            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;
                let arguments = arguments
                    .iter()
                    .map(|argument| self.evaluate(argument))
                    .collect::<Result<Vec<_>, _>>()?;

                let Value::Callable(function) = callee else {
                    return Err(RuntimeError::NotCallable { token: paren.clone() });
                };
                if arguments.len() != function.arity() {
                    return Err(RuntimeError::ArityMismatch {
                        expected: function.arity(),
                        actual: arguments.len(),
                        token: paren.clone(),
                    });
                }

                trace!(callee = %function, line = paren.line, "call");
                function.call(self, arguments)
            }
            Expr::AnonymousFunction(declaration) => {
                let function = LoxFunction::new(Rc::clone(declaration), self.environment.clone());
                Ok(Value::Callable(Rc::new(function)))
            }
            Expr::Get { name, .. } => Err(RuntimeError::not_implemented(name, "Property access")),
            Expr::Set { name, .. } => Err(RuntimeError::not_implemented(name, "Property assignment")),
            Expr::This { keyword } => Err(RuntimeError::not_implemented(keyword, "This")),
            Expr::Super { keyword, .. } => Err(RuntimeError::not_implemented(keyword, "Super")),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64), RuntimeError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(RuntimeError::type_error(operator, "Operands must be numbers.")),
    }
}

fn binary(operator: &Token, left: Value, right: Value) -> Result<Value, RuntimeError> {
    match operator.kind {
        TokenKind::Plus => match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(_), _) | (_, Value::String(_)) => {
                Ok(Value::String(Rc::from(format!("{}{}", left, right))))
            }
            _ => Err(RuntimeError::type_error(
                operator,
                "Operands must be two numbers or two strings.",
            )),
        },
        TokenKind::Minus => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Number(a - b))
        }
        TokenKind::Star => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Number(a * b))
        }
        TokenKind::Slash => {
            let (a, b) = number_operands(operator, &left, &right)?;
            if b == 0.0 {
                return Err(RuntimeError::DivisionByZero {
                    token: operator.clone(),
                });
            }
            Ok(Value::Number(a / b))
        }
        TokenKind::EqualEqual => Ok(Value::Bool(left == right)),
        TokenKind::BangEqual => Ok(Value::Bool(left != right)),
        _ => compare(operator, &left, &right).map(Value::Bool),
    }
}

fn compare(operator: &Token, left: &Value, right: &Value) -> Result<bool, RuntimeError> {
    let (a, b) = match (left, right) {
        (Value::Number(a), Value::Number(b)) => (*a, *b),
        (Value::String(a), Value::String(b)) => (char_code_sum(a) as f64, char_code_sum(b) as f64),
        _ if left.type_name() != right.type_name() => {
            return Err(RuntimeError::type_error(
                operator,
                "Operands must be of the same type for comparison.",
            ))
        }
        _ => {
            return Err(RuntimeError::type_error(
                operator,
                "Comparison operators are only supported for numbers and strings.",
            ))
        }
    };

    Ok(match operator.kind {
        TokenKind::Greater => a > b,
        TokenKind::GreaterEqual => a >= b,
        TokenKind::Less => a < b,
        _ => a <= b,
    })
}
