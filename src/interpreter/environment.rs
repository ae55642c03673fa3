use crate::token::Token;
use crate::value::Value;
use super::error::RuntimeError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

type Scope = HashMap<String, Value>;

/// One lexical scope plus a link to the scope that encloses it.
///
/// Cloning an `Environment` yields another handle to the same bindings, so a
/// closure that captures a scope sees later assignments made through it.
#[derive(Clone)]
pub struct Environment {
    values: Rc<RefCell<Scope>>,
    enclosing: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            values: Rc::new(RefCell::new(HashMap::new())),
            enclosing: None,
        }
    }

    pub fn with_parent(parent: &Environment) -> Self {
        Self {
            values: Rc::new(RefCell::new(HashMap::new())),
            enclosing: Some(Rc::new(parent.clone())),
        }
    }

    /// Create or overwrite a binding in this scope only.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.values.borrow_mut().insert(name.into(), value);
    }

    /// Look `name` up from this scope outward.
    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(value) = env.values.borrow().get(name.lexeme.as_ref()) {
                return Ok(value.clone());
            }
            scope = env.enclosing.as_deref();
        }
        Err(RuntimeError::UndefinedVariable { name: name.clone() })
    }

    /// Overwrite the nearest existing binding of `name`. Never creates one.
    pub fn assign(&self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            let mut values = env.values.borrow_mut();
            if let Some(slot) = values.get_mut(name.lexeme.as_ref()) {
                *slot = value;
                return Ok(());
            }
            drop(values);
            scope = env.enclosing.as_deref();
        }
        Err(RuntimeError::UndefinedVariable { name: name.clone() })
    }

    /// Number of scopes from this one out to the outermost.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut scope = self.enclosing.as_deref();
        while let Some(env) = scope {
            depth += 1;
            scope = env.enclosing.as_deref();
        }
        depth
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

// Closures stored in a scope hold that scope again; printing bindings
// would recurse forever.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.values.borrow().keys().cloned().collect();
        names.sort();
        f.debug_struct("Environment")
            .field("names", &names)
            .field("depth", &self.depth())
            .finish()
    }
}
