use crate::value::Value;

/// How a statement finished. Anything other than `Normal` unwinds outward
/// until a loop (`Break`, `Continue`) or a function call (`Return`) absorbs it.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

impl ControlFlow {
    pub fn is_normal(&self) -> bool {
        matches!(self, ControlFlow::Normal)
    }
}
