use crate::value::{NativeFunction, Value};
use super::environment::Environment;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

const NATIVES: &[NativeFunction] = &[NativeFunction {
    name: "clock",
    arity: 0,
    function: builtin_clock,
}];

/// Seconds since the Unix epoch, with sub-second precision.
pub fn builtin_clock(_args: &[Value]) -> Value {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |elapsed| elapsed.as_secs_f64());
    Value::Number(seconds)
}

pub fn define_globals(globals: &Environment) {
    for native in NATIVES {
        globals.define(native.name, Value::Callable(Rc::new(native.clone())));
    }
}
