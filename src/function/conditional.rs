use std::sync::Arc;

use crate::{
    error::{EvalError, EvalResult},
    function::registry::check_arity,
    node::{core::Executable, value::Value},
};

/// Picks the second or third argument depending on the first.
///
/// This is the eager form, used when every argument is already known.
///
/// # Example
/// ```
/// use formulon::{function::conditional::select, node::value::Value};
///
/// let args = [Value::Boolean(false), Value::Integer(1), Value::Integer(2)];
/// assert_eq!(select(&args).unwrap(), Value::Integer(2));
/// ```
pub fn select(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 3)?;

    if args[0].as_bool()? {
        Ok(args[1].clone())
    } else {
        Ok(args[2].clone())
    }
}

/// Compiles `if(condition, then, else)` so that only the selected branch runs.
pub(crate) fn compile(children: Vec<Executable>) -> Executable {
    let [condition, then_branch, else_branch] = match <[Executable; 3]>::try_from(children) {
        Ok(branches) => branches,
        Err(children) => {
            let found = children.len();
            return Arc::new(move |_| {
                Err(EvalError::invalid_argument(format!("if expects 3 arguments, found {found}")))
            });
        },
    };

    Arc::new(move |frame| {
        if condition(frame)?.as_bool()? {
            then_branch(frame)
        } else {
            else_branch(frame)
        }
    })
}
