use crate::{
    compiler::{parameters::ParameterRegistry, syntax::Expr},
    error::{CompileError, CompileResult},
    node::{kind::ValueKind, signature::Returns},
};

/// Collects parameter constraints until none of them changes any more.
///
/// A single walk is not enough: in `x + y > 0 && y == "a"` the kind of `y` is
/// only known after the walk has passed the string comparison, and `x` learns
/// its kind from `y` on the next walk.
///
/// # Errors
/// `TypeConflict` as soon as two usages contradict each other.
pub fn infer_parameters(tree: &Expr, parameters: &mut ParameterRegistry) -> CompileResult<()> {
    let mut passes = 0;
    loop {
        let before = parameters.revision();
        infer(tree, parameters)?;
        passes += 1;
        if parameters.revision() == before {
            break;
        }
    }
    log::debug!("parameter kinds settled after {passes} pass(es)");
    Ok(())
}

/// Returns the kind of `expr` as far as it is known, recording the demands
/// every operation places on its operands.
fn infer(expr: &Expr, parameters: &mut ParameterRegistry) -> CompileResult<Option<ValueKind>> {
    match expr {
        Expr::Constant(constant) => Ok(Some(constant.kind())),
        Expr::Parameter(name) => Ok(parameters.kind(name)),
        Expr::Operation { operation, arguments } => {
            let kinds = arguments.iter()
                                 .map(|argument| infer(argument, parameters))
                                 .collect::<CompileResult<Vec<_>>>()?;
            let resolution = operation.signature()
                                      .resolve(&kinds)
                                      .map_err(|details| {
                                          CompileError::type_conflict(format!("'{operation}': {details}"))
                                      })?;
            for (argument, demand) in arguments.iter().zip(resolution.demands) {
                if let Some(kind) = demand {
                    require(argument, kind, parameters)?;
                }
            }
            Ok(resolution.returns)
        },
    }
}

/// Pushes a requirement on the value of `expr` down to the parameters that
/// decide it.
fn require(expr: &Expr, kind: ValueKind, parameters: &mut ParameterRegistry) -> CompileResult<()> {
    match expr {
        Expr::Constant(constant) if constant.kind().satisfies(kind) => Ok(()),
        Expr::Constant(constant) => Err(CompileError::type_conflict(format!("{} constant {} where {kind} is required",
                                                                            constant.kind(),
                                                                            constant.value()))),
        Expr::Parameter(name) => parameters.determine(name, kind).map(|_| ()),
        Expr::Operation { operation, arguments } => {
            let signature = operation.signature();
            let demand = match (signature.returns, kind) {
                (Returns::Widened, ValueKind::Numeric(_)) => ValueKind::NUMBER,
                (Returns::Group, ValueKind::FLOAT) => ValueKind::NUMBER,
                (_, kind) => kind,
            };
            for (index, argument) in arguments.iter().enumerate() {
                if signature.passes_through(index) {
                    require(argument, demand, parameters)?;
                }
            }
            Ok(())
        },
    }
}
