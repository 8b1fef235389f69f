use std::{fs, process::ExitCode};

use clap::{Parser, ValueEnum};
use formulon::{
    compiled::{Bindings, CompiledExpression},
    compile_with,
    function::registry::FunctionRegistry,
    grammar::{GrammarConfig, Precedence},
    node::value::Value,
};

/// formulon compiles a typed expression and evaluates it once with the given
/// parameter values.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Treat the expression argument as the path of a file holding the
    /// expression.
    #[arg(short, long)]
    file: bool,

    /// A parameter value as `NAME=VALUE`. May be repeated.
    #[arg(short, long = "param", value_name = "NAME=VALUE")]
    params: Vec<String>,

    /// Print the simplified tree, the result kind and the parameters instead
    /// of evaluating.
    #[arg(short, long)]
    describe: bool,

    /// Which end of the operator level table binds tighter.
    #[arg(long, value_enum, default_value_t = PrecedenceArg::Lower)]
    precedence: PrecedenceArg,

    /// List the builtin function names and exit.
    #[arg(long)]
    functions: bool,

    #[arg(required_unless_present = "functions")]
    expression: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PrecedenceArg {
    /// Level 0 binds tightest.
    Lower,
    /// The highest level binds tightest.
    Higher,
}

impl From<PrecedenceArg> for Precedence {
    fn from(arg: PrecedenceArg) -> Self {
        match arg {
            PrecedenceArg::Lower => Self::LowerBindsTighter,
            PrecedenceArg::Higher => Self::HigherBindsTighter,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        },
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    if args.functions {
        let functions = FunctionRegistry::builtin();
        for name in functions.names() {
            let arities = functions.arities(name)
                                   .iter()
                                   .map(ToString::to_string)
                                   .collect::<Vec<_>>();
            println!("{name} ({})", arities.join(", "));
        }
        return Ok(());
    }

    let expression = args.expression.ok_or("No expression given")?;
    let source = if args.file {
        fs::read_to_string(&expression).map_err(|e| format!("Failed to read the input file '{expression}': {e}"))?
    } else {
        expression
    };

    let grammar = GrammarConfig::default().with_precedence(args.precedence.into());
    let expression = compile_with(source.trim(), grammar)?;

    if args.describe {
        describe(&expression);
        return Ok(());
    }

    let bindings = parse_params(&expression, &args.params)?;
    println!("{}", expression.invoke(&bindings)?);
    Ok(())
}

fn describe(expression: &CompiledExpression) {
    println!("tree:    {expression}");
    println!("returns: {}", expression.return_kind());
    for parameter in expression.parameters() {
        println!("param:   {} : {}", parameter.name, parameter.kind);
    }
}

/// Parses `NAME=VALUE` pairs according to the kinds of the expression's
/// parameters.
fn parse_params(expression: &CompiledExpression, params: &[String]) -> Result<Bindings, String> {
    let mut bindings = Bindings::new();

    for param in params {
        let (name, text) = param.split_once('=')
                                .ok_or_else(|| format!("Parameter '{param}' is not of the form NAME=VALUE"))?;
        let name = name.trim();
        let kind = expression.parameters()
                             .iter()
                             .find(|p| p.name == name)
                             .map(|p| p.kind)
                             .ok_or_else(|| format!("The expression has no parameter '{name}'"))?;
        let value = Value::parse_as(kind, text).ok_or_else(|| format!("'{text}' is not a valid {kind} for '{name}'"))?;
        bindings.set(name, value);
    }

    Ok(bindings)
}
