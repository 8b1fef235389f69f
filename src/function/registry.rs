use std::{
    collections::HashMap,
    sync::{Arc, LazyLock},
};

use crate::{
    error::{CompileError, CompileResult, EvalError, EvalResult},
    function::{builtin, bytes, clamp, conditional, log, min_max, random, text},
    node::{
        core::{Executable, Operation},
        kind::{KindClass, ValueKind},
        signature::{Requirement, Returns, Signature},
        value::Value,
    },
};

/// Type alias for builtin function handlers.
///
/// A builtin receives a slice of evaluated argument values whose kinds already
/// passed the descriptor's signature.
pub type BuiltinFn = fn(&[Value]) -> EvalResult<Value>;

/// How a function computes its result.
#[derive(Clone, Copy)]
pub enum FunctionBody {
    /// A deterministic function of its arguments. Calls with constant
    /// arguments are folded at compile time.
    Pure(BuiltinFn),
    /// A function whose result may change between calls, such as `random`.
    /// Never folded.
    Volatile(BuiltinFn),
    /// `if(condition, then, else)`: only the selected branch is evaluated.
    Conditional,
}

impl std::fmt::Debug for FunctionBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pure(_) => write!(f, "Pure"),
            Self::Volatile(_) => write!(f, "Volatile"),
            Self::Conditional => write!(f, "Conditional"),
        }
    }
}

/// Static metadata of a function: its names, typing contract and
/// implementation.
///
/// Descriptors are `'static` so that function nodes can refer to them without
/// reference counting. Custom functions are declared as `static` items and
/// passed to [`FunctionRegistry::register`].
///
/// # Example
/// ```
/// use formulon::{
///     function::registry::{FunctionBody, FunctionDescriptor, FunctionRegistry},
///     grammar::GrammarConfig,
///     compiler::core::ExpressionCompiler,
///     node::{kind::ValueKind, signature::{Requirement, Signature}, value::Value},
/// };
///
/// static DOUBLE: FunctionDescriptor =
///     FunctionDescriptor { names:     &["double"],
///                          signature: Signature::fixed(&[Requirement::Kind(ValueKind::INTEGER)],
///                                                      ValueKind::INTEGER),
///                          body:      FunctionBody::Pure(|args| Ok(Value::Integer(args[0].as_integer()? * 2))),
///                          variadic:  false, };
///
/// let mut functions = FunctionRegistry::with_builtins();
/// functions.register(&DOUBLE);
///
/// let compiler = ExpressionCompiler::with_functions(GrammarConfig::default(), functions).unwrap();
/// let expression = compiler.compile("double(n) + 1").unwrap();
/// let result = expression.invoke(&[("n", Value::Integer(20))].into_iter().collect()).unwrap();
/// assert_eq!(result, Value::Integer(41));
/// ```
#[derive(Debug)]
pub struct FunctionDescriptor {
    /// The name and its aliases. The first entry is the canonical name.
    pub names:     &'static [&'static str],
    /// The typing contract, which also fixes the arity.
    pub signature: Signature,
    /// The implementation.
    pub body:      FunctionBody,
    /// Whether calls with more arguments than the arity fold pairwise from the
    /// left, as in `max(a, b, c)` = `max(max(a, b), c)`.
    pub variadic:  bool,
}

impl FunctionDescriptor {
    /// The canonical name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.names.first().copied().unwrap_or_default()
    }

    /// Number of arguments.
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.signature.arity()
    }

    /// Returns `false` for volatile functions.
    #[must_use]
    pub const fn is_foldable(&self) -> bool {
        !matches!(self.body, FunctionBody::Volatile(_))
    }

    /// Calls the function on evaluated arguments.
    pub fn evaluate(&self, args: &[Value]) -> EvalResult<Value> {
        check_arity(args, self.arity())?;
        match self.body {
            FunctionBody::Pure(func) | FunctionBody::Volatile(func) => func(args),
            FunctionBody::Conditional => conditional::select(args),
        }
    }

    /// Compiles a call over compiled arguments.
    pub(crate) fn compile(&'static self, children: Vec<Executable>) -> Executable {
        match self.body {
            FunctionBody::Conditional => conditional::compile(children),
            FunctionBody::Pure(func) | FunctionBody::Volatile(func) => Arc::new(move |frame| {
                let args = children.iter()
                                   .map(|child| child(frame))
                                   .collect::<EvalResult<Vec<_>>>()?;
                func(&args)
            }),
        }
    }
}

/// Checks the number of arguments handed to a builtin.
///
/// # Errors
/// `InvalidArgument` when the count differs from `expected`.
pub fn check_arity(args: &[Value], expected: usize) -> EvalResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::invalid_argument(format!("expected {expected} argument(s), found {}",
                                                args.len())))
    }
}

const NUMBER: Requirement = Requirement::Kind(ValueKind::NUMBER);
const INTEGER: Requirement = Requirement::Kind(ValueKind::INTEGER);
const FLOAT: Requirement = Requirement::Kind(ValueKind::FLOAT);
const BOOLEAN: Requirement = Requirement::Kind(ValueKind::Boolean);
const STRING: Requirement = Requirement::Kind(ValueKind::String);
const BYTES: Requirement = Requirement::Kind(ValueKind::ByteArray);
const GROUP: Requirement = Requirement::Group;

const NULLARY_FLOAT: Signature = Signature::fixed(&[], ValueKind::FLOAT);
const FLOAT_1: Signature = Signature::fixed(&[FLOAT], ValueKind::FLOAT);
const FLOAT_2: Signature = Signature::fixed(&[FLOAT, FLOAT], ValueKind::FLOAT);
const NUMERIC_SAME: Signature = Signature::grouped(&[GROUP], &[KindClass::Numeric], Returns::Group);
const NUMERIC_PAIR: Signature = Signature::grouped(&[GROUP, GROUP], &[KindClass::Numeric], Returns::Group);
const NUMERIC_TRIPLE: Signature =
    Signature::grouped(&[GROUP, GROUP, GROUP], &[KindClass::Numeric], Returns::Group);
const TO_INTEGER: Signature = Signature::fixed(&[NUMBER], ValueKind::INTEGER);
const TO_FLOAT: Signature = Signature::fixed(&[NUMBER], ValueKind::FLOAT);
const ROUND_DIGITS: Signature = Signature::fixed(&[NUMBER, INTEGER], ValueKind::FLOAT);
const CONDITIONAL: Signature = Signature::grouped(&[BOOLEAN, GROUP, GROUP], &[], Returns::Group);
const RANDOM_BELOW: Signature = Signature::fixed(&[INTEGER], ValueKind::INTEGER);
const RANDOM_BETWEEN: Signature = Signature::fixed(&[INTEGER, INTEGER], ValueKind::INTEGER);
const LENGTH: Signature = Signature::grouped(&[GROUP],
                                             &[KindClass::String, KindClass::ByteArray],
                                             Returns::Kind(ValueKind::INTEGER));
const CONCAT: Signature =
    Signature::grouped(&[GROUP, GROUP], &[KindClass::String, KindClass::ByteArray], Returns::Group);
const TEXT_MAP: Signature = Signature::fixed(&[STRING], ValueKind::String);
const TEXT_TEST: Signature = Signature::fixed(&[STRING, STRING], ValueKind::Boolean);
const SUBSTRING: Signature = Signature::fixed(&[STRING, INTEGER, INTEGER], ValueKind::String);
const REPLACE: Signature = Signature::fixed(&[STRING, STRING, STRING], ValueKind::String);
const REPEAT: Signature = Signature::fixed(&[STRING, INTEGER], ValueKind::String);
const TO_STRING: Signature = Signature::grouped(&[GROUP], &[], Returns::Kind(ValueKind::String));
const PARSE_NUMBER: Signature = Signature::fixed(&[STRING], ValueKind::NUMBER);
const HEX: Signature = Signature::fixed(&[BYTES], ValueKind::String);
const TO_BYTES: Signature = Signature::fixed(&[STRING], ValueKind::ByteArray);
const BYTE_AT: Signature = Signature::fixed(&[BYTES, INTEGER], ValueKind::INTEGER);

/// Defines builtin function descriptors and the table that registers them.
///
/// Each entry provides:
/// - the identifier of the generated `static` descriptor,
/// - the canonical name followed by its aliases,
/// - the signature and body,
/// - optionally, whether the function is variadic.
///
/// The macro produces one `static FunctionDescriptor` per entry and
/// `BUILTIN_TABLE`, which lists every descriptor.
macro_rules! builtin_functions {
    (
        $(
            $ident:ident : [$($name:literal),+] => {
                signature: $signature:expr,
                body: $body:expr
                $(, variadic: $variadic:expr)? $(,)?
            }
        ),* $(,)?
    ) => {
        $(
            static $ident: FunctionDescriptor = FunctionDescriptor {
                names:     &[$($name),+],
                signature: $signature,
                body:      $body,
                variadic:  false $(|| $variadic)?,
            };
        )*
        static BUILTIN_TABLE: &[&FunctionDescriptor] = &[
            $(&$ident,)*
        ];
    };
}

builtin_functions! {
    PI:           ["pi"]                  => { signature: NULLARY_FLOAT, body: FunctionBody::Pure(builtin::pi) },
    EULER:        ["e"]                   => { signature: NULLARY_FLOAT, body: FunctionBody::Pure(builtin::e) },
    TAU:          ["tau"]                 => { signature: NULLARY_FLOAT, body: FunctionBody::Pure(builtin::tau) },
    RANDOM:       ["random", "rand"]      => { signature: NULLARY_FLOAT, body: FunctionBody::Volatile(random::unit) },
    RANDOM_1:     ["random", "rand"]      => { signature: RANDOM_BELOW, body: FunctionBody::Volatile(random::below) },
    RANDOM_2:     ["random", "rand"]      => { signature: RANDOM_BETWEEN, body: FunctionBody::Volatile(random::between) },
    SIN:          ["sin"]                 => { signature: FLOAT_1, body: FunctionBody::Pure(builtin::sin) },
    COS:          ["cos"]                 => { signature: FLOAT_1, body: FunctionBody::Pure(builtin::cos) },
    TAN:          ["tan"]                 => { signature: FLOAT_1, body: FunctionBody::Pure(builtin::tan) },
    ASIN:         ["asin"]                => { signature: FLOAT_1, body: FunctionBody::Pure(builtin::asin) },
    ACOS:         ["acos"]                => { signature: FLOAT_1, body: FunctionBody::Pure(builtin::acos) },
    ATAN:         ["atan"]                => { signature: FLOAT_1, body: FunctionBody::Pure(builtin::atan) },
    SINH:         ["sinh"]                => { signature: FLOAT_1, body: FunctionBody::Pure(builtin::sinh) },
    COSH:         ["cosh"]                => { signature: FLOAT_1, body: FunctionBody::Pure(builtin::cosh) },
    TANH:         ["tanh"]                => { signature: FLOAT_1, body: FunctionBody::Pure(builtin::tanh) },
    EXP:          ["exp"]                 => { signature: FLOAT_1, body: FunctionBody::Pure(builtin::exp) },
    SQRT:         ["sqrt"]                => { signature: FLOAT_1, body: FunctionBody::Pure(builtin::sqrt) },
    LN:           ["ln", "loge"]          => { signature: FLOAT_1, body: FunctionBody::Pure(builtin::ln) },
    LOG10:        ["log10"]               => { signature: FLOAT_1, body: FunctionBody::Pure(builtin::log10) },
    LOG2:         ["log2"]                => { signature: FLOAT_1, body: FunctionBody::Pure(builtin::log2) },
    LOG:          ["log"]                 => { signature: FLOAT_2, body: FunctionBody::Pure(log::log) },
    POW:          ["pow", "power"]        => { signature: FLOAT_2, body: FunctionBody::Pure(builtin::pow) },
    ATAN2:        ["atan2"]               => { signature: FLOAT_2, body: FunctionBody::Pure(builtin::atan2) },
    HYPOT:        ["hypot"]               => { signature: FLOAT_2, body: FunctionBody::Pure(builtin::hypot) },
    RADIANS:      ["radians"]             => { signature: FLOAT_1, body: FunctionBody::Pure(builtin::radians) },
    DEGREES:      ["degrees"]             => { signature: FLOAT_1, body: FunctionBody::Pure(builtin::degrees) },
    ABS:          ["abs"]                 => { signature: NUMERIC_SAME, body: FunctionBody::Pure(builtin::abs) },
    SIGN:         ["sign"]                => { signature: NUMERIC_SAME, body: FunctionBody::Pure(builtin::sign) },
    FLOOR:        ["floor"]               => { signature: TO_INTEGER, body: FunctionBody::Pure(|args| builtin::unary_round("floor", args)) },
    CEIL:         ["ceil", "ceiling"]     => { signature: TO_INTEGER, body: FunctionBody::Pure(|args| builtin::unary_round("ceil", args)) },
    ROUND:        ["round"]               => { signature: TO_INTEGER, body: FunctionBody::Pure(|args| builtin::unary_round("round", args)) },
    TRUNC:        ["trunc", "int"]        => { signature: TO_INTEGER, body: FunctionBody::Pure(|args| builtin::unary_round("trunc", args)) },
    ROUND_TO:     ["round"]               => { signature: ROUND_DIGITS, body: FunctionBody::Pure(builtin::round_digits) },
    TO_FLOAT_FN:  ["float"]               => { signature: TO_FLOAT, body: FunctionBody::Pure(builtin::float) },
    MIN:          ["min"]                 => { signature: NUMERIC_PAIR, body: FunctionBody::Pure(|args| min_max::min_max("min", args)), variadic: true },
    MAX:          ["max"]                 => { signature: NUMERIC_PAIR, body: FunctionBody::Pure(|args| min_max::min_max("max", args)), variadic: true },
    CLAMP:        ["clamp"]               => { signature: NUMERIC_TRIPLE, body: FunctionBody::Pure(clamp::clamp) },
    IF:           ["if", "iif"]           => { signature: CONDITIONAL, body: FunctionBody::Conditional },
    LEN:          ["len", "length"]       => { signature: LENGTH, body: FunctionBody::Pure(text::length) },
    UPPER:        ["upper", "toupper"]    => { signature: TEXT_MAP, body: FunctionBody::Pure(text::upper) },
    LOWER:        ["lower", "tolower"]    => { signature: TEXT_MAP, body: FunctionBody::Pure(text::lower) },
    TRIM:         ["trim"]                => { signature: TEXT_MAP, body: FunctionBody::Pure(text::trim) },
    CONCAT_FN:    ["concat"]              => { signature: CONCAT, body: FunctionBody::Pure(text::concat), variadic: true },
    CONTAINS:     ["contains"]            => { signature: TEXT_TEST, body: FunctionBody::Pure(text::contains) },
    STARTS_WITH:  ["startswith"]          => { signature: TEXT_TEST, body: FunctionBody::Pure(text::starts_with) },
    ENDS_WITH:    ["endswith"]            => { signature: TEXT_TEST, body: FunctionBody::Pure(text::ends_with) },
    SUBSTRING_FN: ["substring", "substr"] => { signature: SUBSTRING, body: FunctionBody::Pure(text::substring) },
    REPLACE_FN:   ["replace"]             => { signature: REPLACE, body: FunctionBody::Pure(text::replace) },
    REPEAT_FN:    ["repeat"]              => { signature: REPEAT, body: FunctionBody::Pure(text::repeat) },
    STR:          ["str", "string"]       => { signature: TO_STRING, body: FunctionBody::Pure(text::to_string) },
    NUMBER_FN:    ["number"]              => { signature: PARSE_NUMBER, body: FunctionBody::Pure(text::parse_number) },
    HEX_FN:       ["hex"]                 => { signature: HEX, body: FunctionBody::Pure(bytes::hex) },
    BYTES_FN:     ["bytes"]               => { signature: TO_BYTES, body: FunctionBody::Pure(bytes::bytes) },
    UTF8:         ["utf8"]                => { signature: HEX, body: FunctionBody::Pure(bytes::utf8) },
    BYTE_AT_FN:   ["byteat"]              => { signature: BYTE_AT, body: FunctionBody::Pure(bytes::byte_at) },
}

static BUILTIN_REGISTRY: LazyLock<Arc<FunctionRegistry>> =
    LazyLock::new(|| Arc::new(FunctionRegistry::with_builtins()));

/// Maps `(arity, name)` to function descriptors.
///
/// The same name may be registered once per arity, as with `random()`,
/// `random(n)` and `random(lo, hi)`. Names are case sensitive.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    by_arity: HashMap<usize, HashMap<&'static str, &'static FunctionDescriptor>>,
}

impl FunctionRegistry {
    /// Creates a registry with no functions.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry holding every builtin function.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for descriptor in BUILTIN_TABLE {
            registry.register(descriptor);
        }
        registry
    }

    /// The shared builtin registry.
    #[must_use]
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN_REGISTRY)
    }

    /// Registers a descriptor under each of its names, replacing any function
    /// with the same name and arity.
    pub fn register(&mut self, descriptor: &'static FunctionDescriptor) {
        let functions = self.by_arity.entry(descriptor.arity()).or_default();
        for name in descriptor.names {
            functions.insert(*name, descriptor);
        }
    }

    /// Looks up a function by name and arity.
    #[must_use]
    pub fn get(&self, name: &str, arity: usize) -> Option<&'static FunctionDescriptor> {
        self.by_arity.get(&arity)?.get(name).copied()
    }

    /// The arities `name` is registered with, in ascending order.
    #[must_use]
    pub fn arities(&self, name: &str) -> Vec<usize> {
        let mut arities = self.by_arity
                              .iter()
                              .filter(|(_, functions)| functions.contains_key(name))
                              .map(|(arity, _)| *arity)
                              .collect::<Vec<_>>();
        arities.sort_unstable();
        arities
    }

    /// Returns `true` if some function is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_arity.values().any(|functions| functions.contains_key(name))
    }

    /// Resolves a call of `name` with `arity` arguments.
    ///
    /// Calls of a variadic function with more arguments than its arity resolve
    /// to a factory that chains the function pairwise.
    ///
    /// # Errors
    /// `Arity` when the name exists with other arities, `UnknownSymbol` when
    /// it does not exist at all.
    ///
    /// # Example
    /// ```
    /// use formulon::{error::CompileError, function::registry::FunctionRegistry};
    ///
    /// let functions = FunctionRegistry::builtin();
    /// assert!(functions.resolve("max", 4).is_ok());
    /// assert!(matches!(functions.resolve("sqrt", 2), Err(CompileError::Arity { .. })));
    /// assert!(matches!(functions.resolve("nope", 1), Err(CompileError::UnknownSymbol { .. })));
    /// ```
    pub fn resolve(&self, name: &str, arity: usize) -> CompileResult<FunctionFactory> {
        if let Some(descriptor) = self.get(name, arity) {
            return Ok(FunctionFactory { descriptor,
                                        arity });
        }

        let variadic = self.by_arity
                           .iter()
                           .filter(|(fixed, _)| **fixed >= 2 && **fixed < arity)
                           .find_map(|(_, functions)| functions.get(name).copied().filter(|d| d.variadic));
        if let Some(descriptor) = variadic {
            return Ok(FunctionFactory { descriptor,
                                        arity });
        }

        let expected = self.arities(name);
        if expected.is_empty() {
            Err(CompileError::UnknownSymbol { name: name.to_string(),
                                              arity })
        } else {
            Err(CompileError::Arity { name: name.to_string(),
                                      expected,
                                      found: arity })
        }
    }

    /// Every registered name, sorted, aliases included.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = self.by_arity
                            .values()
                            .flat_map(|functions| functions.keys().copied())
                            .collect::<Vec<_>>();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Builds the nodes for one resolved call.
#[derive(Debug, Clone, Copy)]
pub struct FunctionFactory {
    descriptor: &'static FunctionDescriptor,
    arity:      usize,
}

impl FunctionFactory {
    /// Builds the call over `arguments` with `make`, which turns an operation
    /// and its children into a node.
    ///
    /// Variadic calls are chained from the left, so the result is
    /// `f(f(a, b), c)` for three arguments.
    ///
    /// # Errors
    /// Whatever `make` fails with, or `Arity` when the argument count does not
    /// match the resolved call.
    pub fn build<T, E>(&self,
                       arguments: Vec<T>,
                       mut make: impl FnMut(Operation, Vec<T>) -> Result<T, E>)
                       -> Result<T, E>
        where E: From<CompileError>
    {
        let operation = Operation::Function(self.descriptor);
        let fixed = self.descriptor.arity();
        if arguments.len() != self.arity || (self.arity != fixed && !self.descriptor.variadic) {
            return Err(CompileError::Arity { name:     self.descriptor.name().to_string(),
                                             expected: vec![fixed],
                                             found:    arguments.len(), }.into());
        }
        if self.arity == fixed {
            return make(operation, arguments);
        }

        let mut rest = arguments.into_iter();
        let head = rest.by_ref().take(fixed).collect();
        let mut node = make(operation, head)?;
        while rest.len() > 0 {
            let mut chunk = vec![node];
            chunk.extend(rest.by_ref().take(fixed - 1));
            node = make(operation, chunk)?;
        }
        Ok(node)
    }
}
