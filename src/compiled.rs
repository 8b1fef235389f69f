use std::{collections::HashMap, sync::Arc};

use crate::{
    compiler::parameters::ParameterInfo,
    error::{EvalError, EvalResult},
    node::{
        core::{BindingContext, Executable, Node, ParameterNode, ParameterState},
        kind::ValueKind,
        value::Value,
    },
};

/// Parameter values for one invocation, by name.
///
/// # Example
/// ```
/// use formulon::{compiled::Bindings, node::value::Value};
///
/// let bindings = Bindings::new().with("x", 2).with("name", "Ada");
/// assert_eq!(bindings.get("x"), Some(&Value::Integer(2)));
///
/// let same: Bindings = [("x", Value::Integer(2)), ("name", Value::from("Ada"))].into_iter().collect();
/// assert_eq!(bindings, same);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    values: HashMap<String, Value>,
}

impl Bindings {
    /// Creates empty bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binding and returns the bindings.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Adds or replaces a binding.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Returns the value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates the bindings in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for Bindings
    where K: Into<String>,
          V: Into<Value>
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { values: iter.into_iter()
                           .map(|(name, value)| (name.into(), value.into()))
                           .collect(), }
    }
}

impl From<HashMap<String, Value>> for Bindings {
    fn from(values: HashMap<String, Value>) -> Self {
        Self { values }
    }
}

/// The result of compiling an expression: the simplified tree, the parameters
/// it expects and a reusable evaluator.
///
/// A compiled expression is immutable and `Send + Sync`; it can be invoked
/// any number of times, concurrently, with different bindings. A failed
/// invocation leaves it usable.
#[derive(Clone)]
pub struct CompiledExpression {
    source:     String,
    root:       Node,
    parameters: Vec<ParameterInfo>,
    executable: Executable,
}

impl CompiledExpression {
    pub(crate) fn new(source: &str, root: Node, parameters: Vec<ParameterInfo>) -> Self {
        let executable = root.compile();
        Self { source: source.to_string(),
               root,
               parameters,
               executable }
    }

    /// The simplified expression tree.
    #[must_use]
    pub const fn root(&self) -> &Node {
        &self.root
    }

    /// The parameters in slot order, with the kind each must be bound to.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.parameters
    }

    /// The static kind of the result.
    #[must_use]
    pub fn return_kind(&self) -> ValueKind {
        self.root.return_kind()
    }

    /// The source text this expression was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluates the expression.
    ///
    /// Every parameter of the manifest must be bound to a value of its kind.
    /// Integers are accepted for float parameters and integral floats for
    /// integer parameters. Extra bindings are ignored.
    ///
    /// # Errors
    /// `MissingParameter` or `ParameterKind` for bad bindings, and any
    /// evaluation error of the expression itself.
    ///
    /// # Example
    /// ```
    /// use formulon::{compile, compiled::Bindings, error::EvalError, node::value::Value};
    ///
    /// let expression = compile("x / 2").unwrap();
    ///
    /// assert_eq!(expression.invoke(&Bindings::new().with("x", 6)).unwrap(), Value::Integer(3));
    /// assert_eq!(expression.invoke(&Bindings::new().with("x", 5)).unwrap(), Value::Float(2.5));
    /// assert!(matches!(expression.invoke(&Bindings::new()),
    ///                  Err(EvalError::MissingParameter { .. })));
    /// ```
    pub fn invoke(&self, bindings: &Bindings) -> EvalResult<Value> {
        let frame = self.parameters
                        .iter()
                        .map(|parameter| bound_value(parameter, bindings))
                        .collect::<EvalResult<Vec<_>>>()?;
        (self.executable)(&frame)
    }

    /// Returns a new expression in which the bound parameters are replaced by
    /// their values and the tree is simplified again.
    ///
    /// Parameters without a binding remain parameters of the result, in their
    /// original order.
    ///
    /// # Errors
    /// `ParameterKind` when a binding does not fit its parameter.
    ///
    /// # Example
    /// ```
    /// use formulon::{compile, compiled::Bindings, node::value::Value};
    ///
    /// let expression = compile("a * x + b").unwrap();
    /// let line = expression.specialize(&Bindings::new().with("a", 2).with("b", 1)).unwrap();
    ///
    /// assert_eq!(line.parameters().len(), 1);
    /// assert_eq!(line.invoke(&Bindings::new().with("x", 10)).unwrap(), Value::Integer(21));
    /// ```
    pub fn specialize(&self, bindings: &Bindings) -> EvalResult<Self> {
        let mut context = BindingContext::new();
        let mut remaining = Vec::new();

        for parameter in &self.parameters {
            if bindings.get(&parameter.name).is_some() {
                context.bind(&parameter.name, bound_value(parameter, bindings)?);
            } else {
                let node = ParameterNode { name:  Arc::from(parameter.name.as_str()),
                                           state: ParameterState::from(parameter.kind),
                                           slot:  remaining.len(), };
                context.place(&node, node.slot);
                remaining.push(parameter.clone());
            }
        }

        let root = self.root.clone_with(&context).simplify();
        log::debug!("specialized '{}' to {root}", self.source);
        Ok(Self::new(&self.source, root, remaining))
    }
}

fn bound_value(parameter: &ParameterInfo, bindings: &Bindings) -> EvalResult<Value> {
    let value = bindings.get(&parameter.name)
                        .ok_or_else(|| EvalError::MissingParameter { name: parameter.name.clone() })?;
    value.clone()
         .conform(parameter.kind)
         .ok_or_else(|| EvalError::ParameterKind { name:     parameter.name.clone(),
                                                   expected: parameter.kind,
                                                   found:    value.kind(), })
}

impl std::fmt::Debug for CompiledExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledExpression")
         .field("source", &self.source)
         .field("root", &self.root)
         .field("parameters", &self.parameters)
         .finish_non_exhaustive()
    }
}

impl std::fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.root)
    }
}
