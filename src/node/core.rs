use std::{collections::HashMap, sync::Arc};

use crate::{
    error::{CompileError, CompileResult, EvalError, EvalResult},
    function::registry::{FunctionBody, FunctionDescriptor},
    node::{
        kind::{NumericMode, ValueKind},
        operator::{BinaryOperator, UnaryOperator},
        signature::Signature,
        value::Value,
    },
};

/// A compiled node: a thread-safe closure evaluating the node against a frame
/// of parameter values indexed by slot.
pub type Executable = Arc<dyn Fn(&[Value]) -> EvalResult<Value> + Send + Sync>;

/// An immutable literal or folded value.
///
/// Literal constants are interned: every occurrence of the same literal text
/// in one expression shares a single `ConstantNode`.
#[derive(Debug, Clone)]
pub struct ConstantNode {
    value:   Value,
    literal: Option<Arc<str>>,
}

impl ConstantNode {
    /// Creates a constant parsed from literal source text.
    #[must_use]
    pub fn literal(value: Value, literal: &str) -> Self {
        Self { value,
               literal: Some(Arc::from(literal)) }
    }

    /// Creates a constant computed by folding or supplied by a binding.
    #[must_use]
    pub const fn computed(value: Value) -> Self {
        Self { value,
               literal: None }
    }

    /// The constant value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// The literal text this constant was interned from, if any.
    #[must_use]
    pub fn literal_text(&self) -> Option<&str> {
        self.literal.as_deref()
    }

    /// The kind of the constant.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        self.value.kind()
    }
}

/// Constants are equal when their values are; where they came from does not
/// matter.
impl PartialEq for ConstantNode {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// The progressively determined kind of a parameter.
///
/// States only ever move from `Undefined` to a concrete kind, and numeric
/// modes only ever narrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParameterState {
    /// No usage has constrained the parameter yet.
    #[default]
    Undefined,
    /// A number, possibly constrained to integers or floats.
    Numeric(NumericMode),
    /// A boolean.
    Boolean,
    /// Text.
    String,
    /// Raw bytes.
    ByteArray,
}

impl ParameterState {
    /// The kind this state stands for, or `None` while undefined.
    #[must_use]
    pub const fn kind(self) -> Option<ValueKind> {
        match self {
            Self::Undefined => None,
            Self::Numeric(mode) => Some(ValueKind::Numeric(mode)),
            Self::Boolean => Some(ValueKind::Boolean),
            Self::String => Some(ValueKind::String),
            Self::ByteArray => Some(ValueKind::ByteArray),
        }
    }
}

impl From<ValueKind> for ParameterState {
    fn from(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Numeric(mode) => Self::Numeric(mode),
            ValueKind::Boolean => Self::Boolean,
            ValueKind::String => Self::String,
            ValueKind::ByteArray => Self::ByteArray,
        }
    }
}

/// A named free variable, supplied at evaluation time.
///
/// One instance exists per name in an expression; every occurrence of the name
/// in the tree shares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterNode {
    /// The parameter name.
    pub name:  Arc<str>,
    /// The determined kind.
    pub state: ParameterState,
    /// Position of the parameter's value in an evaluation frame.
    pub slot:  usize,
}

impl ParameterNode {
    /// The parameter kind; undefined parameters count as unconstrained numbers.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.state.kind().unwrap_or_default()
    }
}

/// What an operation node computes.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// A prefix operator.
    Unary(UnaryOperator),
    /// A binary operator.
    Binary(BinaryOperator),
    /// A registered function.
    Function(&'static FunctionDescriptor),
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unary(a), Self::Unary(b)) => a == b,
            (Self::Binary(a), Self::Binary(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => {
                std::ptr::eq(*a, *b) || (a.name() == b.name() && a.arity() == b.arity())
            },
            _ => false,
        }
    }
}

impl Operation {
    /// The typing contract of the operation.
    #[must_use]
    pub const fn signature(&self) -> Signature {
        match self {
            Self::Unary(op) => op.signature(),
            Self::Binary(op) => op.signature(),
            Self::Function(descriptor) => descriptor.signature,
        }
    }

    /// Whether the operation may be replaced by its result when all operands
    /// are constant. Randomness is never folded.
    #[must_use]
    pub const fn is_foldable(&self) -> bool {
        match self {
            Self::Unary(_) | Self::Binary(_) => true,
            Self::Function(descriptor) => descriptor.is_foldable(),
        }
    }

    /// Evaluates the operation on already evaluated operands.
    pub fn evaluate(&self, operands: &[Value]) -> EvalResult<Value> {
        match (self, operands) {
            (Self::Unary(op), [operand]) => op.apply(operand),
            (Self::Binary(op), [left, right]) => op.apply(left, right),
            (Self::Function(descriptor), operands) => descriptor.evaluate(operands),
            (op, operands) => Err(EvalError::TypeMismatch { details: format!("'{op}' cannot take {} operand(s)",
                                                                             operands.len()), }),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unary(op) => write!(f, "{}", op.to_string().trim_end()),
            Self::Binary(op) => write!(f, "{op}"),
            Self::Function(descriptor) => write!(f, "{}", descriptor.name()),
        }
    }
}

/// An operator or function applied to child nodes.
///
/// The children are type checked against the operation's signature when the
/// node is built, so a completed node always has a known static kind.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationNode {
    operation: Operation,
    children:  Vec<Node>,
    kind:      ValueKind,
}

impl OperationNode {
    /// Builds and type checks an operation node.
    ///
    /// # Errors
    /// `Arity` when a function receives the wrong number of children,
    /// `TypeConflict` when a child's kind violates the signature.
    pub fn new(operation: Operation, children: Vec<Node>) -> CompileResult<Self> {
        let signature = operation.signature();
        if children.len() != signature.arity() {
            return Err(CompileError::Arity { name:     operation.to_string(),
                                             expected: vec![signature.arity()],
                                             found:    children.len(), });
        }
        let kinds = children.iter().map(Node::return_kind).collect::<Vec<_>>();
        let kind = signature.check(&kinds)
                            .map_err(|details| CompileError::type_conflict(format!("'{operation}': {details}")))?;
        Ok(Self { operation,
                  children,
                  kind })
    }

    /// The operation.
    #[must_use]
    pub const fn operation(&self) -> &Operation {
        &self.operation
    }

    /// The operands.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// The static result kind.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        self.kind
    }

    fn simplify(&self) -> Node {
        let children = self.children.iter().map(Node::simplify).collect::<Vec<_>>();

        if let Some(shortcut) = self.shortcut(&children) {
            return shortcut;
        }

        if self.operation.is_foldable()
           && let Some(values) = children.iter().map(Node::as_constant).collect::<Option<Vec<_>>>()
           && let Ok(value) = self.operation.evaluate(&values)
           && let Some(value) = value.conform(self.kind)
        {
            return Node::Constant(Arc::new(ConstantNode::computed(value)));
        }

        Node::Operation(Arc::new(Self { operation: self.operation,
                                        children,
                                        kind: self.kind }))
    }

    /// Folds that only need some operands to be constant: a decided
    /// short-circuit or a conditional with a constant condition.
    fn shortcut(&self, children: &[Node]) -> Option<Node> {
        let decided = |node: &Node| node.as_constant().and_then(|v| v.as_bool().ok());
        match (&self.operation, children) {
            (Operation::Binary(BinaryOperator::And), [left, _]) if decided(left) == Some(false) => {
                Some(left.clone())
            },
            (Operation::Binary(BinaryOperator::Or), [left, _]) if decided(left) == Some(true) => {
                Some(left.clone())
            },
            (Operation::Function(descriptor), [condition, then_branch, else_branch])
                if matches!(descriptor.body, FunctionBody::Conditional) =>
            {
                let chosen = match decided(condition)? {
                    true => then_branch,
                    false => else_branch,
                };
                (chosen.return_kind() == self.kind).then(|| chosen.clone())
            },
            _ => None,
        }
    }

    fn clone_with(&self, context: &BindingContext) -> Node {
        Node::Operation(Arc::new(Self { operation: self.operation,
                                        children:  self.children
                                                       .iter()
                                                       .map(|child| child.clone_with(context))
                                                       .collect(),
                                        kind:      self.kind, }))
    }

    fn compile(&self) -> Executable {
        let children = self.children.iter().map(Node::compile).collect::<Vec<_>>();

        let executable: Executable = match self.operation {
            Operation::Unary(op) => {
                let operand = children[0].clone();
                Arc::new(move |frame| op.apply(&operand(frame)?))
            },
            Operation::Binary(BinaryOperator::And) => {
                let (left, right) = (children[0].clone(), children[1].clone());
                Arc::new(move |frame| {
                    if !left(frame)?.as_bool()? {
                        return Ok(Value::Boolean(false));
                    }
                    Ok(Value::Boolean(right(frame)?.as_bool()?))
                })
            },
            Operation::Binary(BinaryOperator::Or) => {
                let (left, right) = (children[0].clone(), children[1].clone());
                Arc::new(move |frame| {
                    if left(frame)?.as_bool()? {
                        return Ok(Value::Boolean(true));
                    }
                    Ok(Value::Boolean(right(frame)?.as_bool()?))
                })
            },
            Operation::Binary(op) => {
                let (left, right) = (children[0].clone(), children[1].clone());
                Arc::new(move |frame| op.apply(&left(frame)?, &right(frame)?))
            },
            Operation::Function(descriptor) => descriptor.compile(children),
        };

        if self.kind == ValueKind::FLOAT {
            Arc::new(move |frame| {
                match executable(frame)? {
                    Value::Integer(i) => Value::Integer(i).as_float().map(Value::Float),
                    other => Ok(other),
                }
            })
        } else {
            executable
        }
    }
}

/// A node of a typed expression tree.
///
/// Nodes are immutable and cheap to clone: every variant is reference counted,
/// and the whole tree is `Send + Sync`.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A literal or folded value.
    Constant(Arc<ConstantNode>),
    /// A parameter supplied at evaluation time.
    Parameter(Arc<ParameterNode>),
    /// An operator or function application.
    Operation(Arc<OperationNode>),
}

impl Node {
    /// Builds and type checks an operation node.
    ///
    /// # Errors
    /// See [`OperationNode::new`].
    pub fn operation(operation: Operation, children: Vec<Self>) -> CompileResult<Self> {
        OperationNode::new(operation, children).map(|node| Self::Operation(Arc::new(node)))
    }

    /// The static kind of the value this node produces, determined without
    /// evaluation.
    #[must_use]
    pub fn return_kind(&self) -> ValueKind {
        match self {
            Self::Constant(constant) => constant.kind(),
            Self::Parameter(parameter) => parameter.kind(),
            Self::Operation(operation) => operation.kind,
        }
    }

    /// Returns the value of a constant node.
    #[must_use]
    pub fn as_constant(&self) -> Option<Value> {
        match self {
            Self::Constant(constant) => Some(constant.value.clone()),
            _ => None,
        }
    }

    /// Returns a simplified copy of the tree.
    ///
    /// Children are simplified first; a node whose children are all constants
    /// is then replaced by its value, unless the operation is volatile or its
    /// evaluation fails (the failure is left for invocation time). Simplifying
    /// twice gives the same tree as simplifying once.
    ///
    /// # Example
    /// ```
    /// use formulon::compile;
    ///
    /// let expression = compile("2 + 3 * 4").unwrap();
    /// let root = expression.root();
    ///
    /// assert_eq!(root.to_string(), "14");
    /// assert_eq!(root.simplify(), root.clone());
    /// ```
    #[must_use]
    pub fn simplify(&self) -> Self {
        match self {
            Self::Constant(_) | Self::Parameter(_) => self.clone(),
            Self::Operation(operation) => operation.simplify(),
        }
    }

    /// Returns an independent copy of the tree bound to `context`.
    ///
    /// Parameters that the context binds become constants; the others are
    /// replaced by the context's parameter nodes, so the copy is slotted for
    /// the context's frame layout. Constants and untouched structure are
    /// shared, which is safe because nodes are immutable.
    #[must_use]
    pub fn clone_with(&self, context: &BindingContext) -> Self {
        match self {
            Self::Constant(_) => self.clone(),
            Self::Parameter(parameter) => context.resolve(parameter).unwrap_or_else(|| self.clone()),
            Self::Operation(operation) => operation.clone_with(context),
        }
    }

    /// Compiles the tree into a thread-safe closure.
    ///
    /// `&&` and `||` short-circuit and conditionals evaluate only the selected
    /// branch.
    #[must_use]
    pub fn compile(&self) -> Executable {
        match self {
            Self::Constant(constant) => {
                let value = constant.value.clone();
                Arc::new(move |_| Ok(value.clone()))
            },
            Self::Parameter(parameter) => {
                let slot = parameter.slot;
                let name = Arc::clone(&parameter.name);
                Arc::new(move |frame| {
                    frame.get(slot)
                         .cloned()
                         .ok_or_else(|| EvalError::MissingParameter { name: name.to_string() })
                })
            },
            Self::Operation(operation) => operation.compile(),
        }
    }

    /// Visits every node of the tree in pre-order.
    pub fn walk(&self, visit: &mut impl FnMut(&Self)) {
        visit(self);
        if let Self::Operation(operation) = self {
            for child in &operation.children {
                child.walk(visit);
            }
        }
    }
}

/// The context a tree is cloned into: values for some parameters and a frame
/// layout for the rest.
///
/// Every parameter node and bound constant is created once, so the cloned tree
/// keeps one shared node per name.
#[derive(Debug, Clone, Default)]
pub struct BindingContext {
    nodes: HashMap<Arc<str>, Node>,
}

impl BindingContext {
    /// Creates a context in which nothing is bound and nothing is re-slotted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a parameter to a constant value.
    pub fn bind(&mut self, name: &str, value: Value) {
        self.nodes
            .insert(Arc::from(name), Node::Constant(Arc::new(ConstantNode::computed(value))));
    }

    /// Moves an unbound parameter to another frame slot.
    pub fn place(&mut self, parameter: &ParameterNode, slot: usize) {
        let node = ParameterNode { slot,
                                   ..parameter.clone() };
        self.nodes.insert(Arc::clone(&parameter.name), Node::Parameter(Arc::new(node)));
    }

    fn resolve(&self, parameter: &ParameterNode) -> Option<Node> {
        self.nodes.get(&parameter.name).cloned()
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant(constant) => match &constant.value {
                Value::String(s) => write!(f, "{s:?}"),
                value => write!(f, "{value}"),
            },
            Self::Parameter(parameter) => write!(f, "{}", parameter.name),
            Self::Operation(operation) => match (&operation.operation, operation.children.as_slice()) {
                (Operation::Unary(op), [operand]) => write!(f, "{op}{operand}"),
                (Operation::Binary(op), [left, right]) => write!(f, "({left} {op} {right})"),
                (op, children) => {
                    write!(f, "{op}(")?;
                    for (index, child) in children.iter().enumerate() {
                        if index > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{child}")?;
                    }
                    write!(f, ")")
                },
            },
        }
    }
}
