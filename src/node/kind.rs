/// The numeric sub-mode of a [`ValueKind::Numeric`] value.
///
/// `Any` is the unconstrained mode: the value may be an integer or a float at
/// runtime. `Integer` and `Float` are mutually exclusive refinements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NumericMode {
    /// Either an integer or a float.
    #[default]
    Any,
    /// A 64-bit signed integer.
    Integer,
    /// A 64-bit float.
    Float,
}

impl NumericMode {
    /// Merges two constraints on the same value.
    ///
    /// The more specific mode wins. Two different specific modes cannot be
    /// merged and yield `None`.
    ///
    /// # Example
    /// ```
    /// use formulon::node::kind::NumericMode;
    ///
    /// assert_eq!(NumericMode::Any.merge(NumericMode::Float), Some(NumericMode::Float));
    /// assert_eq!(NumericMode::Integer.merge(NumericMode::Float), None);
    /// ```
    #[must_use]
    pub fn merge(self, other: Self) -> Option<Self> {
        match (self, other) {
            (Self::Any, mode) | (mode, Self::Any) => Some(mode),
            (a, b) if a == b => Some(a),
            _ => None,
        }
    }

    /// Combines the modes of the operands of an arithmetic operation.
    ///
    /// All integers stay integer, any float makes the result a float, and
    /// everything else is unconstrained.
    #[must_use]
    pub fn combine<I>(modes: I) -> Self
        where I: IntoIterator<Item = Self>
    {
        let mut all_integer = true;
        let mut any = false;
        for mode in modes {
            any = true;
            match mode {
                Self::Float => return Self::Float,
                Self::Any => all_integer = false,
                Self::Integer => {},
            }
        }
        if any && all_integer { Self::Integer } else { Self::Any }
    }
}

/// The coarse class of a [`ValueKind`], ignoring numeric sub-modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindClass {
    /// Integers and floats.
    Numeric,
    /// Text.
    String,
    /// `true` or `false`.
    Boolean,
    /// Raw bytes.
    ByteArray,
}

impl KindClass {
    /// The least constrained kind in this class.
    #[must_use]
    pub const fn widest(self) -> ValueKind {
        match self {
            Self::Numeric => ValueKind::Numeric(NumericMode::Any),
            Self::String => ValueKind::String,
            Self::Boolean => ValueKind::Boolean,
            Self::ByteArray => ValueKind::ByteArray,
        }
    }
}

/// The static type of an expression, a parameter or a value.
///
/// This is the closed set of kinds the compiler reasons about. Every node in a
/// compiled tree has exactly one kind, known without evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// A number, optionally constrained to integers or floats.
    Numeric(NumericMode),
    /// Text.
    String,
    /// `true` or `false`.
    Boolean,
    /// Raw bytes.
    ByteArray,
}

impl Default for ValueKind {
    fn default() -> Self {
        Self::Numeric(NumericMode::Any)
    }
}

impl ValueKind {
    /// Shorthand for an integer kind.
    pub const INTEGER: Self = Self::Numeric(NumericMode::Integer);
    /// Shorthand for a float kind.
    pub const FLOAT: Self = Self::Numeric(NumericMode::Float);
    /// Shorthand for an unconstrained numeric kind.
    pub const NUMBER: Self = Self::Numeric(NumericMode::Any);

    /// Returns the class of this kind.
    #[must_use]
    pub const fn class(self) -> KindClass {
        match self {
            Self::Numeric(_) => KindClass::Numeric,
            Self::String => KindClass::String,
            Self::Boolean => KindClass::Boolean,
            Self::ByteArray => KindClass::ByteArray,
        }
    }

    /// Whether a value of this kind can be used where `required` is expected.
    ///
    /// Classes must match. An integer widens to a float, and an unconstrained
    /// number is accepted where an integer is required (checked when the value
    /// is known). A float never satisfies an integer requirement.
    ///
    /// # Example
    /// ```
    /// use formulon::node::kind::ValueKind;
    ///
    /// assert!(ValueKind::INTEGER.satisfies(ValueKind::FLOAT));
    /// assert!(!ValueKind::FLOAT.satisfies(ValueKind::INTEGER));
    /// assert!(!ValueKind::String.satisfies(ValueKind::NUMBER));
    /// ```
    #[must_use]
    pub fn satisfies(self, required: Self) -> bool {
        match (self, required) {
            (Self::Numeric(NumericMode::Float), Self::Numeric(NumericMode::Integer)) => false,
            _ => self.class() == required.class(),
        }
    }

    /// Returns the numeric mode, if this is a numeric kind.
    #[must_use]
    pub const fn numeric_mode(self) -> Option<NumericMode> {
        match self {
            Self::Numeric(mode) => Some(mode),
            _ => None,
        }
    }
}

impl std::fmt::Display for KindClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Numeric => "numeric",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::ByteArray => "byte array",
        };
        write!(f, "{name}")
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric(NumericMode::Any) => write!(f, "numeric"),
            Self::Numeric(NumericMode::Integer) => write!(f, "integer"),
            Self::Numeric(NumericMode::Float) => write!(f, "float"),
            other => write!(f, "{}", other.class()),
        }
    }
}
