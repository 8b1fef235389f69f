use crate::node::kind::{KindClass, NumericMode, ValueKind};

/// What an operation expects from one of its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// The operand must satisfy this exact kind.
    Kind(ValueKind),
    /// The operand belongs to the signature's unification group: all group
    /// members must share one kind class, taken from the allowed classes.
    Group,
}

/// How the static return kind of an operation is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returns {
    /// Always this kind.
    Kind(ValueKind),
    /// The kind of the unification group. Numeric groups combine their modes:
    /// all integers give an integer, any float gives a float.
    Group,
    /// A numeric result that is a float if any group member is a float, and
    /// unconstrained otherwise (division, exponentiation).
    Widened,
}

/// The typing contract of an operator or function.
///
/// A signature is static data; operators and function descriptors each carry
/// one. The same contract drives constraint collection for parameters (with
/// partially unknown operand kinds) and the final type check of a node (with
/// every operand kind known).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// One requirement per operand.
    pub arguments: &'static [Requirement],
    /// Kind classes allowed for the unification group. Empty means any.
    pub group:     &'static [KindClass],
    /// How the return kind is derived.
    pub returns:   Returns,
}

/// The outcome of resolving a signature against operand kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The return kind, if it can already be determined.
    pub returns: Option<ValueKind>,
    /// For each operand, the kind it is required to take, if known.
    pub demands: Vec<Option<ValueKind>>,
}

impl Signature {
    /// Builds a signature whose operands all have fixed kinds.
    #[must_use]
    pub const fn fixed(arguments: &'static [Requirement], returns: ValueKind) -> Self {
        Self { arguments,
               group: &[],
               returns: Returns::Kind(returns) }
    }

    /// Builds a signature over a unification group.
    #[must_use]
    pub const fn grouped(arguments: &'static [Requirement],
                         group: &'static [KindClass],
                         returns: Returns)
                         -> Self {
        Self { arguments,
               group,
               returns }
    }

    /// Number of operands.
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.arguments.len()
    }

    /// Returns `true` if the operand at `index` determines the return kind.
    ///
    /// Requirements placed on the result of such an operation flow down into
    /// these operands.
    #[must_use]
    pub fn passes_through(&self, index: usize) -> bool {
        matches!(self.returns, Returns::Group | Returns::Widened)
        && matches!(self.arguments.get(index), Some(Requirement::Group))
    }

    /// Resolves the signature against operand kinds, some of which may still
    /// be unknown.
    ///
    /// # Errors
    /// A description of the conflict when a known operand kind violates the
    /// signature.
    ///
    /// # Example
    /// ```
    /// use formulon::node::{kind::ValueKind, operator::BinaryOperator};
    ///
    /// let signature = BinaryOperator::Add.signature();
    /// let resolution = signature.resolve(&[Some(ValueKind::INTEGER), None]).unwrap();
    ///
    /// // The unknown operand is required to be numeric.
    /// assert_eq!(resolution.demands[1], Some(ValueKind::NUMBER));
    /// assert!(signature.resolve(&[Some(ValueKind::String), Some(ValueKind::Boolean)]).is_err());
    /// ```
    pub fn resolve(&self, kinds: &[Option<ValueKind>]) -> Result<Resolution, String> {
        if kinds.len() != self.arguments.len() {
            return Err(format!("expected {} operand(s), found {}",
                               self.arguments.len(),
                               kinds.len()));
        }

        let mut demands = vec![None; kinds.len()];
        let mut group_class = match self.group {
            [only] => Some(*only),
            _ => None,
        };

        for (index, (requirement, kind)) in self.arguments.iter().zip(kinds).enumerate() {
            match (requirement, kind) {
                (Requirement::Kind(required), actual) => {
                    demands[index] = Some(*required);
                    if let Some(actual) = actual
                       && !actual.satisfies(*required)
                    {
                        return Err(format!("operand {} must be {required}, found {actual}",
                                           index + 1));
                    }
                },
                (Requirement::Group, Some(actual)) => {
                    let class = actual.class();
                    if let Some(expected) = group_class
                       && expected != class
                    {
                        return Err(format!("operand {} must be {expected}, found {actual}",
                                           index + 1));
                    }
                    group_class = Some(class);
                },
                (Requirement::Group, None) => {},
            }
        }

        if let Some(class) = group_class {
            if !self.group.is_empty() && !self.group.contains(&class) {
                return Err(format!("{class} operands are not supported here"));
            }
            for (index, requirement) in self.arguments.iter().enumerate() {
                if *requirement == Requirement::Group && kinds[index].is_none() {
                    demands[index] = Some(class.widest());
                }
            }
        }

        let group_modes = || {
            self.arguments
                .iter()
                .zip(kinds)
                .filter(|(requirement, _)| **requirement == Requirement::Group)
                .map(|(_, kind)| kind.and_then(ValueKind::numeric_mode).unwrap_or_default())
        };

        let returns = match self.returns {
            Returns::Kind(kind) => Some(kind),
            Returns::Group => group_class.map(|class| match class {
                                             KindClass::Numeric => {
                                                 ValueKind::Numeric(NumericMode::combine(group_modes()))
                                             },
                                             other => other.widest(),
                                         }),
            Returns::Widened => group_class.map(|_| {
                                               if group_modes().any(|m| m == NumericMode::Float) {
                                                   ValueKind::FLOAT
                                               } else {
                                                   ValueKind::NUMBER
                                               }
                                           }),
        };

        Ok(Resolution { returns, demands })
    }

    /// Type checks fully known operand kinds and returns the result kind.
    ///
    /// # Errors
    /// A description of the conflict when an operand violates the signature.
    pub fn check(&self, kinds: &[ValueKind]) -> Result<ValueKind, String> {
        let known = kinds.iter().copied().map(Some).collect::<Vec<_>>();
        let resolution = self.resolve(&known)?;
        Ok(resolution.returns.unwrap_or_default())
    }
}
