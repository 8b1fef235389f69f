use std::{collections::HashMap, sync::Arc};

use crate::{
    error::{CompileError, CompileResult},
    node::{
        core::{ParameterNode, ParameterState},
        kind::{NumericMode, ValueKind},
    },
};

/// A parameter name with its final kind, in slot order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    /// The parameter name.
    pub name: String,
    /// The kind a bound value must have.
    pub kind: ValueKind,
}

/// Tracks the named free variables of one expression and narrows their kinds
/// as usages are discovered.
///
/// Names get slots in order of first appearance. Kinds only ever move from
/// undefined to a concrete kind and numeric modes only narrow; every change
/// bumps [`ParameterRegistry::revision`], so inference can repeat until
/// nothing changes.
#[derive(Debug, Clone, Default)]
pub struct ParameterRegistry {
    parameters: Vec<ParameterNode>,
    slots:      HashMap<Arc<str>, usize>,
    revision:   u64,
}

impl ParameterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` as an undefined parameter unless it is already known.
    pub fn advertise(&mut self, name: &str) -> &ParameterNode {
        let slot = match self.slots.get(name) {
            Some(slot) => *slot,
            None => {
                let slot = self.parameters.len();
                let name: Arc<str> = Arc::from(name);
                log::trace!("parameter '{name}' advertised in slot {slot}");
                self.parameters.push(ParameterNode { name: Arc::clone(&name),
                                                     state: ParameterState::Undefined,
                                                     slot });
                self.slots.insert(name, slot);
                self.revision += 1;
                slot
            },
        };
        &self.parameters[slot]
    }

    /// Requires `name` to be numeric, narrowed to `mode`.
    ///
    /// # Errors
    /// `TypeConflict` when the parameter is already of another kind, or is an
    /// integer and a float is required (or the other way round).
    ///
    /// # Example
    /// ```
    /// use formulon::{
    ///     compiler::parameters::ParameterRegistry,
    ///     node::{core::ParameterState, kind::NumericMode},
    /// };
    ///
    /// let mut parameters = ParameterRegistry::new();
    /// parameters.advertise("x");
    /// parameters.determine_numeric("x", NumericMode::Any).unwrap();
    /// let x = parameters.determine_numeric("x", NumericMode::Integer).unwrap();
    ///
    /// assert_eq!(x.state, ParameterState::Numeric(NumericMode::Integer));
    /// assert!(parameters.determine_bool("x").is_err());
    /// ```
    pub fn determine_numeric(&mut self, name: &str, mode: NumericMode) -> CompileResult<&ParameterNode> {
        self.determine(name, ValueKind::Numeric(mode))
    }

    /// Requires `name` to be a string.
    ///
    /// # Errors
    /// `TypeConflict` when the parameter is already of another kind.
    pub fn determine_string(&mut self, name: &str) -> CompileResult<&ParameterNode> {
        self.determine(name, ValueKind::String)
    }

    /// Requires `name` to be a boolean.
    ///
    /// # Errors
    /// `TypeConflict` when the parameter is already of another kind.
    pub fn determine_bool(&mut self, name: &str) -> CompileResult<&ParameterNode> {
        self.determine(name, ValueKind::Boolean)
    }

    /// Requires `name` to be a byte array.
    ///
    /// # Errors
    /// `TypeConflict` when the parameter is already of another kind.
    pub fn determine_byte_array(&mut self, name: &str) -> CompileResult<&ParameterNode> {
        self.determine(name, ValueKind::ByteArray)
    }

    /// Requires `name` to have `kind`, advertising it first if needed.
    ///
    /// # Errors
    /// `TypeConflict` when the requirement contradicts an earlier one.
    pub fn determine(&mut self, name: &str, kind: ValueKind) -> CompileResult<&ParameterNode> {
        let slot = self.advertise(name).slot;
        let parameter = &mut self.parameters[slot];

        let next = match (parameter.state, kind) {
            (ParameterState::Undefined, kind) => ParameterState::from(kind),
            (ParameterState::Numeric(current), ValueKind::Numeric(mode)) => {
                let merged = current.merge(mode).ok_or_else(|| {
                                                    CompileError::type_conflict(format!("parameter '{name}' is used as \
                                                                                         {} and as {kind}",
                                                                                        ValueKind::Numeric(current)))
                                                })?;
                ParameterState::Numeric(merged)
            },
            (current, kind) if current.kind() == Some(kind) => current,
            (current, kind) => {
                let current = current.kind().unwrap_or_default();
                return Err(CompileError::type_conflict(format!("parameter '{name}' is used as {current} and as \
                                                                {kind}")));
            },
        };

        if next != parameter.state {
            log::trace!("parameter '{name}' narrowed to {kind}");
            parameter.state = next;
            self.revision += 1;
        }
        Ok(&self.parameters[slot])
    }

    /// The kind determined so far, or `None` while undefined or unknown.
    #[must_use]
    pub fn kind(&self, name: &str) -> Option<ValueKind> {
        self.get(name).and_then(|parameter| parameter.state.kind())
    }

    /// Returns a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParameterNode> {
        self.slots.get(name).map(|slot| &self.parameters[*slot])
    }

    /// A counter that changes whenever a parameter is added or narrowed.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Returns `true` if the expression has no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Fixes every parameter's kind.
    ///
    /// Parameters nothing constrained become unconstrained numbers. Returns
    /// one shared node per name and the manifest in slot order.
    #[must_use]
    pub fn finalize(self) -> (HashMap<Arc<str>, Arc<ParameterNode>>, Vec<ParameterInfo>) {
        let mut nodes = HashMap::with_capacity(self.parameters.len());
        let mut manifest = Vec::with_capacity(self.parameters.len());

        for mut parameter in self.parameters {
            if parameter.state == ParameterState::Undefined {
                log::debug!("parameter '{}' is unconstrained, defaulting to numeric", parameter.name);
                parameter.state = ParameterState::Numeric(NumericMode::Any);
            }
            manifest.push(ParameterInfo { name: parameter.name.to_string(),
                                          kind: parameter.kind() });
            nodes.insert(Arc::clone(&parameter.name), Arc::new(parameter));
        }

        (nodes, manifest)
    }
}
