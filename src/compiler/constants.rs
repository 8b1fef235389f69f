use std::{collections::HashMap, sync::Arc};

use crate::{
    compiler::{literal::Literal, symbol::NameGenerator},
    error::{CompileError, CompileResult},
    node::{core::ConstantNode, value::Value},
};

/// Classifies literal tokens and keeps exactly one [`ConstantNode`] per
/// distinct literal text.
///
/// Each constant gets a generated name (`__k0`, `__k1`, ...) in a namespace
/// separate from expression symbols.
#[derive(Debug, Clone)]
pub struct ConstantInterner {
    forward:   HashMap<String, Arc<ConstantNode>>,
    reverse:   HashMap<String, String>,
    names:     NameGenerator,
    delimiter: String,
}

impl ConstantInterner {
    /// Creates an empty interner for `source`, whose strings are delimited by
    /// `delimiter`.
    #[must_use]
    pub fn new(source: &str, delimiter: &str) -> Self {
        Self { forward:   HashMap::new(),
               reverse:   HashMap::new(),
               names:     NameGenerator::new("__k", source),
               delimiter: delimiter.to_string(), }
    }

    /// Interns a literal and returns its constant name.
    ///
    /// Tried in order: numbers, quoted strings, `0x` byte arrays and
    /// booleans. Returns `Ok(None)` when the text is not a literal, leaving it
    /// to parameter classification.
    ///
    /// # Errors
    /// `Syntax` for out-of-range integers, odd-length byte arrays and invalid
    /// string escapes.
    ///
    /// # Example
    /// ```
    /// use formulon::compiler::constants::ConstantInterner;
    ///
    /// let mut constants = ConstantInterner::new("5 + 5", "\"");
    /// let first = constants.intern("5").unwrap().unwrap();
    /// let second = constants.intern(" 5 ").unwrap().unwrap();
    ///
    /// assert_eq!(first, second);
    /// assert_eq!(constants.len(), 1);
    /// assert_eq!(constants.intern("x").unwrap(), None);
    /// ```
    pub fn intern(&mut self, literal: &str) -> CompileResult<Option<String>> {
        let literal = literal.trim();
        if let Some(name) = self.reverse.get(literal) {
            return Ok(Some(name.clone()));
        }

        let Some(value) = self.classify(literal)? else {
            return Ok(None);
        };

        let name = self.names.next_name();
        log::trace!("constant {name} = {value} from '{literal}'");
        self.forward
            .insert(name.clone(), Arc::new(ConstantNode::literal(value, literal)));
        self.reverse.insert(literal.to_string(), name.clone());
        Ok(Some(name))
    }

    fn classify(&self, literal: &str) -> CompileResult<Option<Value>> {
        let delimiter = self.delimiter.as_str();
        if literal.len() >= 2 * delimiter.len()
           && let Some(body) = literal.strip_prefix(delimiter)
                                      .and_then(|rest| rest.strip_suffix(delimiter))
        {
            return unescape(body, delimiter).map(|text| Some(Value::from(text)));
        }

        Ok(Literal::classify(literal)?.and_then(|literal| literal.value()))
    }

    /// Returns the constant with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<ConstantNode>> {
        self.forward.get(name).cloned()
    }

    /// Returns `true` if `name` is a generated constant name.
    #[must_use]
    pub fn is_key(&self, name: &str) -> bool {
        self.forward.contains_key(name)
    }

    /// Number of distinct constants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Returns `true` if nothing was interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

/// Resolves the backslash escapes of a string literal body.
///
/// Supported escapes are `\\`, `\n`, `\t`, `\r` and a backslash followed by
/// the delimiter.
///
/// # Errors
/// `Syntax` for any other escape or a trailing backslash.
///
/// # Example
/// ```
/// use formulon::compiler::constants::unescape;
///
/// assert_eq!(unescape(r#"say \"hi\"\n"#, "\"").unwrap(), "say \"hi\"\n");
/// assert!(unescape(r"\q", "\"").is_err());
/// ```
pub fn unescape(body: &str, delimiter: &str) -> CompileResult<String> {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;

    while let Some(position) = rest.find('\\') {
        out.push_str(&rest[..position]);
        let escape = &rest[position + 1..];
        let (replacement, consumed) = if escape.starts_with(delimiter) {
            (delimiter, delimiter.len())
        } else {
            match escape.chars().next() {
                Some('\\') => ("\\", 1),
                Some('n') => ("\n", 1),
                Some('t') => ("\t", 1),
                Some('r') => ("\r", 1),
                Some(other) => {
                    return Err(CompileError::syntax(format!("unknown escape '\\{other}' in string literal")));
                },
                None => return Err(CompileError::syntax("string literal ends with a backslash")),
            }
        };
        out.push_str(replacement);
        rest = &escape[consumed..];
    }

    out.push_str(rest);
    Ok(out)
}
