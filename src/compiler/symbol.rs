use std::collections::HashMap;

use crate::grammar::is_identifier_char;

/// Produces fresh names that never occur anywhere in the source text.
///
/// A candidate is `prefix` followed by a counter; candidates that are a
/// substring of the source are skipped, so a generated name can never be
/// confused with anything the user wrote.
#[derive(Debug, Clone)]
pub struct NameGenerator {
    prefix:  &'static str,
    counter: usize,
    source:  String,
}

impl NameGenerator {
    /// Creates a generator for names that must not clash with `source`.
    #[must_use]
    pub fn new(prefix: &'static str, source: &str) -> Self {
        Self { prefix,
               counter: 0,
               source: source.to_string() }
    }

    /// Returns the next unused name.
    ///
    /// # Example
    /// ```
    /// use formulon::compiler::symbol::NameGenerator;
    ///
    /// let mut names = NameGenerator::new("__s", "__s0 + __s1");
    /// assert_eq!(names.next_name(), "__s2");
    /// assert_eq!(names.next_name(), "__s3");
    /// ```
    pub fn next_name(&mut self) -> String {
        loop {
            let candidate = format!("{}{}", self.prefix, self.counter);
            self.counter += 1;
            if !self.source.contains(&candidate) {
                return candidate;
            }
        }
    }
}

/// Index of a symbol in its [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub usize);

/// What a symbol stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    /// Parenthesis-free expression text. `dependencies` lists the symbols the
    /// text refers to by name.
    Expression {
        /// The flat text.
        text:         String,
        /// Symbols named in the text.
        dependencies: Vec<SymbolId>,
    },
    /// A function call.
    Call {
        /// The callee name as written.
        function:  String,
        /// One expression symbol per argument.
        arguments: Vec<SymbolId>,
    },
}

/// A named piece of the source produced by parenthesis resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionSymbol {
    /// The generated name that replaced the piece in the working text.
    pub name: String,
    /// What the name stands for.
    pub kind: SymbolKind,
}

impl ExpressionSymbol {
    /// Returns `true` for function calls.
    #[must_use]
    pub const fn is_call(&self) -> bool {
        matches!(self.kind, SymbolKind::Call { .. })
    }
}

/// Arena of symbols in dependency order.
///
/// Symbols only ever refer to symbols created before them, so walking the
/// arena front to back visits every dependency first. Identical expression
/// texts and identical calls are interned once.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: Vec<ExpressionSymbol>,
    by_name: HashMap<String, SymbolId>,
    reverse: HashMap<String, SymbolId>,
    calls:   HashMap<(String, Vec<SymbolId>), SymbolId>,
    names:   NameGenerator,
    root:    Option<SymbolId>,
}

impl SymbolTable {
    /// Creates an empty table whose names avoid `source`.
    #[must_use]
    pub fn new(source: &str) -> Self {
        Self { symbols: Vec::new(),
               by_name: HashMap::new(),
               reverse: HashMap::new(),
               calls:   HashMap::new(),
               names:   NameGenerator::new("__s", source),
               root:    None, }
    }

    /// Interns flat expression text and returns its symbol.
    ///
    /// Text that already is a symbol name resolves to that symbol instead of
    /// wrapping it again.
    pub fn intern_expression(&mut self, text: &str) -> SymbolId {
        let text = text.trim();
        if let Some(id) = self.lookup(text) {
            return id;
        }
        if let Some(id) = self.reverse.get(text) {
            return *id;
        }

        let dependencies = text.split(|c: char| !is_identifier_char(c))
                               .filter_map(|word| self.lookup(word))
                               .collect();
        let id = self.push(SymbolKind::Expression { text: text.to_string(),
                                                    dependencies });
        self.reverse.insert(text.to_string(), id);
        id
    }

    /// Interns a call of `function` over argument symbols.
    pub fn intern_call(&mut self, function: &str, arguments: Vec<SymbolId>) -> SymbolId {
        let signature = (function.to_string(), arguments);
        if let Some(id) = self.calls.get(&signature) {
            return *id;
        }
        let id = self.push(SymbolKind::Call { function:  signature.0.clone(),
                                              arguments: signature.1.clone(), });
        self.calls.insert(signature, id);
        id
    }

    fn push(&mut self, kind: SymbolKind) -> SymbolId {
        let id = SymbolId(self.symbols.len());
        let name = self.names.next_name();
        log::trace!("symbol {name}: {kind:?}");
        self.by_name.insert(name.clone(), id);
        self.symbols.push(ExpressionSymbol { name, kind });
        id
    }

    /// Returns the symbol with the given generated name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.by_name.get(name).copied()
    }

    /// Returns a symbol by id.
    #[must_use]
    pub fn get(&self, id: SymbolId) -> Option<&ExpressionSymbol> {
        self.symbols.get(id.0)
    }

    /// Marks the symbol standing for the whole expression.
    pub fn set_root(&mut self, id: SymbolId) {
        self.root = Some(id);
    }

    /// The symbol standing for the whole expression, once resolution is done.
    #[must_use]
    pub const fn root(&self) -> Option<SymbolId> {
        self.root
    }

    /// Iterates symbols in dependency order.
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &ExpressionSymbol)> {
        self.symbols.iter().enumerate().map(|(i, symbol)| (SymbolId(i), symbol))
    }

    /// Number of symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` if no symbol was created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
