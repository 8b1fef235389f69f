use crate::{
    compiler::{
        constants::ConstantInterner,
        symbol::{SymbolId, SymbolTable},
    },
    error::{CompileError, CompileResult},
    grammar::{GrammarConfig, is_identifier_char, is_word_token},
};

/// Rewrites nested parentheses into a flat [`SymbolTable`].
///
/// Resolution is a loop, not a recursion: every pass takes the first closing
/// parenthesis and the last opening parenthesis before it, which always
/// delimit an innermost group, interns the group as symbols and replaces it in
/// the working text by the generated names. The loop ends when no parenthesis
/// is left; what remains is the root expression.
///
/// String literals are interned as constants before resolution, so
/// parentheses and separators inside them are inert.
#[derive(Debug)]
pub struct Resolver<'g> {
    grammar:     &'g GrammarConfig,
    word_tokens: Vec<&'g str>,
}

impl<'g> Resolver<'g> {
    /// Creates a resolver for `grammar`.
    #[must_use]
    pub fn new(grammar: &'g GrammarConfig) -> Self {
        let word_tokens = grammar.operators
                                 .tokens()
                                 .map(|(_, token)| token)
                                 .chain(grammar.prefix_operators.iter().map(String::as_str))
                                 .filter(|token| is_word_token(token))
                                 .collect();
        Self { grammar,
               word_tokens }
    }

    /// Resolves `source` into a symbol table, interning string literals into
    /// `constants`.
    ///
    /// # Errors
    /// `Syntax` for unterminated strings, unbalanced parentheses, empty groups
    /// or arguments, calls of something that is not a name, separators outside
    /// of calls and empty expressions.
    ///
    /// # Example
    /// ```
    /// use formulon::{
    ///     compiler::{constants::ConstantInterner, resolver::Resolver, symbol::SymbolKind},
    ///     grammar::GrammarConfig,
    /// };
    ///
    /// let grammar = GrammarConfig::default();
    /// let source = "max(a, (b + 1)) * 2";
    /// let mut constants = ConstantInterner::new(source, "\"");
    /// let symbols = Resolver::new(&grammar).resolve(source, &mut constants).unwrap();
    ///
    /// let calls = symbols.iter().filter(|(_, s)| s.is_call()).count();
    /// assert_eq!(calls, 1);
    ///
    /// let root = symbols.get(symbols.root().unwrap()).unwrap();
    /// assert!(matches!(&root.kind, SymbolKind::Expression { text, .. } if text.ends_with("* 2")));
    /// ```
    pub fn resolve(&self, source: &str, constants: &mut ConstantInterner) -> CompileResult<SymbolTable> {
        let mut symbols = SymbolTable::new(source);
        let mut text = self.extract_strings(source, constants)?;

        let open = self.grammar.open_paren.as_str();
        let close = self.grammar.close_paren.as_str();

        while let Some(close_at) = text.find(close) {
            let open_at = text[..close_at].rfind(open)
                                          .ok_or_else(|| CompileError::syntax(format!("unmatched '{close}'")))?;
            let inner = &text[open_at + open.len()..close_at];
            let callee = self.callee_before(&text, open_at, &symbols, constants)?;

            let replacement = match callee {
                Some((_, name)) => {
                    let arguments = self.call_arguments(name, inner, &mut symbols)?;
                    let call = symbols.intern_call(name, arguments);
                    name_of(&symbols, call)
                },
                None => self.group(inner, &mut symbols)?,
            };

            let start = callee.map_or(open_at, |(start, _)| start);
            let end = close_at + close.len();
            text = format!("{} {replacement} {}", &text[..start], &text[end..]);
        }

        if text.contains(open) {
            return Err(CompileError::syntax(format!("unmatched '{open}'")));
        }
        if text.contains(self.grammar.separator.as_str()) {
            return Err(CompileError::syntax(format!("'{}' outside of a function call",
                                                    self.grammar.separator)));
        }
        if text.trim().is_empty() {
            return Err(CompileError::syntax("empty expression"));
        }

        let root = symbols.intern_expression(&text);
        symbols.set_root(root);
        log::debug!("resolved '{source}' into {} symbol(s)", symbols.len());
        Ok(symbols)
    }

    /// Replaces every string literal by the name of its constant.
    fn extract_strings(&self, source: &str, constants: &mut ConstantInterner) -> CompileResult<String> {
        let delimiter = self.grammar.string_delimiter.as_str();
        let mut out = String::with_capacity(source.len());
        let mut rest = source;

        while let Some(start) = rest.find(delimiter) {
            out.push_str(&rest[..start]);
            let body_start = start + delimiter.len();
            let body_len = closing_delimiter(&rest[body_start..], delimiter).ok_or_else(|| {
                               CompileError::syntax(format!("unterminated string literal {}",
                                                            &rest[start..]))
                           })?;
            let end = body_start + body_len + delimiter.len();
            let name = constants.intern(&rest[start..end])?
                                .ok_or_else(|| CompileError::syntax(format!("invalid string literal {}",
                                                                            &rest[start..end])))?;
            out.push(' ');
            out.push_str(&name);
            out.push(' ');
            rest = &rest[end..];
        }

        out.push_str(rest);
        Ok(out)
    }

    /// Finds the name a group at `open_at` is attached to, if any, with the
    /// byte offset where it starts.
    fn callee_before<'t>(&self,
                         text: &'t str,
                         open_at: usize,
                         symbols: &SymbolTable,
                         constants: &ConstantInterner)
                         -> CompileResult<Option<(usize, &'t str)>> {
        let head = text[..open_at].trim_end();
        let start = head.trim_end_matches(is_identifier_char).len();
        let name = &head[start..];

        if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
            return Ok(None);
        }
        if self.word_tokens.iter().any(|token| *token == name) {
            return Ok(None);
        }
        if symbols.lookup(name).is_some() || constants.is_key(name) {
            return Err(CompileError::syntax("only names can be called"));
        }
        Ok(Some((start, name)))
    }

    fn call_arguments(&self, name: &str, inner: &str, symbols: &mut SymbolTable) -> CompileResult<Vec<SymbolId>> {
        if inner.trim().is_empty() {
            return Ok(Vec::new());
        }
        inner.split(self.grammar.separator.as_str())
             .map(|argument| {
                 if argument.trim().is_empty() {
                     Err(CompileError::syntax(format!("empty argument in call of '{name}'")))
                 } else {
                     Ok(symbols.intern_expression(argument))
                 }
             })
             .collect()
    }

    /// Interns the operands of a plain group and returns their names joined by
    /// the separator.
    fn group(&self, inner: &str, symbols: &mut SymbolTable) -> CompileResult<String> {
        if inner.trim().is_empty() {
            return Err(CompileError::syntax(format!("empty {}{}",
                                                    self.grammar.open_paren, self.grammar.close_paren)));
        }
        let separator = self.grammar.separator.as_str();
        let mut names = Vec::new();
        for operand in inner.split(separator) {
            if operand.trim().is_empty() {
                return Err(CompileError::syntax(format!("empty operand in '{}{inner}{}'",
                                                        self.grammar.open_paren, self.grammar.close_paren)));
            }
            let id = symbols.intern_expression(operand);
            names.push(name_of(symbols, id));
        }
        Ok(names.join(separator))
    }

}

fn name_of(symbols: &SymbolTable, id: SymbolId) -> String {
    symbols.get(id).map(|symbol| symbol.name.clone()).unwrap_or_default()
}

/// Returns the length of a string body up to its closing delimiter, skipping
/// backslash escapes.
fn closing_delimiter(body: &str, delimiter: &str) -> Option<usize> {
    let mut escaped = false;
    for (index, c) in body.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if body[index..].starts_with(delimiter) {
            return Some(index);
        }
    }
    None
}
