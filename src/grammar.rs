use std::collections::BTreeMap;

use crate::{
    error::{CompileError, CompileResult},
    node::operator::{BinaryOperator, UnaryOperator},
};

/// Which end of the level numbering binds tighter.
///
/// With [`Precedence::LowerBindsTighter`] an operator on level `0` is applied
/// before an operator on level `1`, as in `2 + 3 * 4` when `*` sits on a lower
/// level than `+`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precedence {
    /// Level `0` binds tightest.
    #[default]
    LowerBindsTighter,
    /// The highest level binds tightest.
    HigherBindsTighter,
}

impl Precedence {
    /// Returns `true` if `a` binds more loosely than `b`.
    #[must_use]
    pub const fn looser(self, a: u32, b: u32) -> bool {
        match self {
            Self::LowerBindsTighter => a > b,
            Self::HigherBindsTighter => a < b,
        }
    }
}

/// A precedence table mapping a numeric level to the operator tokens evaluated
/// together on that level.
///
/// Tokens keep their insertion order within a level.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LeveledOperators {
    levels: BTreeMap<u32, Vec<String>>,
}

impl LeveledOperators {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `tokens` to `level` and returns the table.
    ///
    /// # Example
    /// ```
    /// use formulon::grammar::LeveledOperators;
    ///
    /// let table = LeveledOperators::new().with_level(0, &["*", "/"])
    ///                                    .with_level(1, &["+", "-"]);
    /// assert_eq!(table.level_of("-"), Some(1));
    /// ```
    #[must_use]
    pub fn with_level(mut self, level: u32, tokens: &[&str]) -> Self {
        for token in tokens {
            self.insert(level, token);
        }
        self
    }

    /// Adds a single token to a level. A token already present on another
    /// level is moved.
    pub fn insert(&mut self, level: u32, token: &str) {
        for tokens in self.levels.values_mut() {
            tokens.retain(|t| t != token);
        }
        self.levels.entry(level).or_default().push(token.to_string());
        self.levels.retain(|_, tokens| !tokens.is_empty());
    }

    /// Iterates levels in ascending order.
    pub fn levels(&self) -> impl Iterator<Item = (u32, &[String])> {
        self.levels.iter().map(|(level, tokens)| (*level, tokens.as_slice()))
    }

    /// Iterates every `(level, token)` pair.
    pub fn tokens(&self) -> impl Iterator<Item = (u32, &str)> {
        self.levels().flat_map(|(level, tokens)| tokens.iter().map(move |t| (level, t.as_str())))
    }

    /// Returns the level a token belongs to.
    #[must_use]
    pub fn level_of(&self, token: &str) -> Option<u32> {
        self.tokens().find(|(_, t)| *t == token).map(|(level, _)| level)
    }

    /// Returns `true` if no operator is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Everything the compiler needs to know about the surface syntax.
///
/// The default grammar is C-like: `(` and `)` for grouping and calls, `,`
/// between arguments, `"` around strings, and this operator table (lower
/// levels bind tighter):
///
/// | level | tokens |
/// |---|---|
/// | 0 | `^` `**` |
/// | 1 | `*` `/` `%` |
/// | 2 | `+` `-` |
/// | 3 | `<` `<=` `>` `>=` |
/// | 4 | `==` `!=` `<>` |
/// | 5 | `&&` `and` |
/// | 6 | `xor` |
/// | 7 | `\|\|` `or` |
///
/// Prefix operators are `-`, `+`, `!` and `not`; they bind tighter than any
/// binary operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarConfig {
    /// Opens a group or an argument list.
    pub open_paren:       String,
    /// Closes a group or an argument list.
    pub close_paren:      String,
    /// Separates function arguments.
    pub separator:        String,
    /// Surrounds string literals.
    pub string_delimiter: String,
    /// Binary operators by precedence level.
    pub operators:        LeveledOperators,
    /// Operators that may appear in front of an operand.
    pub prefix_operators: Vec<String>,
    /// Which level numbers bind tighter.
    pub precedence:       Precedence,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        let operators = LeveledOperators::new().with_level(0, &["^", "**"])
                                               .with_level(1, &["*", "/", "%"])
                                               .with_level(2, &["+", "-"])
                                               .with_level(3, &["<", "<=", ">", ">="])
                                               .with_level(4, &["==", "!=", "<>"])
                                               .with_level(5, &["&&", "and"])
                                               .with_level(6, &["xor"])
                                               .with_level(7, &["||", "or"]);
        Self { open_paren: "(".to_string(),
               close_paren: ")".to_string(),
               separator: ",".to_string(),
               string_delimiter: "\"".to_string(),
               operators,
               prefix_operators: ["-", "+", "!", "not"].map(String::from).to_vec(),
               precedence: Precedence::LowerBindsTighter }
    }
}

impl GrammarConfig {
    /// Replaces the precedence direction.
    #[must_use]
    pub const fn with_precedence(mut self, precedence: Precedence) -> Self {
        self.precedence = precedence;
        self
    }

    /// Replaces the binary operator table.
    #[must_use]
    pub fn with_operators(mut self, operators: LeveledOperators) -> Self {
        self.operators = operators;
        self
    }

    /// Replaces the prefix operators.
    #[must_use]
    pub fn with_prefix_operators(mut self, tokens: &[&str]) -> Self {
        self.prefix_operators = tokens.iter().map(ToString::to_string).collect();
        self
    }

    /// Replaces the parenthesis pair.
    #[must_use]
    pub fn with_parens(mut self, open: &str, close: &str) -> Self {
        self.open_paren = open.to_string();
        self.close_paren = close.to_string();
        self
    }

    /// Replaces the argument separator.
    #[must_use]
    pub fn with_separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }

    /// Replaces the string delimiter.
    #[must_use]
    pub fn with_string_delimiter(mut self, delimiter: &str) -> Self {
        self.string_delimiter = delimiter.to_string();
        self
    }

    /// Returns `true` if `token` is configured as a prefix operator.
    #[must_use]
    pub fn is_prefix(&self, token: &str) -> bool {
        self.prefix_operators.iter().any(|t| t == token)
    }

    /// Checks that the grammar can be compiled against.
    ///
    /// Punctuation must be non-empty and free of identifier characters, so
    /// that it can never appear inside a name. Operator tokens are either all
    /// identifier characters (word operators such as `and`, which must start
    /// with a letter) or contain none. Every operator token must map to a
    /// known operation.
    ///
    /// # Errors
    /// `Syntax` for malformed punctuation or tokens, `UnknownSymbol` for
    /// operator tokens without an operation.
    ///
    /// # Example
    /// ```
    /// use formulon::grammar::{GrammarConfig, LeveledOperators};
    ///
    /// assert!(GrammarConfig::default().validate().is_ok());
    ///
    /// let odd = GrammarConfig::default().with_operators(LeveledOperators::new().with_level(0, &["$"]));
    /// assert!(odd.validate().is_err());
    /// ```
    pub fn validate(&self) -> CompileResult<()> {
        for (what, punctuation) in [("opening parenthesis", &self.open_paren),
                                    ("closing parenthesis", &self.close_paren),
                                    ("separator", &self.separator),
                                    ("string delimiter", &self.string_delimiter)]
        {
            if punctuation.is_empty() || punctuation.chars().any(is_identifier_char) {
                return Err(CompileError::syntax(format!("invalid {what} '{punctuation}' in grammar")));
            }
        }
        if self.open_paren == self.close_paren {
            return Err(CompileError::syntax("parentheses must differ"));
        }

        for (_, token) in self.operators.tokens() {
            check_token_shape(token)?;
            if BinaryOperator::from_token(token).is_none() {
                return Err(CompileError::UnknownSymbol { name:  token.to_string(),
                                                         arity: 2, });
            }
        }
        for token in &self.prefix_operators {
            check_token_shape(token)?;
            if UnaryOperator::from_token(token).is_none() {
                return Err(CompileError::UnknownSymbol { name:  token.clone(),
                                                         arity: 1, });
            }
        }
        Ok(())
    }
}

/// Characters that may appear in identifiers, numbers and generated names.
#[must_use]
pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Returns `true` for tokens made of identifier characters, such as `and`.
#[must_use]
pub fn is_word_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(is_identifier_char)
}

fn check_token_shape(token: &str) -> CompileResult<()> {
    if token.is_empty() {
        return Err(CompileError::syntax("empty operator token in grammar"));
    }
    let word_chars = token.chars().filter(|c| is_identifier_char(*c)).count();
    let well_formed = if word_chars == 0 {
        !token.chars().any(char::is_whitespace)
    } else {
        word_chars == token.chars().count() && token.starts_with(char::is_alphabetic)
    };
    if well_formed {
        Ok(())
    } else {
        Err(CompileError::syntax(format!("operator token '{token}' mixes names and symbols")))
    }
}
