use crate::grammar::{GrammarConfig, is_identifier_char, is_word_token};

/// One operator token found in a text span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// The binary precedence level of the token, or `None` for tokens that are
    /// only configured as prefix operators.
    pub level: Option<u32>,
    /// Byte offset of the token in the searched text.
    pub index: usize,
    /// The token.
    pub token: String,
}

impl Occurrence {
    /// Byte offset just past the token.
    #[must_use]
    pub fn end(&self) -> usize {
        self.index + self.token.len()
    }
}

/// Finds every operator token of a grammar in parenthesis-free text.
///
/// Tokens are tried longest first, so `>=` wins over `>` and `**` over `*`.
/// Word operators such as `and` only match between identifier boundaries, and
/// the sign in an exponent such as `1e-5` is part of the number.
#[derive(Debug, Clone)]
pub struct OperatorLocator {
    tokens: Vec<(String, Option<u32>)>,
}

impl OperatorLocator {
    /// Collects the operator tokens of `grammar`.
    #[must_use]
    pub fn new(grammar: &GrammarConfig) -> Self {
        let mut tokens = grammar.operators
                                .tokens()
                                .map(|(level, token)| (token.to_string(), Some(level)))
                                .collect::<Vec<_>>();
        for token in &grammar.prefix_operators {
            if !tokens.iter().any(|(t, _)| t == token) {
                tokens.push((token.clone(), None));
            }
        }
        tokens.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        Self { tokens }
    }

    /// Returns the operator occurrences in `text`, ordered by position.
    ///
    /// # Example
    /// ```
    /// use formulon::{compiler::locator::OperatorLocator, grammar::GrammarConfig};
    ///
    /// let locator = OperatorLocator::new(&GrammarConfig::default());
    /// let found = locator.locate("a >= 1e-5 and b");
    /// let tokens = found.iter().map(|o| o.token.as_str()).collect::<Vec<_>>();
    ///
    /// assert_eq!(tokens, [">=", "and"]);
    /// assert_eq!(found[0].level, Some(3));
    /// ```
    #[must_use]
    pub fn locate(&self, text: &str) -> Vec<Occurrence> {
        let mut found = Vec::new();

        for (token, level) in &self.tokens {
            let word = is_word_token(token);
            let mut start = 0;
            while let Some(offset) = text[start..].find(token.as_str()) {
                let index = start + offset;
                let end = index + token.len();
                start = end;

                if word && !on_word_boundary(text, index, end) {
                    continue;
                }
                if (token == "+" || token == "-") && is_exponent_sign(text, index) {
                    continue;
                }
                found.push(Occurrence { level: *level,
                                        index,
                                        token: token.clone() });
            }
        }

        found.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| b.token.len().cmp(&a.token.len())));

        let mut covered = 0;
        found.retain(|occurrence| {
                 if occurrence.index < covered {
                     return false;
                 }
                 covered = occurrence.end();
                 true
             });
        log::trace!("located {} operator(s) in '{text}'", found.len());
        found
    }
}

fn on_word_boundary(text: &str, index: usize, end: usize) -> bool {
    let before = text[..index].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(is_identifier_char) && !after.is_some_and(is_identifier_char)
}

/// Returns `true` if the sign at `index` follows the `e` of a numeric literal
/// and precedes its exponent digits.
fn is_exponent_sign(text: &str, index: usize) -> bool {
    let head = &text[..index];
    let Some(mantissa) = head.strip_suffix(['e', 'E']) else {
        return false;
    };
    if !text[index + 1..].starts_with(|c: char| c.is_ascii_digit()) {
        return false;
    }

    let digits_start = mantissa.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.')
                               .len();
    let digits = &mantissa[digits_start..];
    digits.chars().any(|c| c.is_ascii_digit())
    && !mantissa[..digits_start].chars().next_back().is_some_and(is_identifier_char)
}
