use std::fmt;
use std::sync::Arc;

use crate::{Symbol, Token};

/// Finds the next symbol in an input string starting at an offset.
///
/// Implementations must be deterministic and pure over `(input, offset)` —
/// no state carried between calls. `0 <= offset <= input.len()` on entry;
/// `None` means no symbol occurs at or after `offset`. A returned token must
/// satisfy `offset <= token.from <= token.to <= input.len()`.
pub trait TokenScanner {
    fn find(&self, input: &str, offset: usize) -> Option<Token<Symbol>>;
}

/// How a [`SymbolScanner`] recognizes the end of a placeholder.
#[derive(Clone)]
pub enum Closing {
    /// Bracketed mode: the closing sequence is a literal string.
    Bracketed(String),
    /// Predicate mode: characters are consumed while the predicate accepts
    /// them; closing has zero width.
    Predicate(Arc<dyn Fn(char) -> bool + Send + Sync>),
}

impl fmt::Debug for Closing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Closing::Bracketed(s) => f.debug_tuple("Bracketed").field(s).finish(),
            Closing::Predicate(_) => f.debug_tuple("Predicate").field(&"<fn>").finish(),
        }
    }
}

impl PartialEq for Closing {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Closing::Bracketed(a), Closing::Bracketed(b)) => a == b,
            (Closing::Predicate(a), Closing::Predicate(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Closing {}

/// The scanner `InterpolationFormat` builds its parsers on top of.
///
/// Recognizes `opening ... closing` placeholders plus their escape forms,
/// per the tie-break rules spelled out on [`SymbolScanner::find`].
#[derive(Clone, PartialEq, Eq)]
pub struct SymbolScanner {
    opening: String,
    closing: Closing,
    escaping: String,
}

impl SymbolScanner {
    pub fn new(opening: impl Into<String>, closing: Closing, escaping: impl Into<String>) -> Self {
        Self {
            opening: opening.into(),
            closing,
            escaping: escaping.into(),
        }
    }

    pub fn opening(&self) -> &str {
        &self.opening
    }

    pub fn closing(&self) -> &Closing {
        &self.closing
    }

    pub fn escaping(&self) -> &str {
        &self.escaping
    }
}

impl TokenScanner for SymbolScanner {
    /// Scans for the next placeholder starting at `offset`:
    ///
    /// 1. locate the first `opening` at or after `offset`;
    /// 2. check for an escape (forward, when `escaping == opening`; backward
    ///    otherwise);
    /// 3. otherwise locate the closing (bracketed substring search, or a
    ///    predicate scan);
    /// 4. emit a reference token, or a dangling-open constant if no closing
    ///    is found in bracketed mode.
    fn find(&self, input: &str, offset: usize) -> Option<Token<Symbol>> {
        let p = find_from(input, &self.opening, offset)?;

        if let Some(escape) = self.escape_token(input, p, offset) {
            return Some(escape);
        }

        match &self.closing {
            Closing::Bracketed(closing) => self.find_bracketed(input, p, closing),
            Closing::Predicate(pred) => Some(self.find_predicate(input, p, pred.as_ref())),
        }
    }
}

impl SymbolScanner {
    fn escape_token(&self, input: &str, p: usize, offset: usize) -> Option<Token<Symbol>> {
        if self.escaping == self.opening {
            // `escaping == opening`: the tie can only be broken by looking
            // forward, since backward matching would conflate the escape
            // with whatever precedes it (e.g. `$$` at the very start).
            let probe = p + self.opening.len();
            if input.get(probe..)?.starts_with(self.opening.as_str()) {
                let to = probe + self.opening.len();
                return Some(Token::new(
                    p,
                    to,
                    Symbol::constant(&input[p..to], self.opening.clone()),
                ));
            }
            return None;
        }

        if self.escaping.is_empty() {
            return None;
        }

        let back = p.checked_sub(self.escaping.len())?;
        if back < offset || !input.is_char_boundary(back) {
            return None;
        }
        if &input[back..p] == self.escaping.as_str() {
            let to = p + self.opening.len();
            return Some(Token::new(
                back,
                to,
                Symbol::constant(&input[back..to], self.opening.clone()),
            ));
        }
        None
    }

    fn find_bracketed(&self, input: &str, p: usize, closing: &str) -> Option<Token<Symbol>> {
        let search_from = p + self.opening.len();
        match find_from(input, closing, search_from) {
            Some(q) => {
                let to = q + closing.len();
                let definition = &input[p..to];
                let value = &input[search_from..q];
                Some(Token::new(p, to, Symbol::reference(definition, value)))
            }
            None => {
                // Dangling open: no closing anywhere in the rest of the
                // input. Treated as a constant standing for the opening
                // sequence itself.
                let to = search_from;
                Some(Token::new(
                    p,
                    to,
                    Symbol::constant(&input[p..to], self.opening.clone()),
                ))
            }
        }
    }

    fn find_predicate(
        &self,
        input: &str,
        p: usize,
        pred: &(dyn Fn(char) -> bool + Send + Sync),
    ) -> Token<Symbol> {
        let start = p + self.opening.len();
        let mut q = input.len();
        for (rel, ch) in input[start..].char_indices() {
            let pos = start + rel;
            let rest = &input[pos..];
            let hits_opening = rest.starts_with(self.opening.as_str());
            let hits_escaped_opening = !self.escaping.is_empty()
                && rest.starts_with(self.escaping.as_str())
                && rest[self.escaping.len()..].starts_with(self.opening.as_str());
            if !pred(ch) || hits_opening || hits_escaped_opening {
                q = pos;
                break;
            }
        }
        let definition = &input[p..q];
        let value = &input[start..q];
        Token::new(p, q, Symbol::reference(definition, value))
    }
}

fn find_from(input: &str, needle: &str, offset: usize) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    input.get(offset..)?.find(needle).map(|i| i + offset)
}
