use std::sync::Arc;

use thiserror::Error;
use tmpl_scan::{Closing, SymbolScanner, TokenScanner};

use crate::parser::{Fragment, TemplateParser};
use crate::template::Template;

/// Raised at construction time when a format's delimiters are malformed.
/// Construction either succeeds outright or fails with one of these; a
/// format instance is never built in an invalid state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    #[error("opening sequence must not be empty")]
    EmptyOpening,
    #[error("closing sequence must not be empty")]
    EmptyClosing,
    #[error("escaping sequence must not contain the opening sequence unless it equals it")]
    IllegalEscaping,
}

/// Immutable configuration owning a [`TokenScanner`]; produces
/// [`TemplateParser`]s and [`Template`] trees, and implements the
/// constant/reproduction escape operations.
#[derive(Clone)]
pub struct InterpolationFormat {
    scanner: Arc<dyn TokenScanner + Send + Sync>,
    opening: String,
    escaping: String,
}

impl InterpolationFormat {
    /// `opening = "${"`, `closing = "}"`, `escaping = "$"`.
    pub fn standard() -> Self {
        Self::with(DollarBrace::OPENING, DollarBrace::CLOSING, DollarBrace::ESCAPING)
            .expect("standard() delimiters are always well-formed")
    }

    /// `opening = "$"`, closing on the first non-`[A-Za-z0-9_]` character,
    /// `escaping = "$"`.
    pub fn reduced() -> Self {
        Self::with_predicate("$", |c: char| c.is_ascii_alphanumeric() || c == '_', "$")
            .expect("reduced() delimiters are always well-formed")
    }

    /// Bracketed-closing form with an explicit opening, closing, and
    /// escaping sequence. `escaping` must either equal `opening` or contain
    /// no occurrence of it; pass an empty `escaping` via [`Self::with_no_escaping`]
    /// instead of calling this with `escaping = ""`.
    pub fn with(
        opening: impl Into<String>,
        closing: impl Into<String>,
        escaping: impl Into<String>,
    ) -> Result<Self, ConstructionError> {
        let opening = opening.into();
        let closing = closing.into();
        let escaping = escaping.into();
        if escaping.is_empty() {
            return Self::with_no_escaping(opening, closing);
        }
        Self::validate(&opening, Some(&closing), &escaping)?;
        Ok(Self::build(opening, Closing::Bracketed(closing), escaping))
    }

    /// Bracketed-closing form with no escaping: [`Self::constant`] will
    /// fail with [`crate::ConstructionError`]'s sibling,
    /// `UnsupportedOperation`, since there is nothing to escape with.
    pub fn with_no_escaping(
        opening: impl Into<String>,
        closing: impl Into<String>,
    ) -> Result<Self, ConstructionError> {
        let opening = opening.into();
        let closing = closing.into();
        Self::validate(&opening, Some(&closing), "")?;
        Ok(Self::build(opening, Closing::Bracketed(closing), String::new()))
    }

    /// Predicate-closing form: the placeholder name runs until `predicate`
    /// first rejects a character (or input end).
    pub fn with_predicate(
        opening: impl Into<String>,
        predicate: impl Fn(char) -> bool + Send + Sync + 'static,
        escaping: impl Into<String>,
    ) -> Result<Self, ConstructionError> {
        let opening = opening.into();
        let escaping = escaping.into();
        Self::validate(&opening, None, &escaping)?;
        Ok(Self::build(
            opening,
            Closing::Predicate(Arc::new(predicate)),
            escaping,
        ))
    }

    /// Predicate-closing form with no escaping.
    pub fn with_predicate_no_escaping(
        opening: impl Into<String>,
        predicate: impl Fn(char) -> bool + Send + Sync + 'static,
    ) -> Result<Self, ConstructionError> {
        let opening = opening.into();
        Self::validate(&opening, None, "")?;
        Ok(Self::build(
            opening,
            Closing::Predicate(Arc::new(predicate)),
            String::new(),
        ))
    }

    fn validate(
        opening: &str,
        closing: Option<&str>,
        escaping: &str,
    ) -> Result<(), ConstructionError> {
        if opening.is_empty() {
            return Err(ConstructionError::EmptyOpening);
        }
        if let Some(closing) = closing {
            if closing.is_empty() {
                return Err(ConstructionError::EmptyClosing);
            }
        }
        if !escaping.is_empty() && escaping != opening && escaping.contains(opening) {
            return Err(ConstructionError::IllegalEscaping);
        }
        Ok(())
    }

    fn build(opening: String, closing: Closing, escaping: String) -> Self {
        let scanner = SymbolScanner::new(opening.clone(), closing, escaping.clone());
        Self {
            scanner: Arc::new(scanner),
            opening,
            escaping,
        }
    }

    /// Constructs a stateful parser over `input`.
    pub fn parser<'a>(&'a self, input: &'a str) -> TemplateParser<'a> {
        TemplateParser::new(input, self.scanner.as_ref())
    }

    /// Repeatedly drives a parser, collecting fragments into the canonical
    /// [`Template`] (a `Sequence`, a single fragment, or an empty literal).
    pub fn parse(&self, input: &str) -> Template {
        let mut parser = self.parser(input);
        let mut fragments = Vec::new();
        while let Some(fragment) = parser.next_fragment() {
            fragments.push(Template::from(fragment));
        }
        Template::sequence(fragments)
    }

    /// Streaming shortcut: resolves `input` directly against `resolver`
    /// without building an intermediate [`Template`] tree.
    pub fn resolve<F>(&self, input: &str, mut resolver: F) -> String
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut parser = self.parser(input);
        let mut out = String::with_capacity(input.len());
        while let Some(fragment) = parser.next_fragment() {
            match fragment {
                Fragment::Literal(text) => out.push_str(&text),
                Fragment::Constant { value, .. } => out.push_str(&value),
                Fragment::Reference { definition, name } => {
                    out.push_str(&resolver(&name).unwrap_or(definition));
                }
            }
        }
        out
    }

    /// Produces a string that, when parsed, yields a `Template` whose
    /// `apply(_)` equals `s` — i.e. escapes every occurrence of the opening
    /// sequence in `s`. Fails when this format has no escaping sequence.
    pub fn constant(&self, s: &str) -> Result<String, UnsupportedOperation> {
        if self.escaping.is_empty() {
            return Err(UnsupportedOperation);
        }
        Ok(s.replace(&self.opening, &format!("{}{}", self.escaping, self.opening)))
    }

    /// `None` when this format has no escaping sequence, else
    /// `Some(self.constant(s))`.
    pub fn reproduction(&self, s: &str) -> Option<String> {
        self.constant(s).ok()
    }

    pub fn has_escaping(&self) -> bool {
        !self.escaping.is_empty()
    }
}

/// Returned by [`InterpolationFormat::constant`] when the format has no
/// escaping sequence configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("format has no escaping sequence; constant() is unsupported")]
pub struct UnsupportedOperation;

struct DollarBrace;
impl DollarBrace {
    const OPENING: &'static str = "${";
    const CLOSING: &'static str = "}";
    const ESCAPING: &'static str = "$";
}
