use tmpl_scan::{Symbol, Token, TokenScanner};

use crate::template::Template;

/// The four events a [`TemplateParser`] can emit from a single call to
/// [`TemplateParser::next`].
pub trait ParserEvents<R> {
    fn literal(&mut self, text: &str) -> R;
    fn constant(&mut self, definition: &str, value: &str) -> R;
    fn reference(&mut self, definition: &str, name: &str) -> R;
    fn none(&mut self) -> R;
}

/// A non-`Sequence` piece of a template, as produced by the streaming
/// adapter ([`TemplateParser`]'s `Iterator` implementation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Literal(String),
    Constant { definition: String, value: String },
    Reference { definition: String, name: String },
}

impl From<Fragment> for Template {
    fn from(fragment: Fragment) -> Self {
        match fragment {
            Fragment::Literal(text) => Template::literal(text),
            Fragment::Constant { definition, value } => Template::constant(definition, value),
            Fragment::Reference { definition, name } => Template::reference(definition, name),
        }
    }
}

struct FragmentEvents;

impl ParserEvents<Option<Fragment>> for FragmentEvents {
    fn literal(&mut self, text: &str) -> Option<Fragment> {
        Some(Fragment::Literal(text.to_string()))
    }

    fn constant(&mut self, definition: &str, value: &str) -> Option<Fragment> {
        Some(Fragment::Constant {
            definition: definition.to_string(),
            value: value.to_string(),
        })
    }

    fn reference(&mut self, definition: &str, name: &str) -> Option<Fragment> {
        Some(Fragment::Reference {
            definition: definition.to_string(),
            name: name.to_string(),
        })
    }

    fn none(&mut self) -> Option<Fragment> {
        None
    }
}

/// A stateful cursor over one input string, walking it one fragment at a
/// time via a caller-supplied [`TokenScanner`].
///
/// Every call to [`next`](TemplateParser::next) emits at most one fragment;
/// together they partition the input exactly.
pub struct TemplateParser<'a> {
    input: &'a str,
    scanner: &'a dyn TokenScanner,
    position: usize,
    /// Cached lookahead: the next symbol found by the scanner (if any),
    /// together with the bounds it occupies. Re-used across calls until
    /// `position` catches up to `done_pos`.
    pending: Option<Token<Symbol>>,
    open: usize,
    done_pos: usize,
    done: bool,
}

impl<'a> TemplateParser<'a> {
    pub fn new(input: &'a str, scanner: &'a dyn TokenScanner) -> Self {
        Self {
            input,
            scanner,
            position: 0,
            pending: None,
            open: 0,
            done_pos: 0,
            done: false,
        }
    }

    pub fn input(&self) -> &str {
        self.input
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn done(&self) -> bool {
        self.done
    }

    /// Streaming adapter: consumes the next fragment as a [`Fragment`]
    /// value rather than driving a [`ParserEvents`] callback. `Sequence`
    /// never appears here since each call yields a single, already-atomic
    /// fragment.
    pub fn next_fragment(&mut self) -> Option<Fragment> {
        self.next(&mut FragmentEvents)
    }

    /// Consumes the next fragment and invokes exactly one method on
    /// `events`, returning its result verbatim.
    pub fn next<R>(&mut self, events: &mut dyn ParserEvents<R>) -> R {
        if self.done {
            return events.none();
        }

        if self.position == self.input.len() {
            self.done = true;
            return if self.input.is_empty() {
                events.literal("")
            } else {
                events.none()
            };
        }

        if self.position == self.done_pos {
            self.pending = self.scanner.find(self.input, self.position);
            match &self.pending {
                Some(token) => {
                    self.open = token.from;
                    self.done_pos = token.to;
                }
                None => {
                    self.open = self.input.len();
                    self.done_pos = self.input.len();
                }
            }
        }

        if self.position == self.open {
            let token = self
                .pending
                .as_ref()
                .expect("open == position only when a pending symbol was found");
            let result = if token.value.is_constant {
                events.constant(&token.value.definition, &token.value.value)
            } else {
                events.reference(&token.value.definition, &token.value.value)
            };
            self.position = self.done_pos;
            result
        } else {
            let text = &self.input[self.position..self.open];
            let result = events.literal(text);
            self.position = self.open;
            result
        }
    }
}

impl<'a> Iterator for TemplateParser<'a> {
    type Item = Fragment;

    fn next(&mut self) -> Option<Fragment> {
        self.next_fragment()
    }
}
