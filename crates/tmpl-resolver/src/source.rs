use tmpl_format::{InterpolationFormat, Template, TemplateSyntaxError};

use crate::binding::Binding;

type ParsingFailureHandler<T> = dyn Fn(&T, &str, &TemplateSyntaxError) -> Option<String> + Send + Sync;

/// Composes `constants`, `templates`, and `fallback` lookup functions into a
/// single [`Binding`] producer.
///
/// Template strings are parsed with a caller-supplied parse function —
/// ordinarily [`InterpolationFormat::parse`] wrapped to be infallible (it is
/// total, so `on_parsing_failure` never actually fires for it), but a
/// custom, possibly-fallible parser can be plugged in via
/// [`SourceBuilder::parser`] for formats that impose extra constraints.
pub struct Source<T> {
    constants: Box<dyn Fn(&T) -> Option<String> + Send + Sync>,
    templates: Box<dyn Fn(&T) -> Option<String> + Send + Sync>,
    fallback: Box<dyn Fn(&T) -> Option<String> + Send + Sync>,
    parse: Box<dyn Fn(&str) -> Result<Template, TemplateSyntaxError> + Send + Sync>,
    on_parsing_failure: Box<ParsingFailureHandler<T>>,
}

impl<T> Source<T>
where
    T: Clone,
{
    pub fn builder() -> SourceBuilder<T>
    where
        T: 'static,
    {
        SourceBuilder::new()
    }

    /// The derived `Lookup` for `reference`: constants first, then parsed
    /// templates (falling through to the parsing-failure handler, then
    /// further through on its own `None`), then the fallback.
    pub fn lookup(&self, reference: &T) -> Option<Binding<T>> {
        if let Some(value) = (self.constants)(reference) {
            return Some(Binding::new(Template::literal(value), Some(reference.clone())));
        }
        if let Some(definition) = (self.templates)(reference) {
            match (self.parse)(&definition) {
                Ok(template) => return Some(Binding::new(template, Some(reference.clone()))),
                Err(err) => {
                    if let Some(value) = (self.on_parsing_failure)(reference, &definition, &err) {
                        return Some(Binding::new(Template::literal(value), Some(reference.clone())));
                    }
                }
            }
        }
        if let Some(value) = (self.fallback)(reference) {
            return Some(Binding::new(Template::literal(value), Some(reference.clone())));
        }
        None
    }
}

/// Builds a [`Source`]. `constants`/`templates`/`fallback` default to
/// always-`None`; the parser defaults to [`InterpolationFormat::standard`]
/// wrapped to never fail; `on_parsing_failure` defaults to always-`None`
/// (fall through to `fallback`).
pub struct SourceBuilder<T> {
    constants: Box<dyn Fn(&T) -> Option<String> + Send + Sync>,
    templates: Box<dyn Fn(&T) -> Option<String> + Send + Sync>,
    fallback: Box<dyn Fn(&T) -> Option<String> + Send + Sync>,
    parse: Box<dyn Fn(&str) -> Result<Template, TemplateSyntaxError> + Send + Sync>,
    on_parsing_failure: Box<ParsingFailureHandler<T>>,
}

impl<T> SourceBuilder<T>
where
    T: 'static,
{
    pub fn new() -> Self {
        let format = InterpolationFormat::standard();
        Self {
            constants: Box::new(|_| None),
            templates: Box::new(|_| None),
            fallback: Box::new(|_| None),
            parse: Box::new(move |s| Ok(format.parse(s))),
            on_parsing_failure: Box::new(|_, _, _| None),
        }
    }

    pub fn constants(mut self, f: impl Fn(&T) -> Option<String> + Send + Sync + 'static) -> Self {
        self.constants = Box::new(f);
        self
    }

    pub fn templates(mut self, f: impl Fn(&T) -> Option<String> + Send + Sync + 'static) -> Self {
        self.templates = Box::new(f);
        self
    }

    pub fn fallback(mut self, f: impl Fn(&T) -> Option<String> + Send + Sync + 'static) -> Self {
        self.fallback = Box::new(f);
        self
    }

    /// Parses template strings with `format`. `format.parse` is total, so
    /// `on_parsing_failure` never fires when this constructor is used.
    pub fn format(mut self, format: InterpolationFormat) -> Self {
        self.parse = Box::new(move |s| Ok(format.parse(s)));
        self
    }

    /// Parses template strings with a custom, possibly-fallible parser.
    pub fn parser(
        mut self,
        f: impl Fn(&str) -> Result<Template, TemplateSyntaxError> + Send + Sync + 'static,
    ) -> Self {
        self.parse = Box::new(f);
        self
    }

    pub fn on_parsing_failure(
        mut self,
        f: impl Fn(&T, &str, &TemplateSyntaxError) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.on_parsing_failure = Box::new(f);
        self
    }

    pub fn build(self) -> Source<T> {
        Source {
            constants: self.constants,
            templates: self.templates,
            fallback: self.fallback,
            parse: self.parse,
            on_parsing_failure: self.on_parsing_failure,
        }
    }
}

impl<T> Default for SourceBuilder<T>
where
    T: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
