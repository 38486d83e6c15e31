use tmpl_format::Template;

/// A parsed template together with the context it was looked up in — the
/// vertex payload of the resolver's dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding<T> {
    pub template: Template,
    pub context: Option<T>,
}

impl<T> Binding<T> {
    pub fn new(template: Template, context: Option<T>) -> Self {
        Self { template, context }
    }

    /// A binding with no enclosing context, e.g. a fresh top-level lookup.
    pub fn rootless(template: Template) -> Self {
        Self {
            template,
            context: None,
        }
    }
}
