/// A parsed fragment tree: `Literal | Constant | Reference | Sequence`.
///
/// Immutable after construction; equality is structural. `definition()`
/// reconstructs a string that, reparsed by the same format, yields a
/// structurally equivalent template — the round-trip law.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    /// Source form equals resolved value.
    Literal(String),
    /// Source form differs from its value (e.g. an escape sequence).
    Constant { definition: String, value: String },
    /// An unresolved placeholder; resolved against a caller-supplied
    /// function at `apply` time.
    Reference { definition: String, name: String },
    /// A flat run of fragments. Never contains a nested `Sequence`; always
    /// constructed in canonical form via [`Template::sequence`].
    Sequence(Vec<Template>),
}

impl Template {
    pub fn literal(text: impl Into<String>) -> Self {
        Template::Literal(text.into())
    }

    pub fn constant(definition: impl Into<String>, value: impl Into<String>) -> Self {
        Template::Constant {
            definition: definition.into(),
            value: value.into(),
        }
    }

    pub fn reference(definition: impl Into<String>, name: impl Into<String>) -> Self {
        Template::Reference {
            definition: definition.into(),
            name: name.into(),
        }
    }

    /// Builds a canonical sequence: zero fragments collapse to an empty
    /// literal, a single fragment is returned unwrapped, and any nested
    /// `Sequence` fragments are flattened rather than nested.
    pub fn sequence(fragments: impl IntoIterator<Item = Template>) -> Self {
        let mut flat = Vec::new();
        for fragment in fragments {
            match fragment {
                Template::Sequence(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Template::Literal(String::new()),
            1 => flat.into_iter().next().expect("length checked above"),
            _ => Template::Sequence(flat),
        }
    }

    /// Resolves this template against a caller-supplied function.
    ///
    /// - `Literal(t) -> t`
    /// - `Constant(_, v) -> v`
    /// - `Reference(d, n) -> resolver(n).unwrap_or(d)`
    /// - `Sequence(fs) -> concat(fs.apply(resolver))`
    pub fn apply<F>(&self, mut resolver: F) -> String
    where
        F: FnMut(&str) -> Option<String>,
    {
        self.apply_dyn(&mut resolver)
    }

    fn apply_dyn(&self, resolver: &mut dyn FnMut(&str) -> Option<String>) -> String {
        match self {
            Template::Literal(text) => text.clone(),
            Template::Constant { value, .. } => value.clone(),
            Template::Reference { definition, name } => {
                resolver(name).unwrap_or_else(|| definition.clone())
            }
            Template::Sequence(fragments) => {
                fragments.iter().map(|f| f.apply_dyn(resolver)).collect()
            }
        }
    }

    /// The concatenation of the input substrings that produced each
    /// fragment; `format.parse(input).definition() == input` always holds.
    pub fn definition(&self) -> String {
        match self {
            Template::Literal(text) => text.clone(),
            Template::Constant { definition, .. } => definition.clone(),
            Template::Reference { definition, .. } => definition.clone(),
            Template::Sequence(fragments) => fragments.iter().map(Template::definition).collect(),
        }
    }
}
