use thiserror::Error;

/// Raised only by callback implementations that choose to impose extra
/// constraints while consuming [`crate::TemplateParser::next`]. The bundled
/// [`crate::InterpolationFormat`] is total and never constructs one itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TemplateSyntaxError {
    #[error("{0}")]
    Custom(String),
}

impl TemplateSyntaxError {
    pub fn custom(message: impl Into<String>) -> Self {
        TemplateSyntaxError::Custom(message.into())
    }
}
