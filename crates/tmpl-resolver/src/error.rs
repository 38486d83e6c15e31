use thiserror::Error;

pub use tmpl_format::UnsupportedOperation;

/// Raised by caller-supplied `Linking`, `Lookup`, or
/// `RecursionFailureHandler` closures when they choose to abort a
/// resolution rather than leave a placeholder unresolved. Relayed to the
/// top-level caller unchanged; the resolver itself never constructs one.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{0}")]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl ResolveError {
    pub fn custom(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        ResolveError::Custom(Box::new(err))
    }
}
