//! Template parsing and interpolation-format configuration.
//!
//! An [`InterpolationFormat`] is constructed with an opening, a closing (or
//! closing predicate), and an escaping sequence; it owns a
//! [`tmpl_scan::TokenScanner`] and produces [`TemplateParser`]s and
//! [`Template`] trees from input strings. The bundled parser is total: every
//! input is a valid template, so parsing never fails.

mod error;
mod format;
mod parser;
mod template;

pub use error::TemplateSyntaxError;
pub use format::{ConstructionError, InterpolationFormat, UnsupportedOperation};
pub use parser::{Fragment, ParserEvents, TemplateParser};
pub use template::Template;

pub use tmpl_scan::{Closing, Symbol, Token, TokenScanner};
