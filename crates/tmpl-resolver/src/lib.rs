//! Recursive, cycle-safe resolution of interdependent string templates.
//!
//! A [`RecursiveResolver`] wraps a [`Linking`] function and a [`Lookup`]
//! function: applying it to a reference builds a private dependency graph
//! over the templates that reference transitively refers to, resolves
//! every non-cyclic dependency topologically even when cycles exist
//! elsewhere, routes cycle members through a caller-supplied
//! [`RecursionFailureHandler`], and optionally caches the whole batch in a
//! thread-safe, negative-caching-aware cache. [`Source`] composes the
//! common "constants, then templates, then fallback" lookup shape.

mod binding;
mod cache;
mod error;
mod resolution;
mod resolver;
mod source;
mod types;

pub use binding::Binding;
pub use error::{ResolveError, UnsupportedOperation};
pub use resolver::{RecursiveResolver, RecursiveResolverBuilder};
pub use source::{Source, SourceBuilder};
pub use types::{Linking, Lookup, RecursionFailureHandler};

pub use tmpl_format::{InterpolationFormat, Template, TemplateSyntaxError};
