use crate::binding::Binding;
use crate::error::ResolveError;

/// Maps a textual placeholder, plus the enclosing template's context, to an
/// absolute reference the resolver understands.
///
/// `Ok(None)` means "leave this placeholder unresolved" — the referencing
/// fragment keeps its own definition. `Err` aborts the whole top-level
/// resolution and is relayed to the caller unchanged.
pub type Linking<T> = dyn Fn(&str, Option<&T>) -> Result<Option<T>, ResolveError> + Send + Sync;

/// Fetches the parsed template (or constant) bound to a reference.
///
/// `Ok(None)` means the reference has no binding at all; it is treated
/// exactly like an unresolved placeholder.
pub type Lookup<T> = dyn Fn(&T) -> Result<Option<Binding<T>>, ResolveError> + Send + Sync;

/// Supplies a replacement for a vertex that lies on a dependency cycle.
///
/// The third argument looks up the already-resolved value for any
/// reference, if one has been computed yet. `Ok(None)` leaves the vertex
/// itself unresolved: every placeholder that refers to it falls back to its
/// own definition instead.
pub type RecursionFailureHandler<T> = dyn Fn(&T, &Binding<T>, &dyn Fn(&T) -> Option<String>) -> Result<Option<String>, ResolveError>
    + Send
    + Sync;
