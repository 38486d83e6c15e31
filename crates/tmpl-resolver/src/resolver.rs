use std::hash::Hash;
use std::sync::Arc;

use crate::binding::Binding;
use crate::cache::Cache;
use crate::error::ResolveError;
use crate::resolution::Resolution;
use crate::source::Source;
use crate::types::{Linking, Lookup, RecursionFailureHandler};

/// Recursively resolves placeholders whose values are themselves templates
/// that may contain further placeholders.
///
/// Applying [`Self::resolve`] to a reference builds a private dependency
/// graph over the templates it transitively refers to, resolves every
/// non-cyclic dependency topologically even when cycles exist elsewhere,
/// routes cycle members through a caller-supplied
/// [`RecursionFailureHandler`], and optionally caches the whole batch.
///
/// Thread-safe to call concurrently if `linking`, `lookup`, and
/// `on_recursion_failure` are themselves thread-safe and return stable
/// results for equal inputs. The per-call dependency graph is never shared
/// across threads.
pub struct RecursiveResolver<T> {
    linking: Box<Linking<T>>,
    lookup: Box<Lookup<T>>,
    on_recursion_failure: Box<RecursionFailureHandler<T>>,
    cache: Option<Cache<T>>,
}

impl<T> RecursiveResolver<T>
where
    T: Clone + Eq + Hash,
{
    pub fn builder() -> RecursiveResolverBuilder<T>
    where
        T: Send + Sync + 'static,
    {
        RecursiveResolverBuilder::new()
    }

    /// `resolve(reference)`: an absent reference or a failed lookup yield
    /// `None`; a cache hit (positive or negative) short-circuits the graph
    /// build entirely.
    pub fn resolve(&self, reference: Option<T>) -> Result<Option<String>, ResolveError> {
        let Some(reference) = reference else {
            return Ok(None);
        };

        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(&reference) {
                return Ok(cached);
            }
        }

        let binding = match (self.lookup)(&reference)? {
            Some(binding) => binding,
            None => {
                if let Some(cache) = &self.cache {
                    cache.merge([(reference, None)]);
                }
                return Ok(None);
            }
        };

        let resolution = Resolution::new(&*self.linking, &*self.lookup, &*self.on_recursion_failure);
        let resolved = resolution.run(reference.clone(), binding)?;
        let result = resolved.get(&reference).cloned();

        if let Some(cache) = &self.cache {
            let mut batch: Vec<(T, Option<String>)> =
                resolved.into_iter().map(|(k, v)| (k, Some(v))).collect();
            if result.is_none() {
                batch.push((reference, None));
            }
            cache.merge(batch);
        }

        Ok(result)
    }

    /// The cached result for `reference`, if caching is enabled and this
    /// reference has been resolved before. `Some(None)` is a negative cache
    /// hit; `None` means "not cached".
    pub fn cached(&self, reference: &T) -> Option<Option<String>> {
        self.cache.as_ref().and_then(|cache| cache.get(reference))
    }

    /// Number of entries currently held in the cache (`0` if caching is
    /// disabled).
    pub fn cache_len(&self) -> usize {
        self.cache.as_ref().map_or(0, Cache::len)
    }
}

/// Builds a [`RecursiveResolver`]. `caching` defaults to `false`;
/// `on_recursion_failure` defaults to always returning `Ok(None)` — keep
/// the referencing fragment's own definition.
pub struct RecursiveResolverBuilder<T> {
    caching: bool,
    on_recursion_failure: Option<Box<RecursionFailureHandler<T>>>,
}

impl<T> RecursiveResolverBuilder<T>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            caching: false,
            on_recursion_failure: None,
        }
    }

    pub fn caching(mut self, enabled: bool) -> Self {
        self.caching = enabled;
        self
    }

    pub fn on_recursion_failure(
        mut self,
        handler: impl Fn(&T, &Binding<T>, &dyn Fn(&T) -> Option<String>) -> Result<Option<String>, ResolveError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.on_recursion_failure = Some(Box::new(handler));
        self
    }

    /// Builds the resolver from explicit `linking` and `lookup` functions.
    pub fn build(
        self,
        linking: impl Fn(&str, Option<&T>) -> Result<Option<T>, ResolveError> + Send + Sync + 'static,
        lookup: impl Fn(&T) -> Result<Option<Binding<T>>, ResolveError> + Send + Sync + 'static,
    ) -> RecursiveResolver<T> {
        RecursiveResolver {
            linking: Box::new(linking),
            lookup: Box::new(lookup),
            on_recursion_failure: self
                .on_recursion_failure
                .unwrap_or_else(|| Box::new(|_, _, _| Ok(None))),
            cache: self.caching.then(Cache::new),
        }
    }

    /// Convenience: builds the resolver using a [`Source`] as the lookup
    /// function, wrapped to the fallible `Lookup` shape `Source::lookup`
    /// itself doesn't need.
    pub fn build_with_source(
        self,
        linking: impl Fn(&str, Option<&T>) -> Result<Option<T>, ResolveError> + Send + Sync + 'static,
        source: Arc<Source<T>>,
    ) -> RecursiveResolver<T> {
        self.build(linking, move |reference: &T| Ok(source.lookup(reference)))
    }
}

impl<T> Default for RecursiveResolverBuilder<T>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tmpl_format::{InterpolationFormat, Template};

    fn resolver_over(
        map: HashMap<&'static str, &'static str>,
    ) -> RecursiveResolver<String> {
        let format = InterpolationFormat::standard();
        let map: HashMap<String, String> = map
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RecursiveResolverBuilder::new().build(
            |name, _ctx| Ok(Some(name.to_string())),
            move |reference: &String| {
                Ok(map
                    .get(reference)
                    .map(|text| Binding::rootless(format.parse(text))))
            },
        )
    }

    #[test]
    fn scenario_recursive_url_assembly() {
        let resolver = resolver_over(HashMap::from([
            ("host", "localhost"),
            ("port", "443"),
            ("path", "/index.html"),
            ("protocol", "https"),
            ("url", "${protocol}://${host}:${port}${path}"),
        ]));
        let result = resolver.resolve(Some("url".to_string())).unwrap();
        assert_eq!(result.as_deref(), Some("https://localhost:443/index.html"));
    }

    #[test]
    fn scenario_cycle_isolation_default_handler() {
        let resolver = resolver_over(HashMap::from([
            ("A", "${B}"),
            ("B", "${A}"),
            ("C", "${A} and ${D}"),
            ("D", "done"),
        ]));
        let result = resolver.resolve(Some("C".to_string())).unwrap();
        assert_eq!(result.as_deref(), Some("${A} and done"));
    }

    #[test]
    fn scenario_cycle_isolation_custom_handler() {
        let format = InterpolationFormat::standard();
        let map: HashMap<String, String> = HashMap::from([
            ("A".to_string(), "${B}".to_string()),
            ("B".to_string(), "${A}".to_string()),
            ("C".to_string(), "${A} and ${D}".to_string()),
            ("D".to_string(), "done".to_string()),
        ]);
        let resolver = RecursiveResolverBuilder::new()
            .on_recursion_failure(|reference: &String, _binding, _resolved| {
                Ok(Some(format!("#{reference}!")))
            })
            .build(
                |name, _ctx| Ok(Some(name.to_string())),
                move |reference: &String| {
                    Ok(map
                        .get(reference)
                        .map(|text| Binding::rootless(format.parse(text))))
                },
            );
        let result = resolver.resolve(Some("C".to_string())).unwrap();
        assert_eq!(result.as_deref(), Some("#A! and done"));
    }

    #[test]
    fn unresolved_placeholder_preserves_definition() {
        let resolver = resolver_over(HashMap::from([("greeting", "And ${meal}?")]));
        let result = resolver.resolve(Some("greeting".to_string())).unwrap();
        assert_eq!(result.as_deref(), Some("And ${meal}?"));
    }

    #[test]
    fn missing_reference_resolves_to_none() {
        let resolver = resolver_over(HashMap::new());
        assert_eq!(resolver.resolve(Some("anything".to_string())).unwrap(), None);
    }

    #[test]
    fn absent_reference_is_none_without_any_lookup() {
        let resolver: RecursiveResolver<String> = RecursiveResolverBuilder::new().build(
            |_, _| Ok(Some("unused".to_string())),
            |_: &String| panic!("lookup must not be called for an absent reference"),
        );
        assert_eq!(resolver.resolve(None).unwrap(), None);
    }

    #[test]
    fn caching_is_idempotent_including_negative_entries() {
        let format = InterpolationFormat::standard();
        let map: HashMap<String, String> =
            HashMap::from([("name".to_string(), "Kitty".to_string())]);
        let resolver = RecursiveResolverBuilder::new().caching(true).build(
            |name, _ctx| Ok(Some(name.to_string())),
            move |reference: &String| {
                Ok(map
                    .get(reference)
                    .map(|text| Binding::rootless(format.parse(text))))
            },
        );

        let first = resolver.resolve(Some("name".to_string())).unwrap();
        let second = resolver.resolve(Some("name".to_string())).unwrap();
        assert_eq!(first, second);
        assert_eq!(resolver.cached(&"name".to_string()), Some(first));

        let missing_first = resolver.resolve(Some("missing".to_string())).unwrap();
        let missing_second = resolver.resolve(Some("missing".to_string())).unwrap();
        assert_eq!(missing_first, None);
        assert_eq!(missing_second, None);
        assert_eq!(resolver.cached(&"missing".to_string()), Some(None));
    }

    #[test]
    fn custom_error_propagates_from_lookup() {
        #[derive(Debug)]
        struct Boom;
        impl std::fmt::Display for Boom {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "boom")
            }
        }
        impl std::error::Error for Boom {}

        let resolver: RecursiveResolver<String> = RecursiveResolverBuilder::new()
            .build(|_, _| Ok(Some("x".to_string())), |_: &String| Err(ResolveError::custom(Boom)));
        let err = resolver.resolve(Some("x".to_string())).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn non_cyclic_dependency_resolves_even_when_a_disjoint_cycle_exists() {
        let resolver = resolver_over(HashMap::from([
            ("A", "${B}"),
            ("B", "${A}"),
            ("plain", "just ${name}"),
            ("name", "Ada"),
        ]));
        let result = resolver.resolve(Some("plain".to_string())).unwrap();
        assert_eq!(result.as_deref(), Some("just Ada"));
    }
}
