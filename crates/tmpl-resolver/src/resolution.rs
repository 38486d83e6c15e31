use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use tmpl_format::Template;

use crate::binding::Binding;
use crate::error::ResolveError;
use crate::types::{Linking, Lookup, RecursionFailureHandler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VertexId(usize);

/// Builds and solves the dependency graph for a single top-level `resolve`
/// call.
///
/// Vertices are stored in an arena (`vertices`, indexed by `VertexId`)
/// rather than addressed by reference identity directly. Lives only for
/// the duration of one call; never shared across threads.
pub(crate) struct Resolution<'a, T> {
    linking: &'a Linking<T>,
    lookup: &'a Lookup<T>,
    on_recursion_failure: &'a RecursionFailureHandler<T>,

    vertices: Vec<Binding<T>>,
    reference_of: Vec<T>,
    vertex_of: HashMap<T, VertexId>,
    incoming: Vec<HashSet<VertexId>>,
    outgoing: Vec<HashSet<VertexId>>,
    pending: HashSet<VertexId>,

    resolved: HashMap<T, String>,
}

impl<'a, T> Resolution<'a, T>
where
    T: Clone + Eq + Hash,
{
    pub(crate) fn new(
        linking: &'a Linking<T>,
        lookup: &'a Lookup<T>,
        on_recursion_failure: &'a RecursionFailureHandler<T>,
    ) -> Self {
        Self {
            linking,
            lookup,
            on_recursion_failure,
            vertices: Vec::new(),
            reference_of: Vec::new(),
            vertex_of: HashMap::new(),
            incoming: Vec::new(),
            outgoing: Vec::new(),
            pending: HashSet::new(),
            resolved: HashMap::new(),
        }
    }

    /// Runs the full algorithm seeded with an already-looked-up root
    /// binding and returns the batch of every reference that was resolved
    /// along the way — the literal short-circuits of Phase A plus the
    /// Phase B/C solve — suitable for a bulk cache merge.
    pub(crate) fn run(
        mut self,
        reference: T,
        binding: Binding<T>,
    ) -> Result<HashMap<T, String>, ResolveError> {
        self.ensure_vertex(reference, Some(binding))?;
        self.solve()?;
        Ok(self.resolved)
    }

    /// Phase A: depth-first, iterative expansion of the dependency graph.
    ///
    /// Returns the vertex id for `reference` if it entered the graph as a
    /// non-terminal vertex, or `None` if it short-circuited: either a
    /// terminal literal projection (stored directly in `resolved`) or a
    /// failed lookup (the reference stays unresolved and uncached here).
    fn ensure_vertex(
        &mut self,
        reference: T,
        preloaded: Option<Binding<T>>,
    ) -> Result<Option<VertexId>, ResolveError> {
        if let Some(&id) = self.vertex_of.get(&reference) {
            return Ok(Some(id));
        }
        if self.resolved.contains_key(&reference) {
            return Ok(None);
        }

        let binding = match preloaded {
            Some(binding) => binding,
            // A reference already in `vertex_of` or `resolved` short-circuits
            // above without calling `lookup` again, so the first binding
            // observed for a reference always wins.
            None => match (self.lookup)(&reference)? {
                Some(binding) => binding,
                None => return Ok(None),
            },
        };

        let names = decompose(&binding.template);
        if names.is_empty() {
            // No placeholders: this vertex's resolution is precisely its
            // literal projection, and it never enters the graph.
            let projection = binding.template.apply(|_| None);
            self.resolved.insert(reference, projection);
            return Ok(None);
        }

        let id = VertexId(self.vertices.len());
        self.vertex_of.insert(reference.clone(), id);
        let context = binding.context.clone();
        self.reference_of.push(reference);
        self.vertices.push(binding);
        self.incoming.push(HashSet::new());
        self.outgoing.push(HashSet::new());
        self.pending.insert(id);

        for name in names {
            let Some(target) = (self.linking)(&name, context.as_ref())? else {
                continue;
            };
            if let Some(target_id) = self.ensure_vertex(target, None)? {
                self.outgoing[target_id.0].insert(id);
                self.incoming[id.0].insert(target_id);
            }
        }

        Ok(Some(id))
    }

    fn solve(&mut self) -> Result<(), ResolveError> {
        self.topological_pass()?;
        if self.pending.is_empty() {
            return Ok(());
        }

        let mut cyclic: Vec<VertexId> = self.cycle_vertices().into_iter().collect();
        cyclic.sort_by_key(|v| v.0);
        for v in cyclic {
            self.resolve_via_cycle_handler(v)?;
        }

        self.topological_pass()?;
        debug_assert!(
            self.pending.is_empty(),
            "cycle handling must break every remaining cycle"
        );
        Ok(())
    }

    /// Phase B: repeatedly resolve every vertex with an empty incoming set,
    /// cutting it out of the graph, until a full scan makes no progress.
    fn topological_pass(&mut self) -> Result<(), ResolveError> {
        loop {
            let ready: Vec<VertexId> = self
                .pending
                .iter()
                .copied()
                .filter(|v| self.incoming[v.0].is_empty())
                .collect();
            if ready.is_empty() {
                break;
            }
            for v in ready {
                self.resolve_vertex(v)?;
            }
        }
        Ok(())
    }

    fn resolve_vertex(&mut self, v: VertexId) -> Result<(), ResolveError> {
        if !self.pending.remove(&v) {
            return Ok(());
        }
        let reference = self.reference_of[v.0].clone();
        let context = self.vertices[v.0].context.clone();

        let mut first_err: Option<ResolveError> = None;
        let value = {
            let linking = self.linking;
            let resolved = &self.resolved;
            let template = &self.vertices[v.0].template;
            template.apply(|name| {
                if first_err.is_some() {
                    return None;
                }
                match linking(name, context.as_ref()) {
                    Ok(Some(target)) => resolved.get(&target).cloned(),
                    Ok(None) => None,
                    Err(err) => {
                        first_err = Some(err);
                        None
                    }
                }
            })
        };
        if let Some(err) = first_err {
            return Err(err);
        }

        self.resolved.insert(reference, value);
        self.cut(v);
        Ok(())
    }

    /// Phase C, per-vertex: route a cycle member through the caller's
    /// failure handler. `Ok(None)` leaves the vertex unresolved — no entry
    /// is stored, so every placeholder referencing it later falls back to
    /// its own definition instead of this vertex's.
    fn resolve_via_cycle_handler(&mut self, v: VertexId) -> Result<(), ResolveError> {
        if !self.pending.remove(&v) {
            return Ok(());
        }
        let reference = self.reference_of[v.0].clone();
        let binding = self.vertices[v.0].clone();

        let outcome = {
            let resolved = &self.resolved;
            let lookup_resolved = |t: &T| resolved.get(t).cloned();
            (self.on_recursion_failure)(&reference, &binding, &lookup_resolved)?
        };
        if let Some(value) = outcome {
            self.resolved.insert(reference, value);
        }

        self.cut(v);
        Ok(())
    }

    fn cut(&mut self, v: VertexId) {
        let dependents: Vec<VertexId> = self.outgoing[v.0].drain().collect();
        for dependent in dependents {
            self.incoming[dependent.0].remove(&v);
        }
    }

    /// Phase C, graph-wide: DFS over the remaining `incoming` edges,
    /// tracking the current path and each vertex's depth on it. A vertex
    /// revisited while still on the path marks every vertex from its first
    /// occurrence onward as lying on a cycle.
    fn cycle_vertices(&self) -> HashSet<VertexId> {
        let mut visited = vec![false; self.vertices.len()];
        let mut on_cycle = HashSet::new();
        let mut path = Vec::new();
        let mut path_index = HashMap::new();

        let mut order: Vec<VertexId> = self.pending.iter().copied().collect();
        order.sort_by_key(|v| v.0);
        for v in order {
            self.visit(v, &mut visited, &mut path, &mut path_index, &mut on_cycle);
        }
        on_cycle
    }

    fn visit(
        &self,
        v: VertexId,
        visited: &mut [bool],
        path: &mut Vec<VertexId>,
        path_index: &mut HashMap<VertexId, usize>,
        on_cycle: &mut HashSet<VertexId>,
    ) {
        if !self.pending.contains(&v) || visited[v.0] {
            return;
        }
        if let Some(&depth) = path_index.get(&v) {
            for &member in &path[depth..] {
                on_cycle.insert(member);
            }
            return;
        }

        path_index.insert(v, path.len());
        path.push(v);

        let mut dependencies: Vec<VertexId> = self.incoming[v.0].iter().copied().collect();
        dependencies.sort_by_key(|d| d.0);
        for dep in dependencies {
            self.visit(dep, visited, path, path_index, on_cycle);
        }

        path.pop();
        path_index.remove(&v);
        visited[v.0] = true;
    }
}

/// Decomposes a template by applying it with a resolver that records every
/// placeholder name it's asked about (in first-seen order) and always
/// answers `None`. The returned string (discarded here) is the template's
/// literal projection; the recorded names are what the caller needs to
/// expand the dependency graph.
fn decompose(template: &Template) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();
    template.apply(|name| {
        if seen.insert(name.to_string()) {
            order.push(name.to_string());
        }
        None
    });
    order
}
