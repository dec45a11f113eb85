// src/resolver/graph.rs

//! Directed graph primitive and topological sort
//!
//! Two shapes are exposed: an explicit `Graph` that records vertices and
//! edges as they are inserted, and a provider-parameterized
//! `topological_sort` that walks the transitive closure of a seed set,
//! loading vertex data on demand.
//!
//! The sort emits DFS post-order: for every edge `u -> v`, `v` precedes `u`
//! in the result. Whether that means "dependencies first" or "dependents
//! first" is decided by how the caller orients its edges, not by the sort.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use crate::error::{Error, Result};

/// Supplies vertex data and adjacency for the on-demand topological sort
pub trait AdjacencyProvider<K, V> {
    /// Keys adjacent to a loaded vertex
    fn adjacency_list(&self, data: &V) -> Vec<K>;

    /// Load the data for a key; failures abort the whole sort
    fn load_vertex_data(&self, key: &K) -> Result<V>;

    /// Human-readable name for a key, used in cycle diagnostics
    fn key_name(&self, key: &K) -> String;
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ExplorationStatus {
    InProgress,
    Fully,
}

/// Topologically sort the transitive closure of `seeds`
///
/// Duplicate keys in the closure are visited once. A cycle fails the sort
/// with a diagnostic naming one vertex on the cycle.
pub fn topological_sort<K, V, P>(seeds: Vec<K>, provider: &P) -> Result<Vec<V>>
where
    K: Eq + Hash + Clone,
    P: AdjacencyProvider<K, V>,
{
    let mut status: HashMap<K, ExplorationStatus> = HashMap::new();
    let mut sorted = Vec::new();
    for key in seeds {
        visit(&key, provider, &mut status, &mut sorted)?;
    }
    Ok(sorted)
}

fn visit<K, V, P>(
    key: &K,
    provider: &P,
    status: &mut HashMap<K, ExplorationStatus>,
    sorted: &mut Vec<V>,
) -> Result<()>
where
    K: Eq + Hash + Clone,
    P: AdjacencyProvider<K, V>,
{
    match status.get(key) {
        Some(ExplorationStatus::Fully) => return Ok(()),
        Some(ExplorationStatus::InProgress) => {
            return Err(Error::CircularDependency(provider.key_name(key)));
        }
        None => {}
    }
    status.insert(key.clone(), ExplorationStatus::InProgress);

    let data = provider.load_vertex_data(key)?;
    for adjacent in provider.adjacency_list(&data) {
        visit(&adjacent, provider, status, sorted)?;
    }

    status.insert(key.clone(), ExplorationStatus::Fully);
    sorted.push(data);
    Ok(())
}

/// An explicit directed graph with insertion-ordered vertices
#[derive(Debug, Clone)]
pub struct Graph<V> {
    vertices: Vec<V>,
    seen: HashSet<V>,
    adjacency: HashMap<V, Vec<V>>,
}

impl<V: Eq + Hash + Clone> Graph<V> {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            seen: HashSet::new(),
            adjacency: HashMap::new(),
        }
    }

    /// Register a vertex; re-registration is a no-op
    pub fn add_vertex(&mut self, v: V) {
        if self.seen.insert(v.clone()) {
            self.vertices.push(v);
        }
    }

    /// Add the edge `u -> v`, registering both endpoints; duplicate edges
    /// are suppressed
    pub fn add_edge(&mut self, u: V, v: V) {
        self.add_vertex(u.clone());
        self.add_vertex(v.clone());
        let list = self.adjacency.entry(u).or_default();
        if !list.contains(&v) {
            list.push(v);
        }
    }

    /// Vertices in first-insertion order
    pub fn vertex_list(&self) -> Vec<V> {
        self.vertices.clone()
    }

    /// Outgoing edges of a vertex
    pub fn adjacency(&self, v: &V) -> &[V] {
        self.adjacency.get(v).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl<V: Eq + Hash + Clone> Default for Graph<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Eq + Hash + Clone + fmt::Display> Graph<V> {
    /// Topologically sort this graph over its own vertex list
    pub fn topological_sort(&self) -> Result<Vec<V>> {
        struct SelfProvider<'g, V>(&'g Graph<V>);

        impl<V: Eq + Hash + Clone + fmt::Display> AdjacencyProvider<V, V> for SelfProvider<'_, V> {
            fn adjacency_list(&self, data: &V) -> Vec<V> {
                self.0.adjacency(data).to_vec()
            }

            fn load_vertex_data(&self, key: &V) -> Result<V> {
                Ok(key.clone())
            }

            fn key_name(&self, key: &V) -> String {
                key.to_string()
            }
        }

        topological_sort(self.vertex_list(), &SelfProvider(self))
    }
}
