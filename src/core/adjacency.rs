//! Opt-in CSR adjacency matrix over mesh vertices.
//!
//! The mesh does not keep a persistent adjacency cache; downstream code
//! (bandwidth-reducing renumbering, FEM assembly) builds an
//! [`AdjacencyMatrix`] on demand from the current mesh snapshot. The matrix
//! is immutable once built.
//!
//! Layout is compressed sparse column: `column_pointers[j]..column_pointers
//! [j + 1]` indexes the sorted `row_indices` adjacent to node `j`. The
//! diagonal is included, so the entry count is `2 * edges + nodes`.

use crate::core::collections::FastHashSet;
use crate::core::mesh::Mesh;
use crate::core::vertex::VertexId;

/// Immutable vertex-adjacency structure in CSR form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdjacencyMatrix {
    node_count: usize,
    column_pointers: Vec<usize>,
    row_indices: Vec<usize>,
    /// Maps dense node index back to the mesh vertex id.
    node_to_vertex: Vec<VertexId>,
}

impl AdjacencyMatrix {
    /// Builds the adjacency matrix of the mesh's live vertices.
    ///
    /// Nodes are numbered densely in vertex-id order, independent of any
    /// `Mesh::renumber` call.
    #[must_use]
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let mut node_of_vertex = vec![usize::MAX; mesh.vertices().len()];
        let mut node_to_vertex = Vec::new();
        for (vid, vertex) in mesh.vertices().iter().enumerate() {
            if vertex.is_live() {
                node_of_vertex[vid] = node_to_vertex.len();
                node_to_vertex.push(vid);
            }
        }
        let node_count = node_to_vertex.len();

        let mut neighbor_sets: Vec<FastHashSet<usize>> = vec![FastHashSet::default(); node_count];
        for (node, set) in neighbor_sets.iter_mut().enumerate() {
            set.insert(node);
        }
        for ((a, b), _) in mesh.edge_map() {
            let na = node_of_vertex[a];
            let nb = node_of_vertex[b];
            neighbor_sets[na].insert(nb);
            neighbor_sets[nb].insert(na);
        }

        let mut column_pointers = Vec::with_capacity(node_count + 1);
        let mut row_indices = Vec::new();
        column_pointers.push(0);
        for set in &neighbor_sets {
            let mut rows: Vec<usize> = set.iter().copied().collect();
            rows.sort_unstable();
            row_indices.extend_from_slice(&rows);
            column_pointers.push(row_indices.len());
        }

        Self {
            node_count,
            column_pointers,
            row_indices,
            node_to_vertex,
        }
    }

    /// Number of nodes (live vertices).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Column pointer array, length `node_count + 1`.
    #[must_use]
    pub fn column_pointers(&self) -> &[usize] {
        &self.column_pointers
    }

    /// Concatenated sorted row indices.
    #[must_use]
    pub fn row_indices(&self) -> &[usize] {
        &self.row_indices
    }

    /// Mesh vertex id of a dense node index.
    #[must_use]
    pub fn vertex_of_node(&self, node: usize) -> VertexId {
        self.node_to_vertex[node]
    }

    /// Sorted neighbor row indices of `node` (diagonal included).
    #[must_use]
    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.row_indices[self.column_pointers[node]..self.column_pointers[node + 1]]
    }

    /// Matrix bandwidth: the largest `|i - j|` over all entries.
    #[must_use]
    pub fn bandwidth(&self) -> usize {
        let mut bandwidth = 0;
        for node in 0..self.node_count {
            for &row in self.neighbors(node) {
                bandwidth = bandwidth.max(row.abs_diff(node));
            }
        }
        bandwidth
    }
}
