//! Immutable weighted undirected graph with its algebraic matrix views.
//!
//! A [`Graph`] owns an edge list and a parallel weight list and derives five
//! sparse matrices from them in a single pass at construction time:
//!
//! | View        | Shape   | Entries                                        |
//! |-------------|---------|------------------------------------------------|
//! | adjacency   | `n x n` | `A[r,c] = A[c,r] += w` per edge `(r,c)`        |
//! | degree      | `n x n` | `D[i,i] = sum of weights touching i`           |
//! | laplacian   | `n x n` | `L = D - A`                                    |
//! | incidence   | `m x n` | `B[i,r] = +1`, `B[i,c] = -1` (zero row if `r == c`) |
//! | weight      | `m x m` | `W[i,i] = w_i`                                 |
//!
//! Nothing is recomputed or mutated afterwards, so a graph can be wrapped in
//! an [`Arc`](std::sync::Arc) and read concurrently by any number of
//! consumers.

use tracing::debug;

use crate::error::Result;
use crate::traits::GraphReader;
use crate::types::CsrMatrix;
use crate::validation::{validate_edge_rows, validate_graph_input};

/// Raw edge data produced by a [`GraphReader`].
///
/// `edge_rows` keeps the tabular shape of the source so that rows with the
/// wrong number of columns are caught by graph construction. Missing weights
/// default to 1 for every edge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphData {
    /// One row per edge; each row must hold exactly two node indices.
    pub edge_rows: Vec<Vec<usize>>,
    /// Optional weight per edge.
    pub weights: Option<Vec<f64>>,
}

/// Weighted undirected graph.
#[derive(Debug)]
pub struct Graph {
    edges: Vec<(usize, usize)>,
    weights: Vec<f64>,
    node_count: usize,
    adjacency: CsrMatrix<f64>,
    degree: CsrMatrix<f64>,
    incidence: CsrMatrix<f64>,
    weight_matrix: CsrMatrix<f64>,
    laplacian: CsrMatrix<f64>,
}

impl Graph {
    /// Build a graph from endpoint pairs and a parallel weight list.
    ///
    /// # Errors
    ///
    /// Returns [`SparsifierError::InvalidArgument`](crate::error::SparsifierError)
    /// if the lists differ in length or any weight is not finite and `> 0`.
    ///
    /// # Example
    ///
    /// ```
    /// use ruvector_sparsifier::graph::Graph;
    ///
    /// let g = Graph::new(vec![(0, 1), (1, 2)], vec![1.0, 2.0]).unwrap();
    /// assert_eq!(g.node_count(), 3);
    /// assert_eq!(g.laplacian().get(1, 1), 3.0);
    /// ```
    pub fn new(edges: Vec<(usize, usize)>, weights: Vec<f64>) -> Result<Self> {
        let node_count = validate_graph_input(&edges, &weights)?;
        Ok(Self::assemble(edges, weights, node_count))
    }

    /// Build a graph where every edge has weight 1.
    pub fn unweighted(edges: Vec<(usize, usize)>) -> Result<Self> {
        let weights = vec![1.0; edges.len()];
        Self::new(edges, weights)
    }

    /// Build a graph from tabular rows of node indices.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidArgument` if a row does not have exactly two
    /// columns, plus every error of [`Graph::new`].
    pub fn from_edge_rows(rows: &[Vec<usize>], weights: Vec<f64>) -> Result<Self> {
        let edges = validate_edge_rows(rows)?;
        Self::new(edges, weights)
    }

    /// Build a graph from an external reader.
    ///
    /// I/O failures are propagated unchanged as
    /// [`SparsifierError::Io`](crate::error::SparsifierError::Io).
    pub fn from_reader<R: GraphReader + ?Sized>(reader: &mut R) -> Result<Self> {
        let data = reader.read()?;
        let weights = data
            .weights
            .unwrap_or_else(|| vec![1.0; data.edge_rows.len()]);
        Self::from_edge_rows(&data.edge_rows, weights)
    }

    /// Derive every matrix view in one pass over the edge list.
    fn assemble(edges: Vec<(usize, usize)>, weights: Vec<f64>, node_count: usize) -> Self {
        let n = node_count;
        let m = edges.len();

        let mut adjacency_entries = Vec::with_capacity(2 * m);
        let mut incidence_entries = Vec::with_capacity(2 * m);
        let mut weight_entries = Vec::with_capacity(m);
        let mut degree = vec![0.0f64; n];

        for (i, (&(r, c), &w)) in edges.iter().zip(weights.iter()).enumerate() {
            adjacency_entries.push((r, c, w));
            adjacency_entries.push((c, r, w));

            degree[r] += w;
            degree[c] += w;

            // Self-loops contribute nothing to the incidence matrix.
            if r != c {
                incidence_entries.push((i, r, 1.0));
                incidence_entries.push((i, c, -1.0));
            }

            weight_entries.push((i, i, w));
        }

        let laplacian_entries: Vec<(usize, usize, f64)> = degree
            .iter()
            .enumerate()
            .map(|(i, &d)| (i, i, d))
            .chain(adjacency_entries.iter().map(|&(r, c, w)| (r, c, -w)))
            .collect();

        let graph = Self {
            adjacency: CsrMatrix::from_coo(n, n, adjacency_entries),
            degree: CsrMatrix::from_diagonal(&degree),
            incidence: CsrMatrix::from_coo(m, n, incidence_entries),
            weight_matrix: CsrMatrix::from_coo(m, m, weight_entries),
            laplacian: CsrMatrix::from_coo(n, n, laplacian_entries),
            edges,
            weights,
            node_count,
        };

        debug!(
            nodes = graph.node_count,
            edges = graph.edge_count(),
            laplacian_nnz = graph.laplacian.nnz(),
            "graph assembled"
        );

        graph
    }

    /// Symmetric `n x n` adjacency matrix.
    #[inline]
    pub fn adjacency(&self) -> &CsrMatrix<f64> {
        &self.adjacency
    }

    /// Signed `m x n` incidence matrix.
    #[inline]
    pub fn incidence(&self) -> &CsrMatrix<f64> {
        &self.incidence
    }

    /// Diagonal `n x n` degree matrix.
    #[inline]
    pub fn degree(&self) -> &CsrMatrix<f64> {
        &self.degree
    }

    /// Diagonal `m x m` edge weight matrix.
    #[inline]
    pub fn weight_matrix(&self) -> &CsrMatrix<f64> {
        &self.weight_matrix
    }

    /// `n x n` Laplacian `D - A`.
    #[inline]
    pub fn laplacian(&self) -> &CsrMatrix<f64> {
        &self.laplacian
    }

    /// Edge list as `(u, v)` node index pairs.
    #[inline]
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Weight list, parallel to [`edges`](Self::edges).
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Number of edges `m`.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of nodes `n` (largest endpoint + 1).
    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Laplacian quadratic form `x^T L x = sum_e w_e (x_u - x_v)^2`.
    ///
    /// # Panics
    ///
    /// Panics if `x.len() < node_count()`.
    pub fn quadratic_form(&self, x: &[f64]) -> f64 {
        self.edges
            .iter()
            .zip(self.weights.iter())
            .map(|(&(u, v), &w)| {
                let d = x[u] - x[v];
                w * d * d
            })
            .sum()
    }
}
