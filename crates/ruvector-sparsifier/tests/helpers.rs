//! Shared test helpers for the ruvector-sparsifier integration test suite.
//!
//! Provides deterministic graph fixtures, a dense reference for effective
//! resistance, and floating-point comparison utilities.

use ruvector_sparsifier::graph::Graph;
use ruvector_sparsifier::types::CsrMatrix;

// ---------------------------------------------------------------------------
// Random number generator (simple LCG for deterministic reproducibility)
// ---------------------------------------------------------------------------

/// A minimal linear congruential generator for deterministic test data.
pub struct Lcg {
    state: u64,
}

impl Lcg {
    /// Create a new LCG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next u64 value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Generate a uniform f64 in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generate a uniform f64 in [lo, hi).
    pub fn next_f64_range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

// ---------------------------------------------------------------------------
// Graph fixtures
// ---------------------------------------------------------------------------

/// Edge list of the complete graph on `n` nodes, `u < v`.
pub fn complete_edges(n: usize) -> Vec<(usize, usize)> {
    let mut edges = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for u in 0..n {
        for v in (u + 1)..n {
            edges.push((u, v));
        }
    }
    edges
}

/// Unit-weight complete graph `K_n`.
pub fn complete_graph(n: usize) -> Graph {
    Graph::unweighted(complete_edges(n)).unwrap()
}

/// Unit-weight path `0 - 1 - ... - (n-1)`.
pub fn path_graph(n: usize) -> Graph {
    Graph::unweighted((0..n.saturating_sub(1)).map(|i| (i, i + 1)).collect()).unwrap()
}

/// Connected random graph: a weighted spanning path plus each remaining
/// pair with probability `density`. Weights lie in `[0.1, 2.0)`.
pub fn random_connected_graph(n: usize, density: f64, seed: u64) -> Graph {
    let mut rng = Lcg::new(seed);
    let mut edges = Vec::new();
    let mut weights = Vec::new();
    for u in 0..n {
        for v in (u + 1)..n {
            if v == u + 1 || rng.next_f64() < density {
                edges.push((u, v));
                weights.push(rng.next_f64_range(0.1, 2.0));
            }
        }
    }
    Graph::new(edges, weights).unwrap()
}

/// Community graph: `communities` dense blocks of `size` nodes joined by a
/// ring of sparse inter-community bridges.
///
/// Intra-community pairs are linked with probability `p_in`; every pair of
/// neighbouring communities gets at least one bridge.
pub fn community_graph(communities: usize, size: usize, p_in: f64, seed: u64) -> Graph {
    let mut rng = Lcg::new(seed);
    let mut edges = Vec::new();

    for c in 0..communities {
        let base = c * size;
        for u in 0..size {
            for v in (u + 1)..size {
                if v == u + 1 || rng.next_f64() < p_in {
                    edges.push((base + u, base + v));
                }
            }
        }
    }

    for c in 0..communities {
        let next = (c + 1) % communities;
        if next == c {
            continue;
        }
        let u = c * size + (rng.next_u64() as usize % size);
        let v = next * size + (rng.next_u64() as usize % size);
        edges.push((u, v));
    }

    Graph::unweighted(edges).unwrap()
}

// ---------------------------------------------------------------------------
// Dense references
// ---------------------------------------------------------------------------

/// Dense `n x n` Laplacian built straight from the edge list.
pub fn dense_laplacian(graph: &Graph) -> Vec<Vec<f64>> {
    let n = graph.node_count();
    let mut l = vec![vec![0.0f64; n]; n];
    for (&(u, v), &w) in graph.edges().iter().zip(graph.weights()) {
        if u == v {
            continue;
        }
        l[u][u] += w;
        l[v][v] += w;
        l[u][v] -= w;
        l[v][u] -= w;
    }
    l
}

/// Solve `A x = b` using dense Gaussian elimination with partial pivoting.
///
/// # Panics
///
/// Panics if the matrix is singular.
pub fn dense_solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Vec<f64> {
    let n = a.len();
    for col in 0..n {
        let mut max_row = col;
        for row in (col + 1)..n {
            if a[row][col].abs() > a[max_row][col].abs() {
                max_row = row;
            }
        }
        assert!(a[max_row][col].abs() > 1e-15, "matrix is singular");
        a.swap(col, max_row);
        b.swap(col, max_row);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for j in col..n {
                a[row][j] -= factor * a[col][j];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0f64; n];
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= a[i][j] * x[j];
        }
        x[i] = sum / a[i][i];
    }
    x
}

/// Reference effective resistance of every edge of a connected graph.
///
/// Grounds node 0 (drops its row and column), which makes the Laplacian
/// invertible, and solves each incidence system densely.
pub fn reference_resistance(graph: &Graph) -> Vec<f64> {
    let n = graph.node_count();
    let l = dense_laplacian(graph);
    let grounded: Vec<Vec<f64>> = l[1..].iter().map(|row| row[1..].to_vec()).collect();

    graph
        .edges()
        .iter()
        .map(|&(u, v)| {
            if u == v {
                return 0.0;
            }
            let mut b = vec![0.0f64; n];
            b[u] += 1.0;
            b[v] -= 1.0;
            let xg = dense_solve(grounded.clone(), b[1..].to_vec());
            let potential = |i: usize| if i == 0 { 0.0 } else { xg[i - 1] };
            potential(u) - potential(v)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Floating-point comparison utilities
// ---------------------------------------------------------------------------

/// Compute the L2 norm of a vector.
pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|&x| x * x).sum::<f64>().sqrt()
}

/// Compute the residual `b - A*x` for a sparse system.
pub fn compute_residual(matrix: &CsrMatrix<f64>, x: &[f64], rhs: &[f64]) -> Vec<f64> {
    let mut ax = vec![0.0f64; matrix.rows];
    matrix.spmv(x, &mut ax);
    rhs.iter().zip(ax).map(|(b, ax)| b - ax).collect()
}

/// Mean of `|approx_i - exact_i| / exact_i` over entries with `exact_i > 0`.
pub fn mean_relative_error(approx: &[f64], exact: &[f64]) -> f64 {
    let (sum, count) = approx
        .iter()
        .zip(exact)
        .filter(|&(_, &e)| e > 1e-15)
        .fold((0.0, 0usize), |(s, c), (&a, &e)| (s + (a - e).abs() / e, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Shift `values` to zero mean.
pub fn centered(values: &[f64]) -> Vec<f64> {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| v - mean).collect()
}
