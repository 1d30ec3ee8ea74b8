//! Dynamic time warping between feature-vector sequences.
//!
//! The accumulated-cost matrix is filled row by row inside a Sakoe-Chiba
//! band around the main diagonal; cells outside the band stay at `+∞` and
//! never take part in any minimum. Backtracking prefers the diagonal step,
//! then up, then left, so tied paths decode deterministically.
//!
//! Failures are reported in band: empty inputs and oversized matrices yield
//! an infinite distance with an empty path and matrix, and a dimension
//! mismatch between two frames makes that pair (and any path through it)
//! infinitely expensive.

/// Cap on `n·m` accumulated-cost cells; larger inputs fail cleanly with the
/// same sentinel as empty input instead of allocating without bound.
pub const MAX_COST_CELLS: usize = 64 * 1024 * 1024;

/// Local distance between two equal-length feature vectors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DistanceMetric {
    /// `√Σ(a−b)²`
    Euclidean,
    /// `Σ|a−b|`
    Manhattan,
    /// `1 − (a·b)/(‖a‖‖b‖)`; `1.0` when either norm is zero.
    Cosine,
}

/// Distance between two feature vectors under `metric`.
///
/// Mismatched dimensions yield `+∞`, which propagates through any minimum
/// taken over path steps.
pub fn vector_distance(a: &[f64], b: &[f64], metric: DistanceMetric) -> f64 {
    if a.len() != b.len() {
        return f64::INFINITY;
    }

    match metric {
        DistanceMetric::Euclidean => a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt(),
        DistanceMetric::Manhattan => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
        DistanceMetric::Cosine => {
            let mut dot = 0.0;
            let mut norm_a = 0.0;
            let mut norm_b = 0.0;
            for (x, y) in a.iter().zip(b) {
                dot += x * y;
                norm_a += x * x;
                norm_b += y * y;
            }
            if norm_a == 0.0 || norm_b == 0.0 {
                return 1.0;
            }
            1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
        }
    }
}

/// Dense `rows × cols` matrix stored as one flat buffer with row stride
/// `cols`, owned exclusively by the call that filled it.
#[derive(Clone, Debug, Default)]
pub struct CostMatrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl CostMatrix {
    fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            data: vec![value; rows * cols],
            rows,
            cols,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    #[inline]
    fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.cols + j] = value;
    }
}

/// Full output of [`compute_dtw`].
#[derive(Clone, Debug)]
pub struct DtwResult {
    /// Accumulated cost at the terminal corner, or `+∞` when unreachable.
    pub distance: f64,
    /// Warping path from `(0,0)` to `(n−1,m−1)`; empty unless requested and
    /// the corner is reachable.
    pub path: Vec<(usize, usize)>,
    /// The accumulated-cost matrix; empty for degenerate inputs.
    pub cost_matrix: CostMatrix,
}

/// Distance-only view returned by [`dtw_distance`].
#[derive(Copy, Clone, Debug)]
pub struct DtwDistance {
    pub distance: f64,
    /// `distance / max(n, m)`.
    pub normalized_distance: f64,
}

/// Distance plus path returned by [`dtw_align`].
#[derive(Clone, Debug)]
pub struct DtwAlignment {
    pub distance: f64,
    /// `distance / max(n, m)`.
    pub normalized_distance: f64,
    pub path: Vec<(usize, usize)>,
}

#[cfg(not(feature = "parallel"))]
fn local_distances(
    seq1: &[Vec<f64>],
    seq2: &[Vec<f64>],
    band: usize,
    metric: DistanceMetric,
) -> CostMatrix {
    let mut local = CostMatrix::filled(seq1.len(), seq2.len(), f64::INFINITY);
    for (i, frame1) in seq1.iter().enumerate() {
        for (j, frame2) in seq2.iter().enumerate() {
            if i.abs_diff(j) <= band {
                local.set(i, j, vector_distance(frame1, frame2, metric));
            }
        }
    }
    local
}

#[cfg(feature = "parallel")]
fn local_distances(
    seq1: &[Vec<f64>],
    seq2: &[Vec<f64>],
    band: usize,
    metric: DistanceMetric,
) -> CostMatrix {
    use rayon::prelude::*;

    let cols = seq2.len();
    let mut local = CostMatrix::filled(seq1.len(), cols, f64::INFINITY);
    local
        .data
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(i, row)| {
            for (j, cell) in row.iter_mut().enumerate() {
                if i.abs_diff(j) <= band {
                    *cell = vector_distance(&seq1[i], &seq2[j], metric);
                }
            }
        });
    local
}

/// Compute the banded DTW alignment between two feature sequences.
///
/// `band_width ≤ 0` means unconstrained (internally `max(n, m)`). With
/// `n ≠ m` a band narrower than `|n − m|` makes the terminal corner
/// unreachable and the distance `+∞`; callers wanting a guaranteed finite
/// result should pass a band of at least `|n − m|` or leave it
/// unconstrained.
///
/// Empty sequences, and inputs whose `n·m` exceeds [`MAX_COST_CELLS`],
/// yield `{+∞, [], empty matrix}`.
pub fn compute_dtw(
    seq1: &[Vec<f64>],
    seq2: &[Vec<f64>],
    band_width: isize,
    metric: DistanceMetric,
    return_path: bool,
) -> DtwResult {
    let n = seq1.len();
    let m = seq2.len();

    if n == 0 || m == 0 || n.saturating_mul(m) > MAX_COST_CELLS {
        return DtwResult {
            distance: f64::INFINITY,
            path: Vec::new(),
            cost_matrix: CostMatrix::default(),
        };
    }

    let band = if band_width <= 0 {
        n.max(m)
    } else {
        band_width as usize
    };

    #[cfg(feature = "tracing")]
    let span = tracing::trace_span!("compute_dtw", n, m, band);
    #[cfg(feature = "tracing")]
    let _enter = span.enter();

    let local = local_distances(seq1, seq2, band, metric);
    let mut cost = CostMatrix::filled(n, m, f64::INFINITY);

    cost.set(0, 0, local.get(0, 0));
    for j in 1..m.min(band + 1) {
        cost.set(0, j, cost.get(0, j - 1) + local.get(0, j));
    }
    for i in 1..n.min(band + 1) {
        cost.set(i, 0, cost.get(i - 1, 0) + local.get(i, 0));
    }

    for i in 1..n {
        let j_start = 1.max(i.saturating_sub(band));
        let j_end = m.min(i + band + 1);
        for j in j_start..j_end {
            let d = local.get(i, j);
            if d.is_infinite() {
                continue;
            }
            let min_prev = cost
                .get(i - 1, j - 1)
                .min(cost.get(i - 1, j))
                .min(cost.get(i, j - 1));
            cost.set(i, j, d + min_prev);
        }
    }

    let distance = cost.get(n - 1, m - 1);
    let path = if return_path && distance != f64::INFINITY {
        backtrack(&cost)
    } else {
        Vec::new()
    };

    DtwResult {
        distance,
        path,
        cost_matrix: cost,
    }
}

/// Walk the cost matrix from the terminal corner back to `(0,0)`.
///
/// Tie order is diagonal, then up, then left; on an edge the only move is
/// along that edge.
fn backtrack(cost: &CostMatrix) -> Vec<(usize, usize)> {
    #[cfg(feature = "tracing")]
    let span = tracing::trace_span!("dtw_backtrack", rows = cost.rows(), cols = cost.cols());
    #[cfg(feature = "tracing")]
    let _enter = span.enter();

    let mut i = cost.rows() - 1;
    let mut j = cost.cols() - 1;
    let mut path = Vec::with_capacity(cost.rows() + cost.cols());

    while i > 0 || j > 0 {
        path.push((i, j));

        if i == 0 {
            j -= 1;
        } else if j == 0 {
            i -= 1;
        } else {
            let diag = cost.get(i - 1, j - 1);
            let up = cost.get(i - 1, j);
            let left = cost.get(i, j - 1);

            if diag <= up && diag <= left {
                i -= 1;
                j -= 1;
            } else if up <= left {
                i -= 1;
            } else {
                j -= 1;
            }
        }
    }
    path.push((0, 0));
    path.reverse();
    path
}

/// Euclidean DTW distance without path recovery.
pub fn dtw_distance(seq1: &[Vec<f64>], seq2: &[Vec<f64>], band_width: isize) -> DtwDistance {
    let result = compute_dtw(seq1, seq2, band_width, DistanceMetric::Euclidean, false);
    DtwDistance {
        distance: result.distance,
        normalized_distance: result.distance / seq1.len().max(seq2.len()) as f64,
    }
}

/// Euclidean DTW distance plus the optimal warping path.
pub fn dtw_align(seq1: &[Vec<f64>], seq2: &[Vec<f64>], band_width: isize) -> DtwAlignment {
    let result = compute_dtw(seq1, seq2, band_width, DistanceMetric::Euclidean, true);
    DtwAlignment {
        distance: result.distance,
        normalized_distance: result.distance / seq1.len().max(seq2.len()) as f64,
        path: result.path,
    }
}
