//! Similarity Engine
//!
//! User×user cosine similarity over the rows of the interaction matrix.
//! Only the upper triangle is computed; the lower triangle is mirrored so the
//! result is exactly symmetric.
//!
//! Each row is divided by its largest entry before its length is taken, so
//! any finite scores produce finite norms.

use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;

/// Cosine similarity between every pair of user rows
///
/// A user whose row is all zeros has similarity 0 to everyone, itself
/// included. Every other diagonal entry is exactly 1.
pub fn user_similarity(interactions: &Array2<f64>) -> Array2<f64> {
    let n = interactions.nrows();
    let units: Vec<Option<Array1<f64>>> = interactions
        .rows()
        .into_iter()
        .map(unit_vector)
        .collect();

    // Row i holds entries (i, i..n)
    let upper: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            (i..n)
                .map(|j| match (&units[i], &units[j]) {
                    (Some(_), Some(_)) if i == j => 1.0,
                    (Some(a), Some(b)) => a.dot(b).min(1.0),
                    _ => 0.0,
                })
                .collect()
        })
        .collect();

    let mut similarity = Array2::<f64>::zeros((n, n));
    for (i, row) in upper.into_iter().enumerate() {
        for (offset, value) in row.into_iter().enumerate() {
            let j = i + offset;
            similarity[[i, j]] = value;
            similarity[[j, i]] = value;
        }
    }

    similarity
}

/// `row` scaled to unit length, `None` for an all-zero row
fn unit_vector(row: ArrayView1<'_, f64>) -> Option<Array1<f64>> {
    let max = row.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    if max == 0.0 {
        return None;
    }
    let scaled = row.mapv(|v| v / max);
    let norm = scaled.dot(&scaled).sqrt();
    Some(scaled / norm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_example_similarities() {
        // A, B, C over P1, P2
        let m = array![[5.0, 0.0], [4.0, 1.0], [0.0, 5.0]];
        let sim = user_similarity(&m);

        assert!((sim[[0, 1]] - 20.0 / (5.0 * 17f64.sqrt())).abs() < 1e-12);
        assert!(sim[[0, 1]] > 0.97);
        assert_eq!(sim[[0, 2]], 0.0);
        assert!(sim[[1, 2]] > 0.0 && sim[[1, 2]] < 0.3);
    }

    #[test]
    fn test_symmetric_with_unit_diagonal() {
        let m = array![
            [1.0, 2.0, 0.0, 3.0],
            [0.5, 0.0, 4.0, 1.0],
            [2.0, 2.0, 2.0, 2.0],
            [0.0, 7.0, 1.0, 0.0],
        ];
        let sim = user_similarity(&m);

        for i in 0..4 {
            assert_eq!(sim[[i, i]], 1.0);
            for j in 0..4 {
                assert_eq!(sim[[i, j]], sim[[j, i]]);
                assert!(sim[[i, j]] >= 0.0 && sim[[i, j]] <= 1.0 + 1e-12);
            }
        }
    }

    #[test]
    fn test_zero_vector_has_zero_similarity() {
        let m = array![[0.0, 0.0], [3.0, 1.0]];
        let sim = user_similarity(&m);

        assert_eq!(sim[[0, 0]], 0.0);
        assert_eq!(sim[[0, 1]], 0.0);
        assert_eq!(sim[[1, 0]], 0.0);
        assert_eq!(sim[[1, 1]], 1.0);
        assert!(sim.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_huge_scores_stay_finite() {
        // A, B, C over P1, P2; squaring 1e200 would overflow
        let m = array![[1e200, 0.0], [1e200, 1.0], [0.0, 3.0]];
        let sim = user_similarity(&m);

        assert!(sim.iter().all(|v| v.is_finite()));
        assert!((sim[[0, 1]] - 1.0).abs() < 1e-12);
        assert_eq!(sim[[0, 2]], 0.0);
        assert!(sim[[1, 2]] > 0.0 && sim[[1, 2]] < 1e-150);
        assert_eq!(sim[[1, 1]], 1.0);
    }
}
