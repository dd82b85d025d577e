//! Personalized Ranking Engine
//!
//! Per-user hybrid ranking: a collaborative ranking (similarity-weighted sum
//! of every user's product vector) followed by content-only picks (the user's
//! category affinity projected back onto products). Collaborative results
//! always come first.

use ndarray::{Array1, Array2, ArrayView1};
use once_cell::sync::OnceCell;
use tracing::debug;

use super::matrix::InteractionModel;
use super::metrics::PerformanceTimer;
use super::similarity::user_similarity;

/// Ranking model: the built matrices plus the derived similarity matrix
///
/// Immutable once constructed. Everything that depends on the matrices,
/// including the memoized global vote tally, lives and dies with it.
pub struct RankingEngine {
    model: InteractionModel,
    similarity: Array2<f64>,
    /// `model.interactions` divided by its largest cell
    interactions: Array2<f64>,
    /// `model.profiles` divided by its largest cell
    profiles: Array2<f64>,
    pub(super) vote_tally: OnceCell<Vec<u64>>,
    pub(super) vote_depth: usize,
    pub(super) parallel: bool,
}

impl RankingEngine {
    /// Per-user ranking length used by the global vote when not configured
    pub const DEFAULT_VOTE_DEPTH: usize = 5;

    pub fn new(model: InteractionModel) -> Self {
        let _timer = PerformanceTimer::new("user_similarity");
        let similarity = user_similarity(&model.interactions);
        debug!(
            "Computed {}x{} user similarity matrix",
            similarity.nrows(),
            similarity.ncols()
        );

        let interactions = scaled_to_unit_max(&model.interactions);
        let profiles = scaled_to_unit_max(&model.profiles);

        Self {
            model,
            similarity,
            interactions,
            profiles,
            vote_tally: OnceCell::new(),
            vote_depth: Self::DEFAULT_VOTE_DEPTH,
            parallel: true,
        }
    }

    /// Set the per-user ranking length and parallelism of the global vote
    pub fn with_vote_settings(mut self, vote_depth: usize, parallel: bool) -> Self {
        self.vote_depth = vote_depth;
        self.parallel = parallel;
        self.vote_tally = OnceCell::new();
        self
    }

    pub fn model(&self) -> &InteractionModel {
        &self.model
    }

    pub fn similarity(&self) -> &Array2<f64> {
        &self.similarity
    }

    /// Cosine similarity between two users, `None` if either is unknown
    pub fn user_similarity(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.model.users.position(a)?;
        let j = self.model.users.position(b)?;
        Some(self.similarity[[i, j]])
    }

    /// Hybrid ranking for `user_id`, at most `top_n` product ids
    ///
    /// Unknown users get an empty ranking.
    pub fn rank(&self, user_id: &str, top_n: usize) -> Vec<String> {
        let Some(user) = self.model.users.position(user_id) else {
            debug!("No interactions for user {}, returning empty ranking", user_id);
            return Vec::new();
        };

        self.rank_positions(user, top_n)
            .into_iter()
            .map(|p| self.model.products.id(p).to_string())
            .collect()
    }

    /// Hybrid ranking by user row, as product column positions
    pub fn rank_positions(&self, user: usize, top_n: usize) -> Vec<usize> {
        if top_n == 0 {
            return Vec::new();
        }

        let collaborative = top_positions(self.collaborative_scores(user).view(), top_n);
        let content = top_positions(self.content_scores(user).view(), top_n);

        merge_hybrid(collaborative, content, top_n)
    }

    /// Similarity row of `user` times the interaction matrix
    ///
    /// Scores are relative to the largest interaction cell, which keeps them
    /// finite without changing their order.
    pub fn collaborative_scores(&self, user: usize) -> Array1<f64> {
        self.similarity.row(user).dot(&self.interactions)
    }

    /// User row projected through the profile matrix and back onto products
    ///
    /// Both matrices enter relative to their largest cell, as above.
    pub fn content_scores(&self, user: usize) -> Array1<f64> {
        let category_affinity = self.interactions.row(user).dot(&self.profiles);
        self.profiles.dot(&category_affinity)
    }
}

/// `matrix` divided by its largest entry; an all-zero matrix is returned as is
fn scaled_to_unit_max(matrix: &Array2<f64>) -> Array2<f64> {
    let max = matrix.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    if max == 0.0 {
        matrix.clone()
    } else {
        matrix.mapv(|v| v / max)
    }
}

/// Positions of the `n` highest scores; equal scores keep ascending position order
fn top_positions(scores: ArrayView1<'_, f64>, n: usize) -> Vec<usize> {
    let mut positions: Vec<usize> = (0..scores.len()).collect();
    positions.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
    positions.truncate(n);
    positions
}

/// Collaborative ranking first, then content entries it doesn't already hold
fn merge_hybrid(collaborative: Vec<usize>, content: Vec<usize>, top_n: usize) -> Vec<usize> {
    let mut hybrid = collaborative;
    for p in content {
        if hybrid.len() >= top_n {
            break;
        }
        if !hybrid.contains(&p) {
            hybrid.push(p);
        }
    }
    hybrid.truncate(top_n);
    hybrid
}
