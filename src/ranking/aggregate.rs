//! Aggregation Engine
//!
//! Folds every user's personalized ranking into one global ranking by
//! Borda-style voting: a product at rank `r` (1-based) in a ranking of length
//! `L` earns `L - r + 1` points, unranked products earn nothing.
//!
//! Per-user rankings are independent, so the vote fans out over the rayon
//! pool and partial tallies are summed. Integer points keep the merge exact
//! regardless of worker scheduling, and the tie-break is applied only after
//! the final merge.

use rayon::prelude::*;
use tracing::debug;

use super::engine::RankingEngine;
use super::metrics::PerformanceTimer;

impl RankingEngine {
    /// Global top-`top_k` product ids
    pub fn top_global(&self, top_k: usize) -> Vec<String> {
        let tally = self.vote_tally();
        top_by_votes(tally, top_k)
            .into_iter()
            .map(|p| self.model().products.id(p).to_string())
            .collect()
    }

    /// Accumulated vote points per product column, computed once per engine
    pub fn vote_tally(&self) -> &[u64] {
        self.vote_tally
            .get_or_init(|| tally_votes(self, self.vote_depth, self.parallel))
    }
}

/// Sum of positional credit over every user's ranking of length `depth`
pub fn tally_votes(engine: &RankingEngine, depth: usize, parallel: bool) -> Vec<u64> {
    let _timer = PerformanceTimer::new("tally_votes");
    let users = engine.model().user_count();
    let products = engine.model().product_count();

    let tally = if parallel {
        (0..users)
            .into_par_iter()
            .fold(
                || vec![0u64; products],
                |mut acc, user| {
                    credit(&mut acc, &engine.rank_positions(user, depth));
                    acc
                },
            )
            .reduce(|| vec![0u64; products], merge_tallies)
    } else {
        let mut acc = vec![0u64; products];
        for user in 0..users {
            credit(&mut acc, &engine.rank_positions(user, depth));
        }
        acc
    };

    debug!(
        "Tallied votes from {} users over {} products (depth {})",
        users, products, depth
    );
    tally
}

fn credit(acc: &mut [u64], ranking: &[usize]) {
    let len = ranking.len() as u64;
    for (i, &p) in ranking.iter().enumerate() {
        acc[p] += len - i as u64;
    }
}

fn merge_tallies(mut a: Vec<u64>, b: Vec<u64>) -> Vec<u64> {
    for (x, y) in a.iter_mut().zip(b) {
        *x += y;
    }
    a
}

/// Positions of the `k` largest tallies; equal tallies keep ascending position order
fn top_by_votes(tally: &[u64], k: usize) -> Vec<usize> {
    let mut positions: Vec<usize> = (0..tally.len()).collect();
    positions.sort_by(|&a, &b| tally[b].cmp(&tally[a]).then(a.cmp(&b)));
    positions.truncate(k);
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::matrix::InteractionModel;
    use crate::store::InteractionRecord;

    fn catalogue_engine() -> RankingEngine {
        let records = vec![
            InteractionRecord::new("u1", "p1", "shoes", 5.0),
            InteractionRecord::new("u1", "p2", "shoes", 1.0),
            InteractionRecord::new("u2", "p1", "shoes", 4.0),
            InteractionRecord::new("u2", "p3", "hats", 2.0),
            InteractionRecord::new("u3", "p4", "bags", 3.0),
            InteractionRecord::new("u3", "p3", "hats", 1.0),
            InteractionRecord::new("u4", "p5", "socks", 0.5),
        ];
        RankingEngine::new(InteractionModel::build(&records).unwrap())
    }

    #[test]
    fn test_credit_is_descending_positional() {
        let mut acc = vec![0u64; 4];
        credit(&mut acc, &[2, 0, 3]);
        assert_eq!(acc, vec![2, 0, 3, 1]);
    }

    #[test]
    fn test_tally_matches_manual_borda_count() {
        let engine = catalogue_engine().with_vote_settings(3, false);
        let mut expected = vec![0u64; engine.model().product_count()];
        for user in 0..engine.model().user_count() {
            let ranking = engine.rank_positions(user, 3);
            let len = ranking.len() as u64;
            for (r, p) in ranking.iter().enumerate() {
                expected[*p] += len - r as u64;
            }
        }
        assert_eq!(engine.vote_tally(), expected.as_slice());
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let engine = catalogue_engine();
        let sequential = tally_votes(&engine, 5, false);
        let parallel = tally_votes(&engine, 5, true);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_top_global_bounded_and_known() {
        let engine = catalogue_engine();
        let known = engine.model().products.ids().to_vec();

        let top = engine.top_global(3);
        assert_eq!(top.len(), 3);
        assert!(top.iter().all(|p| known.contains(p)));

        assert_eq!(engine.top_global(100).len(), known.len());
        assert!(engine.top_global(0).is_empty());
    }

    #[test]
    fn test_top_global_is_deterministic() {
        let a = catalogue_engine().top_global(5);
        let b = catalogue_engine().with_vote_settings(5, false).top_global(5);
        assert_eq!(a, b);
        assert_eq!(a[0], "p1");
    }

    #[test]
    fn test_top_by_votes_tie_break() {
        assert_eq!(top_by_votes(&[3, 7, 3, 7, 1], 5), vec![1, 3, 0, 2, 4]);
    }
}
