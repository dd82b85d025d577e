//! Ranking Module
//!
//! Hybrid product ranking built from a flat set of interaction records.
//!
//! ## Architecture
//!
//! 1. **Matrix** - Build the user×product interaction matrix and the
//!    product×category profile matrix
//! 2. **Similarity** - Cosine similarity between every pair of users
//! 3. **Engine** - Per-user hybrid ranking (collaborative first, then content)
//! 4. **Aggregate** - Borda-style vote over every user's ranking for a global top list
//!
//! ## Ordering
//!
//! Users, products and categories are indexed in order of first appearance
//! in the record set. Equal scores are broken by that order, so identical
//! inputs always produce identical rankings.

pub mod aggregate;
pub mod engine;
pub mod matrix;
pub mod metrics;
pub mod similarity;

pub use engine::RankingEngine;
pub use matrix::{IdIndex, InteractionModel};
pub use metrics::ModelStats;
