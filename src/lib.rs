//! ProdRank library crate
//!
//! Hybrid product ranking: collaborative user similarity blended with
//! product/category affinity, plus a rank-weighted global top list.

pub mod api;
pub mod config;
pub mod error;
pub mod ranking;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use ranking::{InteractionModel, RankingEngine};
pub use service::Recommender;
pub use store::{InteractionRecord, InteractionStore, ProductInfo};
