//! Recommendation service
//!
//! Owns the loaded interaction store and the ranking engine built from it,
//! and exposes the ranking operations to the API layer. A snapshot is
//! immutable; reloading builds a new one and swaps it in, so in-flight
//! requests keep ranking against the snapshot they started with.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::{Config, RankingConfig};
use crate::error::{Error, Result};
use crate::ranking::metrics::PerformanceTimer;
use crate::ranking::{InteractionModel, ModelStats, RankingEngine};
use crate::store::{InteractionStore, ProductInfo};

/// Store and engine built from one load of the interaction data
pub struct Snapshot {
    pub store: InteractionStore,
    pub engine: RankingEngine,
    pub loaded_at: DateTime<Utc>,
}

impl Snapshot {
    /// Build the ranking model for `store`
    pub fn build(store: InteractionStore, ranking: &RankingConfig) -> Result<Self> {
        let timer = PerformanceTimer::new("build_snapshot");
        let model = InteractionModel::build(store.records())?;
        let engine =
            RankingEngine::new(model).with_vote_settings(ranking.vote_depth, ranking.parallel);
        timer.log_if_slow(5_000);

        Ok(Self {
            store,
            engine,
            loaded_at: Utc::now(),
        })
    }

    pub fn stats(&self) -> SnapshotStats {
        SnapshotStats {
            model: ModelStats::from_model(self.engine.model()),
            records: self.store.len(),
            loaded_at: self.loaded_at,
        }
    }
}

/// Summary of the active snapshot
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotStats {
    #[serde(flatten)]
    pub model: ModelStats,
    pub records: usize,
    pub loaded_at: DateTime<Utc>,
}

/// One user's ranking resolved to display metadata
#[derive(Debug, Clone, Serialize)]
pub struct UserRanking {
    pub user_id: String,
    pub products: Vec<ProductInfo>,
}

/// Rankings for the first few users plus the global top list
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub users: Vec<UserRanking>,
    pub top_products: Vec<ProductInfo>,
}

/// Ranking service over a swappable snapshot
pub struct Recommender {
    data_path: Option<PathBuf>,
    ranking: RankingConfig,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl Recommender {
    /// Load the interaction data and build the first snapshot
    ///
    /// Any failure here is fatal: nothing can be ranked without data.
    pub async fn load(config: &Config) -> Result<Self> {
        let snapshot = load_snapshot(&config.data.path, &config.ranking).await?;
        info!(
            "✅ Ranking model ready: {} users, {} products, {} categories",
            snapshot.engine.model().user_count(),
            snapshot.engine.model().product_count(),
            snapshot.engine.model().category_count()
        );

        Ok(Self {
            data_path: Some(config.data.path.clone()),
            ranking: config.ranking.clone(),
            snapshot: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// Build from records already in memory; such a service cannot reload
    pub fn from_store(store: InteractionStore, ranking: RankingConfig) -> Result<Self> {
        let snapshot = Snapshot::build(store, &ranking)?;
        Ok(Self {
            data_path: None,
            ranking,
            snapshot: RwLock::new(Arc::new(snapshot)),
        })
    }

    pub fn ranking_config(&self) -> &RankingConfig {
        &self.ranking
    }

    /// Current snapshot
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().await.clone()
    }

    /// Hybrid ranking for a user; unknown users get an empty list
    pub async fn get_personalized_ranking(&self, user_id: &str, top_n: usize) -> Result<Vec<String>> {
        let snapshot = self.snapshot().await;
        let user_id = user_id.to_string();
        let ranking =
            tokio::task::spawn_blocking(move || snapshot.engine.rank(&user_id, top_n)).await?;
        Ok(ranking)
    }

    /// Global top products by rank-weighted vote across all users
    pub async fn get_global_top_products(&self, top_k: usize) -> Result<Vec<String>> {
        let snapshot = self.snapshot().await;
        let top = tokio::task::spawn_blocking(move || snapshot.engine.top_global(top_k)).await?;
        Ok(top)
    }

    pub async fn product_info(&self, product_id: &str) -> Option<ProductInfo> {
        self.snapshot().await.store.product_info(product_id)
    }

    /// Rankings for the first configured users and the global top list
    pub async fn overview(&self) -> Result<Overview> {
        let snapshot = self.snapshot().await;
        let ranking = self.ranking.clone();

        let overview = tokio::task::spawn_blocking(move || {
            let resolve = |ids: Vec<String>| -> Vec<ProductInfo> {
                ids.iter()
                    .filter_map(|id| snapshot.store.product_info(id))
                    .collect()
            };

            let users = snapshot
                .engine
                .model()
                .users
                .ids()
                .iter()
                .take(ranking.overview_users)
                .map(|user_id| UserRanking {
                    user_id: user_id.clone(),
                    products: resolve(snapshot.engine.rank(user_id, ranking.default_top_n)),
                })
                .collect();

            Overview {
                users,
                top_products: resolve(snapshot.engine.top_global(ranking.global_top_k)),
            }
        })
        .await?;

        Ok(overview)
    }

    pub async fn stats(&self) -> SnapshotStats {
        self.snapshot().await.stats()
    }

    /// Re-read the data file and swap in a fresh snapshot
    ///
    /// On failure the current snapshot stays active.
    pub async fn reload(&self) -> Result<SnapshotStats> {
        let path = self
            .data_path
            .as_deref()
            .ok_or_else(|| Error::config("no data file configured for reload"))?;

        let snapshot = match load_snapshot(path, &self.ranking).await {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                warn!("Reload from {} failed, keeping current model: {}", path.display(), e);
                return Err(e);
            }
        };

        let stats = snapshot.stats();
        *self.snapshot.write().await = snapshot;
        info!(
            "🔄 Reloaded ranking model: {} users, {} products",
            stats.model.users, stats.model.products
        );
        Ok(stats)
    }
}

async fn load_snapshot(path: &Path, ranking: &RankingConfig) -> Result<Snapshot> {
    let store = InteractionStore::load(path).await?;
    let ranking = ranking.clone();
    tokio::task::spawn_blocking(move || Snapshot::build(store, &ranking)).await?
}
