//! Ranking metrics and timing
//!
//! Lightweight instrumentation for the model build and ranking passes.

use serde::Serialize;
use std::time::Instant;

use super::matrix::InteractionModel;

/// Shape summary of a built model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStats {
    pub users: usize,
    pub products: usize,
    pub categories: usize,
    /// Share of non-zero cells in the interaction matrix (0-1)
    pub density: f64,
}

impl ModelStats {
    pub fn from_model(model: &InteractionModel) -> Self {
        let cells = model.interactions.len();
        let non_zero = model.interactions.iter().filter(|v| **v != 0.0).count();
        Self {
            users: model.user_count(),
            products: model.product_count(),
            categories: model.category_count(),
            density: if cells == 0 {
                0.0
            } else {
                non_zero as f64 / cells as f64
            },
        }
    }
}

/// Performance timer for tracking operation duration
pub struct PerformanceTimer {
    start: Instant,
    label: &'static str,
}

impl PerformanceTimer {
    pub fn new(label: &'static str) -> Self {
        Self {
            start: Instant::now(),
            label,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn log_if_slow(&self, threshold_ms: u64) {
        let elapsed = self.elapsed_ms();
        if elapsed > threshold_ms {
            tracing::warn!(
                "⚠️ Slow operation: {} took {}ms (threshold: {}ms)",
                self.label,
                elapsed,
                threshold_ms
            );
        }
    }
}

impl Drop for PerformanceTimer {
    fn drop(&mut self) {
        tracing::debug!("⏱️ {} completed in {}ms", self.label, self.elapsed_ms());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InteractionRecord;

    #[test]
    fn test_model_stats_density() {
        let records = vec![
            InteractionRecord::new("a", "p1", "x", 1.0),
            InteractionRecord::new("b", "p2", "y", 2.0),
        ];
        let model = InteractionModel::build(&records).unwrap();
        let stats = ModelStats::from_model(&model);

        assert_eq!(stats.users, 2);
        assert_eq!(stats.products, 2);
        assert_eq!(stats.categories, 2);
        assert!((stats.density - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_timer_elapsed_is_monotonic() {
        let timer = PerformanceTimer::new("test");
        let first = timer.elapsed_ms();
        assert!(timer.elapsed_ms() >= first);
    }
}
