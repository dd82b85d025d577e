//! Matrix Builder
//!
//! Derives the dense user×product interaction matrix and the product×category
//! profile matrix from the raw records. Ids are indexed in order of first
//! appearance; that order is also the tie-break order everywhere downstream.

use ndarray::Array2;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::store::InteractionRecord;

/// Bidirectional id ↔ position mapping, ordered by first appearance
#[derive(Debug, Clone, Default)]
pub struct IdIndex {
    ids: Vec<String>,
    positions: HashMap<String, usize>,
}

impl IdIndex {
    /// Position of `id`, inserting it at the end if unseen
    fn intern(&mut self, id: &str) -> usize {
        if let Some(&pos) = self.positions.get(id) {
            return pos;
        }
        let pos = self.ids.len();
        self.ids.push(id.to_string());
        self.positions.insert(id.to_string(), pos);
        pos
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn id(&self, position: usize) -> &str {
        &self.ids[position]
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Read-only model derived once from the interaction records
#[derive(Debug, Clone)]
pub struct InteractionModel {
    pub users: IdIndex,
    pub products: IdIndex,
    pub categories: IdIndex,
    /// users × products, summed interaction scores
    pub interactions: Array2<f64>,
    /// products × categories, summed interaction scores
    pub profiles: Array2<f64>,
}

impl InteractionModel {
    /// Build both matrices from `records`
    ///
    /// Duplicate (user, product) records are summed rather than overwritten.
    /// Fails on an empty record set, on empty ids or categories, on
    /// negative or non-finite scores, and on sums that overflow.
    pub fn build(records: &[InteractionRecord]) -> Result<Self> {
        if records.is_empty() {
            return Err(Error::EmptyDataset);
        }

        let mut users = IdIndex::default();
        let mut products = IdIndex::default();
        let mut categories = IdIndex::default();
        let mut cells = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            validate_record(index, record)?;
            let u = users.intern(&record.user_id);
            let p = products.intern(&record.product_id);
            let c = categories.intern(&record.category);
            cells.push((index, u, p, c, record.interaction_score));
        }

        let mut interactions = Array2::<f64>::zeros((users.len(), products.len()));
        let mut profiles = Array2::<f64>::zeros((products.len(), categories.len()));
        for (index, u, p, c, score) in cells {
            interactions[[u, p]] += score;
            profiles[[p, c]] += score;
            if !interactions[[u, p]].is_finite() || !profiles[[p, c]].is_finite() {
                return Err(Error::invalid_record(
                    index,
                    "summed interaction_score overflows a finite number",
                ));
            }
        }

        debug!(
            "Built interaction matrix {}x{} and profile matrix {}x{}",
            users.len(),
            products.len(),
            products.len(),
            categories.len()
        );

        Ok(Self {
            users,
            products,
            categories,
            interactions,
            profiles,
        })
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }
}

fn validate_record(index: usize, record: &InteractionRecord) -> Result<()> {
    if record.user_id.trim().is_empty() {
        return Err(Error::invalid_record(index, "empty user_id"));
    }
    if record.product_id.trim().is_empty() {
        return Err(Error::invalid_record(index, "empty product_id"));
    }
    if record.category.trim().is_empty() {
        return Err(Error::invalid_record(index, "empty category"));
    }
    let score = record.interaction_score;
    if !score.is_finite() || score < 0.0 {
        return Err(Error::invalid_record(
            index,
            format!("interaction_score must be a non-negative number, got {}", score),
        ));
    }
    Ok(())
}
