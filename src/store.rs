//! Interaction Store
//!
//! Holds the raw interaction records the ranking model is built from and
//! resolves product ids to display metadata. Records are read once from a
//! JSON array file; nothing in the ranking path touches the store again.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// A single (user, product) engagement record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub product_id: String,
    pub category: String,
    pub interaction_score: f64,
    #[serde(default)]
    pub product_name: String,
    #[serde(default, alias = "Image Link")]
    pub image_link: String,
}

impl InteractionRecord {
    pub fn new(
        user_id: impl Into<String>,
        product_id: impl Into<String>,
        category: impl Into<String>,
        interaction_score: f64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            product_id: product_id.into(),
            category: category.into(),
            interaction_score,
            product_name: String::new(),
            image_link: String::new(),
        }
    }

    pub fn with_display(mut self, product_name: impl Into<String>, image_link: impl Into<String>) -> Self {
        self.product_name = product_name.into();
        self.image_link = image_link.into();
        self
    }
}

/// Display metadata for a product
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductInfo {
    pub product_id: String,
    pub product_name: String,
    pub image_link: String,
}

/// Immutable set of interaction records with a product lookup
#[derive(Debug, Clone, Default)]
pub struct InteractionStore {
    records: Vec<InteractionRecord>,
    // product_id -> position of its first record
    first_by_product: HashMap<String, usize>,
}

impl InteractionStore {
    pub fn from_records(records: Vec<InteractionRecord>) -> Self {
        let mut first_by_product = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            first_by_product
                .entry(record.product_id.clone())
                .or_insert(idx);
        }

        Self {
            records,
            first_by_product,
        }
    }

    /// Parse a JSON array of records
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<InteractionRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }

    /// Read and parse the record file at `path`
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading interaction records from {}", path.display());

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::Io {
                path: path.display().to_string(),
                source,
            })?;

        let store = Self::from_json(&contents)?;
        info!(
            "📥 Loaded {} interaction records ({} products) from {}",
            store.len(),
            store.first_by_product.len(),
            path.display()
        );

        Ok(store)
    }

    pub fn records(&self) -> &[InteractionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Display metadata for a product, taken from its first record
    pub fn product_info(&self, product_id: &str) -> Option<ProductInfo> {
        let record = &self.records[*self.first_by_product.get(product_id)?];
        Some(ProductInfo {
            product_id: record.product_id.clone(),
            product_name: record.product_name.clone(),
            image_link: record.image_link.clone(),
        })
    }
}

/// Accept ids written either as JSON strings or numbers
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Int(n) => n.to_string(),
        Id::Float(f) => f.to_string(),
    })
}
