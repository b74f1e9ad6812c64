use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::feature_table::{FeatureTable, TrackRecord};
use crate::error::ServiceError;

pub const DEFAULT_SEARCH_LIMIT: usize = 20;
pub const DEFAULT_RECOMMEND_COUNT: usize = 5;

/// Descriptive fields of a track, without its features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub track_id: String,
    pub track_name: String,
    pub album: String,
    pub artist: String,
}

impl From<&TrackRecord> for TrackSummary {
    fn from(record: &TrackRecord) -> Self {
        TrackSummary {
            track_id: record.id.clone(),
            track_name: record.name.clone(),
            album: record.album.clone(),
            artist: record.artists.join(", "),
        }
    }
}

/// Cosine of the angle between `a` and `b`. Zero when either vector has no
/// magnitude.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

pub struct RecommendationEngine {
    table: Arc<FeatureTable>,
    search_limit: usize,
}

impl RecommendationEngine {
    pub fn new(table: Arc<FeatureTable>, search_limit: usize) -> Self {
        Self {
            table,
            search_limit,
        }
    }

    pub fn table(&self) -> &FeatureTable {
        &self.table
    }

    fn validate_query(name: &str) -> Result<String, ServiceError> {
        let query = name.trim();
        if query.is_empty() {
            return Err(ServiceError::Validation(
                "track_name is required".to_string(),
            ));
        }
        Ok(query.to_lowercase())
    }

    fn matching(&self, needle: &str) -> impl Iterator<Item = (usize, &TrackRecord)> + '_ {
        let needle = needle.to_string();
        self.table
            .records()
            .iter()
            .enumerate()
            .filter(move |(_, record)| record.name.to_lowercase().contains(&needle))
    }

    /// Rows whose name contains `name`, ignoring case, in table order.
    pub fn search(&self, name: &str) -> Result<Vec<TrackSummary>, ServiceError> {
        let needle = Self::validate_query(name)?;
        let found: Vec<TrackSummary> = self
            .matching(&needle)
            .take(self.search_limit)
            .map(|(_, record)| TrackSummary::from(record))
            .collect();
        if found.is_empty() {
            return Err(ServiceError::NotFound("No tracks found".to_string()));
        }
        Ok(found)
    }

    /// The `k` rows most similar to the first row matching `name`. The
    /// query row itself is never part of the result.
    pub fn recommend(&self, name: &str, k: usize) -> Result<Vec<TrackSummary>, ServiceError> {
        let needle = Self::validate_query(name)?;
        let (query_index, query) = self
            .matching(&needle)
            .next()
            .ok_or_else(|| ServiceError::NotFound("No tracks found".to_string()))?;

        let mut scored: Vec<(usize, f64)> = self
            .table
            .records()
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != query_index)
            .map(|(index, record)| {
                (
                    index,
                    cosine_similarity(query.features.as_slice(), record.features.as_slice()),
                )
            })
            .collect();

        // Stable: equal scores keep table order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        debug!(
            query = %query.name,
            candidates = scored.len(),
            "Ranked recommendation candidates"
        );

        let records = self.table.records();
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(index, _)| TrackSummary::from(&records[index]))
            .collect())
    }
}
