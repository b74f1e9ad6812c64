mod engine;
mod feature_table;

pub use engine::{
    cosine_similarity, RecommendationEngine, TrackSummary, DEFAULT_RECOMMEND_COUNT,
    DEFAULT_SEARCH_LIMIT,
};
pub use feature_table::{
    fetch_feature_table, parse_artists, AudioFeatures, FeatureTable, TrackRecord, FEATURE_COLUMNS,
    FEATURE_COUNT,
};
