//! Test data: a small feature table and in-process stand-ins for the
//! catalog and the dialogue model.

use super::constants::*;
use async_trait::async_trait;
use spotify_chatbot::catalog_client::{CatalogClient, CatalogTrack};
use spotify_chatbot::dialogue::DialogueGenerator;
use spotify_chatbot::ServiceError;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

const HEADER: &str = "id,name,album,artists,danceability,energy,key,loudness,mode,speechiness,instrumentalness,liveness,valence,tempo";

/// Writes the fixture CSV into a fresh temp dir.
///
/// Yellow and Clocks share an identical feature vector, Fix You is close to
/// both, the two Queen tracks sit far away from the Coldplay ones.
pub fn write_feature_table() -> anyhow::Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let path = dir.path().join("tracks.csv");
    let mut file = std::fs::File::create(&path)?;
    writeln!(file, "{}", HEADER)?;
    let rows = [
        ("t1", TRACK_YELLOW, "Parachutes", "['Coldplay']", "0.43,0.66,11,-7.2,1,0.03,0.0,0.23,0.28,173.3"),
        ("t2", TRACK_CLOCKS, "A Rush of Blood to the Head", "['Coldplay']", "0.43,0.66,11,-7.2,1,0.03,0.0,0.23,0.28,173.3"),
        ("t3", TRACK_FIX_YOU, "X&Y", "['Coldplay']", "0.21,0.42,3,-8.7,1,0.03,0.0,0.11,0.12,138.2"),
        ("t4", TRACK_SPEED_OF_SOUND, "X&Y", "['Coldplay']", "0.52,0.89,9,-6.6,1,0.05,0.0,0.07,0.36,123.1"),
        ("t5", TRACK_BOHEMIAN, "A Night at the Opera", "['Queen']", "0.39,0.40,0,-9.9,0,0.05,0.0,0.24,0.23,71.1"),
        ("t6", TRACK_UNDER_PRESSURE, "Hot Space", "\"['Queen', 'David Bowie']\"", "0.67,0.71,2,-7.8,1,0.05,0.0,0.10,0.46,113.8"),
    ];
    for (id, name, album, artists, features) in rows {
        writeln!(file, "{},{},{},{},{}", id, name, album, artists, features)?;
    }
    Ok((dir, path))
}

/// Catalog that knows a single track and returns `None` for anything else.
pub struct FixtureCatalog;

#[async_trait]
impl CatalogClient for FixtureCatalog {
    async fn search_track(&self, query: &str) -> Result<Option<CatalogTrack>, ServiceError> {
        if !query.to_lowercase().contains("yellow") {
            return Ok(None);
        }
        Ok(Some(CatalogTrack {
            id: "3AJwUDP919kvQ9QcozQPxg".to_string(),
            name: TRACK_YELLOW.to_string(),
            artists: vec!["Coldplay".to_string()],
            url: "https://open.spotify.com/track/3AJwUDP919kvQ9QcozQPxg".to_string(),
        }))
    }
}

/// Dialogue generator with a canned reply, one scripted failure and one
/// scripted slow answer.
pub struct ScriptedGenerator;

#[async_trait]
impl DialogueGenerator for ScriptedGenerator {
    async fn generate(&self, text: &str) -> Result<String, ServiceError> {
        if text.contains(DIALOGUE_FAILURE_TRIGGER) {
            return Err(ServiceError::upstream(
                "huggingface",
                "status 503: model is loading",
                true,
            ));
        }
        if text.contains(DIALOGUE_SLOW_TRIGGER) {
            tokio::time::sleep(std::time::Duration::from_millis(DIALOGUE_SLOW_DELAY_MS)).await;
        }
        Ok(DIALOGUE_REPLY.to_string())
    }
}
