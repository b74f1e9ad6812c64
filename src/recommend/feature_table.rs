//! In-memory table of tracks and their audio features.

use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::info;

use crate::error::ServiceError;

/// Number of numeric audio features per track.
pub const FEATURE_COUNT: usize = 10;

/// Feature columns, in vector order.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "danceability",
    "energy",
    "key",
    "loudness",
    "mode",
    "speechiness",
    "instrumentalness",
    "liveness",
    "valence",
    "tempo",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFeatures(pub [f64; FEATURE_COUNT]);

impl AudioFeatures {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackRecord {
    pub id: String,
    pub name: String,
    pub album: String,
    pub artists: Vec<String>,
    pub features: AudioFeatures,
}

/// Rows keep their load order; that order breaks similarity ties.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    records: Vec<TrackRecord>,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    id: String,
    name: String,
    #[serde(default)]
    album: String,
    #[serde(default)]
    artists: String,
    danceability: Option<f64>,
    energy: Option<f64>,
    key: Option<f64>,
    loudness: Option<f64>,
    mode: Option<f64>,
    speechiness: Option<f64>,
    instrumentalness: Option<f64>,
    liveness: Option<f64>,
    valence: Option<f64>,
    tempo: Option<f64>,
}

impl CsvRow {
    fn into_record(self, row_number: usize) -> Result<TrackRecord, ServiceError> {
        let values = [
            self.danceability,
            self.energy,
            self.key,
            self.loudness,
            self.mode,
            self.speechiness,
            self.instrumentalness,
            self.liveness,
            self.valence,
            self.tempo,
        ];
        let mut features = [0.0; FEATURE_COUNT];
        for (i, value) in values.into_iter().enumerate() {
            features[i] = match value {
                Some(v) if v.is_finite() => v,
                Some(v) => {
                    return Err(ServiceError::Configuration(format!(
                        "Feature table row {} has non-finite value {} for '{}'",
                        row_number, v, FEATURE_COLUMNS[i]
                    )))
                }
                None => {
                    return Err(ServiceError::Configuration(format!(
                        "Feature table row {} has no value for '{}'",
                        row_number, FEATURE_COLUMNS[i]
                    )))
                }
            };
        }
        Ok(TrackRecord {
            id: self.id,
            name: self.name,
            album: self.album,
            artists: parse_artists(&self.artists),
            features: AudioFeatures(features),
        })
    }
}

/// Parses the `artists` column, which is either a list literal such as
/// `['Queen', 'David Bowie']` or a plain artist name.
pub fn parse_artists(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let inner = match trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        Some(inner) => inner,
        None if trimmed.is_empty() => return Vec::new(),
        None => return vec![trimmed.to_string()],
    };

    let mut artists = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in inner.chars() {
        match quote {
            Some(q) if c == q => {
                artists.push(std::mem::take(&mut current));
                quote = None;
            }
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == ',' => {
                let bare = current.trim();
                if !bare.is_empty() {
                    artists.push(bare.to_string());
                }
                current.clear();
            }
            None => current.push(c),
        }
    }
    let bare = current.trim();
    if !bare.is_empty() {
        artists.push(bare.to_string());
    }
    artists
}

impl FeatureTable {
    pub fn new(records: Vec<TrackRecord>) -> Self {
        Self { records }
    }

    /// Loads a CSV with a header row. Columns are matched by name and
    /// unknown columns are ignored.
    pub fn load_csv<R: Read>(reader: R) -> Result<Self, ServiceError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for (index, row) in csv_reader.deserialize::<CsvRow>().enumerate() {
            let row_number = index + 1;
            let row = row.map_err(|e| {
                ServiceError::Configuration(format!(
                    "Feature table row {} is malformed: {}",
                    row_number, e
                ))
            })?;
            records.push(row.into_record(row_number)?);
        }
        Ok(Self { records })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ServiceError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            ServiceError::Configuration(format!(
                "Cannot open feature table {}: {}",
                path.display(),
                e
            ))
        })?;
        let table = Self::load_csv(file)?;
        info!("Loaded {} tracks from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn records(&self) -> &[TrackRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Downloads the feature table from `url` and parses it.
pub async fn fetch_feature_table(
    client: &reqwest::Client,
    url: &str,
) -> Result<FeatureTable, ServiceError> {
    const SERVICE: &str = "feature-table";

    info!("Downloading feature table from {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ServiceError::from_reqwest(SERVICE, &e))?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ServiceError::from_status(SERVICE, status, &body));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ServiceError::from_reqwest(SERVICE, &e))?;
    let table = FeatureTable::load_csv(bytes.as_ref())?;
    info!("Loaded {} tracks from {}", table.len(), url);
    Ok(table)
}
