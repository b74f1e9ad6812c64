//! Authorized search against the external music catalog.

mod spotify;

pub use spotify::{
    format_track_info, CatalogClient, CatalogTrack, SpotifyCatalogClient, DEFAULT_API_BASE,
    NOT_FOUND_MESSAGE,
};
