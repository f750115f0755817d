//! Records and results exchanged between the decoder, engine and host

use serde::{Deserialize, Serialize};

/// Credited artist: display name plus MusicBrainz artist id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistCredit {
    pub name: String,
    pub artist_id: Option<String>,
}

/// One `<release>` entry of a search or browse response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    /// Release MBID (always present, entries without one are dropped)
    pub release_id: String,
    pub release_group_id: Option<String>,
    pub title: Option<String>,
    /// Release annotation
    pub overview: Option<String>,
    /// Year component of the release date, when it parses
    pub year: Option<i32>,
    /// Primary artist credits in document order
    pub artists: Vec<ArtistCredit>,
}

impl ReleaseRecord {
    pub fn new(release_id: impl Into<String>) -> Self {
        Self {
            release_id: release_id.into(),
            ..Default::default()
        }
    }
}

/// Outcome of resolving an album against the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumMetadata {
    pub has_metadata: bool,
    pub release_id: Option<String>,
    pub release_group_id: Option<String>,
    pub production_year: Option<i32>,
    pub overview: Option<String>,
}

/// Album-artist entry nested inside a search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistSearchResult {
    pub search_provider_name: String,
    pub name: String,
    pub artist_id: Option<String>,
}

/// One row of a search listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumSearchResult {
    pub search_provider_name: String,
    pub name: String,
    pub production_year: Option<i32>,
    pub release_id: Option<String>,
    pub release_group_id: Option<String>,
    pub album_artist: Option<ArtistSearchResult>,
}
