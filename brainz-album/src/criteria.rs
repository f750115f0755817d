//! Host-side description of the album being looked up
//!
//! Identifiers may sit on the album itself or on any of its tracks; the
//! accessors here pick the first usable one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// MusicBrainz identifier kinds carried by albums and tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKey {
    /// Release MBID
    Album,
    ReleaseGroup,
    AlbumArtist,
    Artist,
    Track,
}

impl ProviderKey {
    /// Entity path segment on the MusicBrainz website
    pub fn entity(self) -> &'static str {
        match self {
            Self::Album => "release",
            Self::ReleaseGroup => "release-group",
            Self::AlbumArtist | Self::Artist => "artist",
            Self::Track => "track",
        }
    }
}

pub type ProviderIds = HashMap<ProviderKey, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackCriteria {
    pub album_artists: Vec<String>,
    pub provider_ids: ProviderIds,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlbumCriteria {
    /// Album title
    pub name: String,
    pub album_artists: Vec<String>,
    pub provider_ids: ProviderIds,
    /// Ids attached to the album's artist rather than the album
    pub artist_provider_ids: ProviderIds,
    pub tracks: Vec<TrackCriteria>,
}

impl AlbumCriteria {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_provider_id(mut self, key: ProviderKey, id: impl Into<String>) -> Self {
        self.provider_ids.insert(key, id.into());
        self
    }

    pub fn with_album_artist(mut self, artist: impl Into<String>) -> Self {
        self.album_artists.push(artist.into());
        self
    }

    pub fn with_track(mut self, track: TrackCriteria) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn release_id(&self) -> Option<&str> {
        self.own_or_track_id(ProviderKey::Album)
    }

    pub fn release_group_id(&self) -> Option<&str> {
        self.own_or_track_id(ProviderKey::ReleaseGroup)
    }

    /// Album-artist id, then the artist's own id, then any track's album-artist id
    pub fn artist_id(&self) -> Option<&str> {
        lookup(&self.provider_ids, ProviderKey::AlbumArtist)
            .or_else(|| lookup(&self.artist_provider_ids, ProviderKey::Artist))
            .or_else(|| self.first_track_id(ProviderKey::AlbumArtist))
    }

    /// First non-empty album artist on any track, else on the album, else ""
    pub fn album_artist(&self) -> &str {
        self.tracks
            .iter()
            .flat_map(|t| t.album_artists.iter())
            .chain(self.album_artists.iter())
            .map(String::as_str)
            .find(|a| !a.is_empty())
            .unwrap_or("")
    }

    fn own_or_track_id(&self, key: ProviderKey) -> Option<&str> {
        lookup(&self.provider_ids, key).or_else(|| self.first_track_id(key))
    }

    fn first_track_id(&self, key: ProviderKey) -> Option<&str> {
        self.tracks.iter().find_map(|t| lookup(&t.provider_ids, key))
    }
}

fn lookup(ids: &ProviderIds, key: ProviderKey) -> Option<&str> {
    ids.get(&key).map(String::as_str).filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(key: ProviderKey, id: &str) -> TrackCriteria {
        TrackCriteria {
            provider_ids: [(key, id.to_string())].into_iter().collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_album_id_wins_over_tracks() {
        let criteria = AlbumCriteria::new("A")
            .with_provider_id(ProviderKey::Album, "album-level")
            .with_track(track(ProviderKey::Album, "track-level"));
        assert_eq!(criteria.release_id(), Some("album-level"));
    }

    #[test]
    fn test_falls_back_to_first_track_with_id() {
        let criteria = AlbumCriteria::new("A")
            .with_provider_id(ProviderKey::ReleaseGroup, "")
            .with_track(track(ProviderKey::ReleaseGroup, ""))
            .with_track(track(ProviderKey::ReleaseGroup, "rg-2"))
            .with_track(track(ProviderKey::ReleaseGroup, "rg-3"));
        assert_eq!(criteria.release_group_id(), Some("rg-2"));
        assert_eq!(criteria.release_id(), None);
    }

    #[test]
    fn test_artist_id_sources() {
        let mut criteria = AlbumCriteria::new("A").with_track(track(ProviderKey::AlbumArtist, "from-track"));
        assert_eq!(criteria.artist_id(), Some("from-track"));

        criteria
            .artist_provider_ids
            .insert(ProviderKey::Artist, "from-artist".to_string());
        assert_eq!(criteria.artist_id(), Some("from-artist"));

        let criteria = criteria.with_provider_id(ProviderKey::AlbumArtist, "from-album");
        assert_eq!(criteria.artist_id(), Some("from-album"));
    }

    #[test]
    fn test_album_artist_prefers_tracks() {
        let criteria = AlbumCriteria::new("A")
            .with_album_artist("Album Level")
            .with_track(TrackCriteria {
                album_artists: vec![String::new()],
                ..Default::default()
            })
            .with_track(TrackCriteria {
                album_artists: vec!["Track Level".to_string()],
                ..Default::default()
            });
        assert_eq!(criteria.album_artist(), "Track Level");
    }

    #[test]
    fn test_album_artist_falls_back_to_album_then_empty() {
        let criteria = AlbumCriteria::new("A").with_album_artist("").with_album_artist("Second");
        assert_eq!(criteria.album_artist(), "Second");
        assert_eq!(AlbumCriteria::new("A").album_artist(), "");
    }
}
