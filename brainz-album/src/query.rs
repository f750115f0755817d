//! Resolution queries and MusicBrainz web-service paths

use crate::criteria::AlbumCriteria;

/// Web-service prefix on the configured server
pub const WS_PREFIX: &str = "/ws/2";

/// Identifiers known before a lookup; blank values are stored as `None`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionQuery {
    pub release_id: Option<String>,
    pub release_group_id: Option<String>,
    pub artist_id: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
}

impl ResolutionQuery {
    pub fn from_criteria(criteria: &AlbumCriteria) -> Self {
        Self {
            release_id: normalize(criteria.release_id()),
            release_group_id: normalize(criteria.release_group_id()),
            artist_id: normalize(criteria.artist_id()),
            artist_name: normalize(Some(criteria.album_artist())),
            album_name: normalize(Some(&criteria.name)),
        }
    }

    pub fn with_release_id(mut self, id: &str) -> Self {
        self.release_id = normalize(Some(id));
        self
    }

    pub fn with_release_group_id(mut self, id: &str) -> Self {
        self.release_group_id = normalize(Some(id));
        self
    }

    pub fn with_artist_id(mut self, id: &str) -> Self {
        self.artist_id = normalize(Some(id));
        self
    }

    pub fn with_artist_name(mut self, name: &str) -> Self {
        self.artist_name = normalize(Some(name));
        self
    }

    pub fn with_album_name(mut self, name: &str) -> Self {
        self.album_name = normalize(Some(name));
        self
    }

    /// Album + artist-name search is only possible with both values
    pub fn has_name_pair(&self) -> bool {
        self.album_name.is_some() && self.artist_name.is_some()
    }

    /// Enough is known to issue at least one query
    pub fn is_resolvable(&self) -> bool {
        self.release_id.is_some()
            || self.release_group_id.is_some()
            || self.artist_id.is_some()
            || self.has_name_pair()
    }

    fn album(&self) -> &str {
        self.album_name.as_deref().unwrap_or("")
    }

    /// Album + artist query for the strongest artist identity available
    pub fn album_artist_path(&self) -> Option<String> {
        if let Some(artist_id) = &self.artist_id {
            return Some(release_by_artist_id_path(self.album(), artist_id));
        }

        match (&self.album_name, &self.artist_name) {
            (Some(album), Some(artist)) => Some(release_by_artist_name_path(album, artist)),
            _ => None,
        }
    }

    /// Search listing path: release id, then release group, then artist
    pub fn search_path(&self) -> Option<String> {
        if let Some(release_id) = &self.release_id {
            return Some(release_by_id_path(release_id));
        }

        if let Some(release_group_id) = &self.release_group_id {
            return Some(releases_in_group_path(release_group_id));
        }

        self.album_artist_path()
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Album title as a quoted phrase; embedded quotes would end the phrase early
fn quoted_album(album: &str) -> String {
    format!("\"{}\"", encode(&album.replace('"', "")))
}

pub fn release_by_id_path(release_id: &str) -> String {
    format!("{}/release/?query=reid:{}", WS_PREFIX, encode(release_id))
}

pub fn releases_in_group_path(release_group_id: &str) -> String {
    format!("{}/release?release-group={}", WS_PREFIX, encode(release_group_id))
}

pub fn release_by_artist_id_path(album: &str, artist_id: &str) -> String {
    format!(
        "{}/release/?query={} AND arid:{}",
        WS_PREFIX,
        quoted_album(album),
        encode(artist_id)
    )
}

pub fn release_by_artist_name_path(album: &str, artist: &str) -> String {
    format!(
        "{}/release/?query={} AND artist:\"{}\"",
        WS_PREFIX,
        quoted_album(album),
        encode(artist)
    )
}

pub fn release_group_by_release_id_path(release_id: &str) -> String {
    format!("{}/release-group/?query=reid:{}", WS_PREFIX, encode(release_id))
}
