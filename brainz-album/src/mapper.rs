//! Release records to host search results

use crate::models::{AlbumSearchResult, ArtistSearchResult, ReleaseRecord};

/// Name reported as the search provider
pub const PROVIDER_NAME: &str = "MusicBrainz";

/// One search result per record, order preserved; untitled records keep an empty name
pub fn to_search_results(records: Vec<ReleaseRecord>) -> Vec<AlbumSearchResult> {
    records.into_iter().map(to_search_result).collect()
}

pub fn to_search_result(record: ReleaseRecord) -> AlbumSearchResult {
    let album_artist = record
        .artists
        .into_iter()
        .next()
        .map(|artist| ArtistSearchResult {
            search_provider_name: PROVIDER_NAME.to_string(),
            name: artist.name,
            artist_id: artist.artist_id,
        });

    AlbumSearchResult {
        search_provider_name: PROVIDER_NAME.to_string(),
        name: record.title.unwrap_or_default(),
        production_year: record.year,
        release_id: non_blank(Some(record.release_id)),
        release_group_id: non_blank(record.release_group_id),
        album_artist,
    }
}

fn non_blank(id: Option<String>) -> Option<String> {
    id.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArtistCredit;

    #[test]
    fn test_maps_first_artist_only() {
        let record = ReleaseRecord {
            release_id: "r1".to_string(),
            release_group_id: Some("g1".to_string()),
            title: Some("Bookends".to_string()),
            overview: Some("ignored".to_string()),
            year: Some(1968),
            artists: vec![
                ArtistCredit {
                    name: "Simon & Garfunkel".to_string(),
                    artist_id: Some("a1".to_string()),
                },
                ArtistCredit {
                    name: "Other".to_string(),
                    artist_id: Some("a2".to_string()),
                },
            ],
        };

        let result = to_search_result(record);
        assert_eq!(result.name, "Bookends");
        assert_eq!(result.production_year, Some(1968));
        assert_eq!(result.release_id.as_deref(), Some("r1"));
        assert_eq!(result.release_group_id.as_deref(), Some("g1"));
        assert_eq!(result.search_provider_name, PROVIDER_NAME);

        let artist = result.album_artist.unwrap();
        assert_eq!(artist.name, "Simon & Garfunkel");
        assert_eq!(artist.artist_id.as_deref(), Some("a1"));
    }

    #[test]
    fn test_untitled_record_still_emitted() {
        let results = to_search_results(vec![ReleaseRecord::new("r1"), ReleaseRecord::new("r2")]);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "");
        assert_eq!(results[0].album_artist, None);
        assert_eq!(results[1].release_id.as_deref(), Some("r2"));
        assert_eq!(results[1].release_group_id, None);
    }
}
