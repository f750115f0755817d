//! Release resolution cascade
//!
//! Chooses which query to send from the identifiers already known:
//! 1. release id known: nothing to look up beyond a missing release group
//! 2. release group known: first release of the group
//! 3. artist id known: exact album title AND artist id
//! 4. artist name known: exact album title AND artist name
//!
//! A release found without its group is then upgraded with a release-group
//! lookup. Responses with a non-success status count as "nothing found".

use crate::decoder::{decode_first_release_group_id, decode_releases};
use crate::dispatcher::RateLimitedDispatcher;
use crate::error::{MbError, MbResult};
use crate::models::{AlbumMetadata, ReleaseRecord};
use crate::query::{self, ResolutionQuery};
use futures::TryStreamExt;
use reqwest::Response;
use std::io;
use std::sync::Arc;
use tokio::io::AsyncBufRead;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct ReleaseResolver {
    dispatcher: Arc<RateLimitedDispatcher>,
}

impl ReleaseResolver {
    pub fn new(dispatcher: Arc<RateLimitedDispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<RateLimitedDispatcher> {
        &self.dispatcher
    }

    /// Resolve release / release-group ids, year and overview
    pub async fn resolve(
        &self,
        query: &ResolutionQuery,
        cancel: &CancellationToken,
    ) -> MbResult<AlbumMetadata> {
        if !query.is_resolvable() {
            debug!("Not enough identifiers to query MusicBrainz");
            return Ok(AlbumMetadata::default());
        }

        let mut release_id = query.release_id.clone();
        let mut release_group_id = query.release_group_id.clone();
        let mut metadata = AlbumMetadata::default();

        if release_id.is_none() {
            if let Some(group_id) = &release_group_id {
                debug!(release_group_id = %group_id, "Resolving release from release group");
                let path = query::releases_in_group_path(group_id);
                release_id = self
                    .first_release(&path, cancel)
                    .await?
                    .map(|record| record.release_id)
                    .filter(|id| !id.is_empty());
            }
        }

        if release_id.is_none() {
            if let Some(path) = query.album_artist_path() {
                debug!(
                    album = ?query.album_name,
                    artist_id = ?query.artist_id,
                    artist = ?query.artist_name,
                    "Searching release by album and artist"
                );

                if let Some(record) = self.first_release(&path, cancel).await? {
                    if !record.release_id.is_empty() {
                        release_id = Some(record.release_id);
                    }
                    if record.release_group_id.is_some() {
                        release_group_id = record.release_group_id;
                    }
                    metadata.production_year = record.year;
                    metadata.overview = record.overview;
                }
            }
        }

        if let (Some(id), None) = (&release_id, &release_group_id) {
            debug!(release_id = %id, "Looking up release group for release");
            release_group_id = self.release_group_for_release(id, cancel).await?;
        }

        metadata.has_metadata = release_id.is_some() || release_group_id.is_some();
        metadata.release_id = release_id;
        metadata.release_group_id = release_group_id;

        if metadata.has_metadata {
            info!(
                release_id = ?metadata.release_id,
                release_group_id = ?metadata.release_group_id,
                year = ?metadata.production_year,
                "Resolved MusicBrainz release"
            );
        }

        Ok(metadata)
    }

    /// Release records for a search listing
    pub async fn search(
        &self,
        query: &ResolutionQuery,
        cancel: &CancellationToken,
    ) -> MbResult<Vec<ReleaseRecord>> {
        let Some(path) = query.search_path() else {
            debug!("Not enough identifiers to search MusicBrainz");
            return Ok(Vec::new());
        };

        self.fetch_releases(&path, cancel).await
    }

    /// Release-group id of a release, via a release-group search
    pub async fn release_group_for_release(
        &self,
        release_id: &str,
        cancel: &CancellationToken,
    ) -> MbResult<Option<String>> {
        let path = query::release_group_by_release_id_path(release_id);
        let path = path.as_str();

        self.dispatcher
            .fetch_with(path, cancel, |response| async move {
                let Some(body) = usable_body(response, path) else {
                    return Ok(None);
                };
                decode_first_release_group_id(body)
                    .await
                    .map(|group_id| group_id.filter(|id| !id.is_empty()))
                    .map_err(MbError::from)
            })
            .await
    }

    /// Decode the releases of `path`; the body is streamed into the decoder
    /// while the dispatcher permit is still held
    pub async fn fetch_releases(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> MbResult<Vec<ReleaseRecord>> {
        self.dispatcher
            .fetch_with(path, cancel, |response| async move {
                let Some(body) = usable_body(response, path) else {
                    return Ok(Vec::new());
                };
                decode_releases(body).await.map_err(MbError::from)
            })
            .await
    }

    async fn first_release(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> MbResult<Option<ReleaseRecord>> {
        Ok(self.fetch_releases(path, cancel).await?.into_iter().next())
    }
}

/// Streaming body of a successful response; `None` when the server had
/// nothing usable (throttled after all retries, not found, server error)
fn usable_body(response: Response, path: &str) -> Option<impl AsyncBufRead + Unpin> {
    let status = response.status();

    if !status.is_success() {
        warn!(
            status = status.as_u16(),
            path = %path,
            "MusicBrainz returned no usable response, treating as no match"
        );
        return None;
    }

    let stream = response
        .bytes_stream()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
    Some(StreamReader::new(Box::pin(stream)))
}
