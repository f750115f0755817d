//! Host-facing album provider
//!
//! Wraps the resolution cascade behind `search` and `resolve`. Lookup failures
//! are logged and reported as "nothing found"; only cancellation propagates.

use crate::criteria::{AlbumCriteria, ProviderKey};
use crate::dispatcher::RateLimitedDispatcher;
use crate::error::{MbError, MbResult};
use crate::mapper::{to_search_results, PROVIDER_NAME};
use crate::models::{AlbumMetadata, AlbumSearchResult};
use crate::query::ResolutionQuery;
use crate::resolver::ReleaseResolver;
use brainz_common::MusicBrainzConfig;
use reqwest::Response;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::error;

pub struct MusicBrainzAlbumProvider {
    config: MusicBrainzConfig,
    resolver: ReleaseResolver,
}

impl MusicBrainzAlbumProvider {
    pub fn new(config: MusicBrainzConfig) -> MbResult<Self> {
        let dispatcher = Arc::new(RateLimitedDispatcher::new(&config)?);
        Ok(Self::with_dispatcher(config, dispatcher))
    }

    /// Share one dispatcher (and so one rate limit) between providers
    pub fn with_dispatcher(config: MusicBrainzConfig, dispatcher: Arc<RateLimitedDispatcher>) -> Self {
        Self {
            config,
            resolver: ReleaseResolver::new(dispatcher),
        }
    }

    pub fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    pub fn config(&self) -> &MusicBrainzConfig {
        &self.config
    }

    pub async fn search(
        &self,
        criteria: &AlbumCriteria,
        cancel: &CancellationToken,
    ) -> MbResult<Vec<AlbumSearchResult>> {
        let query = ResolutionQuery::from_criteria(criteria);

        match self.resolver.search(&query, cancel).await {
            Ok(records) => Ok(to_search_results(records)),
            Err(MbError::Cancelled) => Err(MbError::Cancelled),
            Err(e) => {
                error!(album = %criteria.name, error = %e, "MusicBrainz search failed");
                Ok(Vec::new())
            }
        }
    }

    pub async fn resolve(
        &self,
        criteria: &AlbumCriteria,
        cancel: &CancellationToken,
    ) -> MbResult<AlbumMetadata> {
        let query = ResolutionQuery::from_criteria(criteria);

        match self.resolver.resolve(&query, cancel).await {
            Err(MbError::Cancelled) => Err(MbError::Cancelled),
            Err(e) => {
                error!(album = %criteria.name, error = %e, "MusicBrainz metadata lookup failed");
                Ok(AlbumMetadata::default())
            }
            ok => ok,
        }
    }

    /// Cover art is served by a different provider
    pub async fn get_image_response(&self, _url: &str) -> MbResult<Response> {
        Err(MbError::Unsupported("image retrieval"))
    }

    /// Website link for an identifier, e.g. `https://musicbrainz.org/release/<id>`
    pub fn external_url(&self, key: ProviderKey, id: &str) -> String {
        format!("{}/{}/{}", self.config.server_url(), key.entity(), id)
    }
}
