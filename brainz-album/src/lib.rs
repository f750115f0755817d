//! brainz-album library interface
//!
//! Resolves album releases against a MusicBrainz server:
//! - [`dispatcher`]: serialised, rate-limited HTTP GETs with 503 retry
//! - [`decoder`]: streaming XML walk producing [`ReleaseRecord`]s
//! - [`resolver`]: identifier cascade producing [`AlbumMetadata`]
//! - [`mapper`]: records to search listing rows
//! - [`provider`]: the `search` / `resolve` facade used by hosts
//! - [`logging`]: tracing setup for the CLI

pub mod criteria;
pub mod decoder;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod mapper;
pub mod models;
pub mod provider;
pub mod query;
pub mod resolver;

pub use crate::criteria::{AlbumCriteria, ProviderKey, TrackCriteria};
pub use crate::dispatcher::RateLimitedDispatcher;
pub use crate::error::{DecodeError, MbError, MbResult};
pub use crate::models::{AlbumMetadata, AlbumSearchResult, ArtistCredit, ArtistSearchResult, ReleaseRecord};
pub use crate::provider::MusicBrainzAlbumProvider;
pub use crate::query::ResolutionQuery;
pub use crate::resolver::ReleaseResolver;
