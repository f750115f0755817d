//! Test Helper Utilities
//!
//! Mock MusicBrainz server for integration tests. Records every request path
//! (percent-decoded), its arrival time and the peak number of concurrent
//! exchanges. An exchange lasts until the last byte of its body is produced.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use brainz_album::{MusicBrainzAlbumProvider, RateLimitedDispatcher, ReleaseResolver};
use brainz_common::MusicBrainzConfig;
use futures::stream::{self, StreamExt};
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

type Responder = dyn Fn(&str, usize) -> (StatusCode, String) + Send + Sync;

/// One request seen by the mock server
#[derive(Debug, Clone)]
pub struct Hit {
    pub path: String,
    pub at: Instant,
}

struct MockState {
    responder: Box<Responder>,
    hits: Mutex<Vec<Hit>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Duration,
    body_pause: Option<Duration>,
}

/// Running mock catalog server
pub struct MockCatalog {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockCatalog {
    /// Start a server; `responder` receives the decoded path+query and the
    /// zero-based request index
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&str, usize) -> (StatusCode, String) + Send + Sync + 'static,
    {
        Self::launch(Duration::ZERO, None, responder).await
    }

    /// Like [`start`](Self::start), holding each response for `delay`
    pub async fn start_with_delay<F>(delay: Duration, responder: F) -> Self
    where
        F: Fn(&str, usize) -> (StatusCode, String) + Send + Sync + 'static,
    {
        Self::launch(delay, None, responder).await
    }

    /// Like [`start`](Self::start), sending the first half of each body at
    /// once and the rest after `pause`
    pub async fn start_streaming<F>(pause: Duration, responder: F) -> Self
    where
        F: Fn(&str, usize) -> (StatusCode, String) + Send + Sync + 'static,
    {
        Self::launch(Duration::ZERO, Some(pause), responder).await
    }

    async fn launch<F>(delay: Duration, body_pause: Option<Duration>, responder: F) -> Self
    where
        F: Fn(&str, usize) -> (StatusCode, String) + Send + Sync + 'static,
    {
        let state = Arc::new(MockState {
            responder: Box::new(responder),
            hits: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay,
            body_pause,
        });

        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.state.hits.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.hits().into_iter().map(|h| h.path).collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn config(&self, rate_limit_ms: u64) -> MusicBrainzConfig {
        MusicBrainzConfig::new(self.base_url.clone(), rate_limit_ms)
    }

    pub fn dispatcher(&self, rate_limit_ms: u64) -> Arc<RateLimitedDispatcher> {
        Arc::new(RateLimitedDispatcher::new(&self.config(rate_limit_ms)).unwrap())
    }

    pub fn resolver(&self, rate_limit_ms: u64) -> ReleaseResolver {
        ReleaseResolver::new(self.dispatcher(rate_limit_ms))
    }

    pub fn provider(&self, rate_limit_ms: u64) -> MusicBrainzAlbumProvider {
        MusicBrainzAlbumProvider::new(self.config(rate_limit_ms)).unwrap()
    }
}

async fn handle(State(state): State<Arc<MockState>>, uri: Uri) -> Response {
    let raw = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let path = urlencoding::decode(raw).map(|p| p.into_owned()).unwrap_or_else(|_| raw.to_string());

    let index = {
        let mut hits = state.hits.lock().unwrap();
        hits.push(Hit {
            path: path.clone(),
            at: Instant::now(),
        });
        hits.len() - 1
    };

    let current = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_in_flight.fetch_max(current, Ordering::SeqCst);

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    let (status, body) = (state.responder)(&path, index);
    let content_type = [(header::CONTENT_TYPE, "application/xml; charset=utf-8")];

    let Some(pause) = state.body_pause else {
        state.in_flight.fetch_sub(1, Ordering::SeqCst);
        return (status, content_type, body).into_response();
    };

    let mut split = body.len() / 2;
    while !body.is_char_boundary(split) {
        split -= 1;
    }
    let (head, tail) = (body[..split].to_string(), body[split..].to_string());

    let finished = Arc::clone(&state);
    let chunks = stream::once(async move { Ok::<_, Infallible>(head) }).chain(stream::once(async move {
        tokio::time::sleep(pause).await;
        finished.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(tail)
    }));

    (status, content_type, Body::from_stream(chunks)).into_response()
}

pub fn ok(body: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::OK, body.into())
}

pub fn throttled() -> (StatusCode, String) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        "<html><body>Your requests are exceeding the allowable rate limit.</body></html>".to_string(),
    )
}

/// `<metadata><release-list>` wrapping the given `<release>` elements
pub fn release_list(releases: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><metadata xmlns="http://musicbrainz.org/ns/mmd-2.0#"><release-list count="{}" offset="0">{}</release-list></metadata>"#,
        releases.len(),
        releases.concat()
    )
}

/// A fully populated `<release>` element
pub fn release(id: &str, group_id: &str, title: &str, date: &str, artist: (&str, &str)) -> String {
    format!(
        r#"<release id="{id}"><title>{title}</title><status>Official</status><artist-credit><name-credit><artist id="{artist_id}"><name>{artist_name}</name><sort-name>{artist_name}</sort-name></artist></name-credit></artist-credit><release-group id="{group_id}" type="Album"><title>{title}</title></release-group><date>{date}</date><annotation>About {title}</annotation></release>"#,
        id = id,
        group_id = group_id,
        title = title,
        date = date,
        artist_id = artist.0,
        artist_name = artist.1,
    )
}

/// A `<release>` element without a release group
pub fn bare_release(id: &str, title: &str) -> String {
    format!(r#"<release id="{}"><title>{}</title></release>"#, id, title)
}

pub fn release_group_list(group_ids: &[&str]) -> String {
    let groups: String = group_ids
        .iter()
        .map(|id| format!(r#"<release-group id="{}"><title>Group</title></release-group>"#, id))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><metadata><release-group-list count="{}">{}</release-group-list></metadata>"#,
        group_ids.len(),
        groups
    )
}
