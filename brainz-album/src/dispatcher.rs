//! Rate-limited request dispatcher for the MusicBrainz web service
//!
//! All requests share one permit, held until the caller has finished with the
//! response body, so at most one exchange is in flight per dispatcher. Before
//! each attempt the dispatcher waits until the configured interval has passed
//! since the previous request *started*. A 503 response
//! means the server is throttling us and the request is retried in place.

use crate::error::{MbError, MbResult};
use brainz_common::MusicBrainzConfig;
use reqwest::{Client, Response, StatusCode};
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Attempts per request while the server answers 503 Service Unavailable
pub const MAX_ATTEMPTS: u32 = 5;

/// Request clock, only touched while the permit is held
struct RequestClock {
    last_request: Option<Instant>,
}

/// Serialising, interval-enforcing HTTP GET dispatcher
pub struct RateLimitedDispatcher {
    http_client: Client,
    base_url: String,
    min_interval: Duration,
    permit: Mutex<RequestClock>,
}

impl RateLimitedDispatcher {
    pub fn new(config: &MusicBrainzConfig) -> MbResult<Self> {
        let http_client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MbError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.server_url().to_string(),
            min_interval: Duration::from_millis(config.effective_rate_limit()),
            permit: Mutex::new(RequestClock { last_request: None }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// GET `base_url + path` and hand the response to `consume`
    ///
    /// The permit stays held until `consume` finishes, so a streamed body is
    /// read to the end before anyone else may send. `consume` receives the
    /// last response once the server stops throttling or [`MAX_ATTEMPTS`] is
    /// reached; a 503 after the final attempt is passed on as-is rather than as
    /// an error. Transport failures are not retried. Cancellation aborts waiting
    /// for the permit, the interval delay, the request and `consume`.
    pub async fn fetch_with<T, F, Fut>(
        &self,
        path: &str,
        cancel: &CancellationToken,
        consume: F,
    ) -> MbResult<T>
    where
        F: FnOnce(Response) -> Fut,
        Fut: Future<Output = MbResult<T>>,
    {
        let mut clock = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(MbError::Cancelled),
            guard = self.permit.lock() => guard,
        };

        let response = self.send(&mut clock, path, cancel).await?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(MbError::Cancelled),
            output = consume(response) => output,
        }
    }

    async fn send(
        &self,
        clock: &mut RequestClock,
        path: &str,
        cancel: &CancellationToken,
    ) -> MbResult<Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            if let Some(last) = clock.last_request {
                let elapsed = last.elapsed();
                if elapsed < self.min_interval {
                    let delay = self.min_interval - elapsed;
                    debug!(delay_ms = delay.as_millis() as u64, "Rate limiting: waiting before MusicBrainz request");
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(MbError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }

            // Gap since the previous request start
            debug!(
                url = %url,
                attempt,
                since_previous_ms = clock.last_request.map(|t| t.elapsed().as_millis() as u64),
                "Sending MusicBrainz request"
            );
            clock.last_request = Some(Instant::now());

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(MbError::Cancelled),
                result = self.http_client.get(&url).send() => {
                    result.map_err(|e| MbError::NetworkError(e.to_string()))?
                }
            };

            if response.status() != StatusCode::SERVICE_UNAVAILABLE {
                return Ok(response);
            }

            if attempt >= MAX_ATTEMPTS {
                error!(
                    url = %url,
                    attempts = attempt,
                    "503 Service Unavailable (throttled) response received {} times",
                    attempt
                );
                return Ok(response);
            }

            warn!(url = %url, attempt, "MusicBrainz throttled request (503), retrying");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainz_common::config::DEFAULT_SERVER;

    #[test]
    fn test_public_server_interval_is_clamped() {
        let dispatcher = RateLimitedDispatcher::new(&MusicBrainzConfig::new(DEFAULT_SERVER, 10)).unwrap();
        assert_eq!(dispatcher.min_interval(), Duration::from_millis(2000));
        assert_eq!(dispatcher.base_url(), "https://musicbrainz.org");
    }

    #[test]
    fn test_mirror_interval_is_kept() {
        let dispatcher =
            RateLimitedDispatcher::new(&MusicBrainzConfig::new("http://mirror.lan:5000/", 0)).unwrap();
        assert_eq!(dispatcher.min_interval(), Duration::ZERO);
        assert_eq!(dispatcher.base_url(), "http://mirror.lan:5000");
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let dispatcher = RateLimitedDispatcher::new(&MusicBrainzConfig::new("http://127.0.0.1:9", 0)).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = dispatcher
            .fetch_with("/ws/2/release", &cancel, |response| async move { Ok(response.status()) })
            .await;
        assert!(matches!(result, Err(MbError::Cancelled)));
    }
}
