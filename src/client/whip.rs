//! WHIP signaling client
//!
//! Posts an SDP offer to an ingest endpoint and returns the SDP answer
//! carried in the response body.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, LOCATION};

/// MIME type of WHIP request and response bodies
pub const SDP_CONTENT_TYPE: &str = "application/sdp";

/// Error type for the offer/answer exchange
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignalingError {
    /// Ingest answered with a non-success status
    #[error("ingest returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// Request could not be sent or the response could not be read
    #[error("request failed: {0}")]
    Request(String),
    /// Answer body is not valid UTF-8
    #[error("answer is not valid UTF-8")]
    InvalidAnswer,
}

impl SignalingError {
    fn is_retryable(&self) -> bool {
        match self {
            SignalingError::Request(_) => true,
            SignalingError::Status { status, .. } => *status >= 500,
            SignalingError::InvalidAnswer => false,
        }
    }
}

/// WHIP client
#[derive(Debug, Clone)]
pub struct WhipClient {
    http: reqwest::Client,
    retries: u32,
    backoff: Duration,
}

impl Default for WhipClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WhipClient {
    /// Create a client that fails on the first error
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            retries: 0,
            backoff: Duration::from_millis(500),
        }
    }

    /// Retry transport errors and 5xx answers up to `retries` times,
    /// doubling `backoff` after each attempt
    pub fn with_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.retries = retries;
        self.backoff = backoff;
        self
    }

    /// POST `offer_sdp` to `url` and return the answer SDP
    pub async fn post_offer(&self, url: &str, offer_sdp: &str) -> Result<String, SignalingError> {
        let mut delay = self.backoff;
        let mut attempt = 0;

        loop {
            match self.post_once(url, offer_sdp).await {
                Ok(answer) => return Ok(answer),
                Err(e) if attempt < self.retries && e.is_retryable() => {
                    attempt += 1;
                    tracing::warn!(
                        url = url,
                        attempt = attempt,
                        retries = self.retries,
                        error = %e,
                        "WHIP POST failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post_once(&self, url: &str, offer_sdp: &str) -> Result<String, SignalingError> {
        tracing::debug!(url = url, bytes = offer_sdp.len(), "Sending WHIP POST");

        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, SDP_CONTENT_TYPE)
            .body(offer_sdp.to_owned())
            .send()
            .await
            .map_err(|e| SignalingError::Request(e.to_string()))?;

        let status = response.status();
        if let Some(location) = response.headers().get(LOCATION) {
            tracing::debug!(url = url, location = ?location, "WHIP resource created");
        }

        let body: Bytes = response
            .bytes()
            .await
            .map_err(|e| SignalingError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(SignalingError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        String::from_utf8(body.to_vec()).map_err(|_| SignalingError::InvalidAnswer)
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::Router;

    use super::*;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_post_offer_returns_answer() {
        let app = Router::new().route(
            "/cam2/whip",
            post(|headers: HeaderMap, body: String| async move {
                assert_eq!(headers.get(CONTENT_TYPE).unwrap(), SDP_CONTENT_TYPE);
                assert_eq!(body, "v=0 offer");
                (StatusCode::CREATED, "v=0 answer")
            }),
        );
        let addr = serve(app).await;

        let answer = WhipClient::new()
            .post_offer(&format!("http://{}/cam2/whip", addr), "v=0 offer")
            .await
            .unwrap();

        assert_eq!(answer, "v=0 answer");
    }

    #[tokio::test]
    async fn test_post_offer_error_status() {
        let app = Router::new().route(
            "/cam2/whip",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let addr = serve(app).await;

        let err = WhipClient::new()
            .post_offer(&format!("http://{}/cam2/whip", addr), "v=0")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            SignalingError::Status {
                status: 500,
                body: "boom".into()
            }
        );
    }

    #[tokio::test]
    async fn test_post_offer_retries_server_errors() {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);
        let app = Router::new().route(
            "/cam2/whip",
            post(move || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        (StatusCode::SERVICE_UNAVAILABLE, "busy".to_string())
                    } else {
                        (StatusCode::CREATED, "v=0 answer".to_string())
                    }
                }
            }),
        );
        let addr = serve(app).await;

        let answer = WhipClient::new()
            .with_retries(3, Duration::from_millis(5))
            .post_offer(&format!("http://{}/cam2/whip", addr), "v=0")
            .await
            .unwrap();

        assert_eq!(answer, "v=0 answer");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_errors_not_retried() {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);
        let app = Router::new().route(
            "/cam2/whip",
            post(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { StatusCode::BAD_REQUEST }
            }),
        );
        let addr = serve(app).await;

        let err = WhipClient::new()
            .with_retries(3, Duration::from_millis(5))
            .post_offer(&format!("http://{}/cam2/whip", addr), "v=0")
            .await
            .unwrap_err();

        assert!(matches!(err, SignalingError::Status { status: 400, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = WhipClient::new()
            .post_offer(&format!("http://{}/cam2/whip", addr), "v=0")
            .await
            .unwrap_err();

        assert!(matches!(err, SignalingError::Request(_)));
    }
}
