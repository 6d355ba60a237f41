//! Publisher configuration

use std::time::Duration;

use url::Url;

use crate::scene::PixelFormat;

/// Ingest base used when none is configured
pub const DEFAULT_INGEST_BASE: &str = "http://localhost:8889";

/// Environment variable overriding the ingest base
pub const INGEST_BASE_ENV: &str = "WHIP_HOST";

/// Path segment appended after the stream name
pub const DEFAULT_ENDPOINT_SUFFIX: &str = "whip";

/// Stream publisher configuration
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Base URL of the ingest server
    pub ingest_base: String,

    /// Last path segment of the WHIP endpoint
    pub endpoint_suffix: String,

    /// Capture sink width in pixels
    pub video_width: u32,

    /// Capture sink height in pixels
    pub video_height: u32,

    /// Capture sink pixel layout
    pub pixel_format: PixelFormat,

    /// Wait after binding the capture sink before opening the peer session
    pub settle_delay: Duration,

    /// Extra attempts for the offer POST (0 = fail fast)
    pub post_retries: u32,

    /// Delay before the first POST retry, doubled on each attempt
    pub retry_backoff: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            ingest_base: DEFAULT_INGEST_BASE.to_string(),
            endpoint_suffix: DEFAULT_ENDPOINT_SUFFIX.to_string(),
            video_width: 1280,
            video_height: 720,
            pixel_format: PixelFormat::Bgra8Srgb,
            settle_delay: Duration::from_millis(100),
            post_retries: 0,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl PublisherConfig {
    /// Set the ingest base URL
    pub fn ingest_base(mut self, base: impl Into<String>) -> Self {
        self.ingest_base = base.into();
        self
    }

    /// Set the capture resolution
    pub fn capture_size(mut self, width: u32, height: u32) -> Self {
        self.video_width = width;
        self.video_height = height;
        self
    }

    /// Set the settle delay
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Enable bounded retry of the offer POST
    pub fn post_retries(mut self, retries: u32) -> Self {
        self.post_retries = retries;
        self
    }

    /// Set the delay before the first POST retry
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// WHIP endpoint for a camera: `{base}/{lower-cased name}/{suffix}`
    pub fn endpoint_for(&self, camera: &str) -> String {
        let base = self.ingest_base.trim_end_matches('/');
        let stream = camera.to_lowercase();

        if let Ok(mut url) = Url::parse(base) {
            let pushed = match url.path_segments_mut() {
                Ok(mut segments) => {
                    segments
                        .pop_if_empty()
                        .push(&stream)
                        .push(&self.endpoint_suffix);
                    true
                }
                Err(()) => false,
            };
            if pushed {
                return url.to_string();
            }
        }

        format!("{}/{}/{}", base, stream, self.endpoint_suffix)
    }
}
