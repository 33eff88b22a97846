use std::time::Duration;

use log::*;

const DEFAULT_BASE_URL: &str = "https://orderdesk.example.com/api/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_RETRIES: usize = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct OrderDeskConfig {
    /// Base URL for the OrderDesk REST API, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Number of retries *beyond* the first attempt for rate-limited or transport-failed requests.
    pub max_retries: usize,
    /// Base wait between retries. The actual wait is `backoff * 2^attempt`.
    pub backoff: Duration,
}

impl Default for OrderDeskConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl OrderDeskConfig {
    pub fn new(base_url: &str) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string(), ..Default::default() }
    }

    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("IVR_ORDERDESK_BASE_URL").unwrap_or_else(|_| {
            warn!("IVR_ORDERDESK_BASE_URL not set, using a (probably useless) default");
            DEFAULT_BASE_URL.to_string()
        });
        let max_retries = std::env::var("IVR_ORDERDESK_MAX_RETRIES")
            .ok()
            .and_then(|s| {
                s.parse::<usize>()
                    .map_err(|e| warn!("Invalid value for IVR_ORDERDESK_MAX_RETRIES ({s}): {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_MAX_RETRIES);
        let backoff = std::env::var("IVR_ORDERDESK_RETRY_BACKOFF_MS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("Invalid value for IVR_ORDERDESK_RETRY_BACKOFF_MS ({s}): {e}"))
                    .ok()
            })
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_BACKOFF);
        let timeout = std::env::var("IVR_ORDERDESK_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>().map_err(|e| warn!("Invalid value for IVR_ORDERDESK_TIMEOUT_SECS ({s}): {e}")).ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        Self { base_url: base_url.trim_end_matches('/').to_string(), timeout, max_retries, backoff }
    }
}
