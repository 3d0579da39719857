//! HTTP plumbing shared by every request in a run
//!
//! One client per downloader instance. Carries a fixed browser identity
//! and the consent cookie that preempts the cookie interstitial for most
//! locales.

use crate::error::{Result, YtCommentsError};
use crate::types::{Continuation, DownloaderOptions, SessionContext};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const CONSENT_COOKIE: &str = "CONSENT=YES+cb";

const YOUTUBE_BASE_URL: &str = "https://www.youtube.com";
const YOUTUBE_CONSENT_URL: &str = "https://consent.youtube.com/save";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const AJAX_RETRIES: u32 = 5;
const AJAX_RETRY_DELAY: Duration = Duration::from_secs(20);

/// Browser-like HTTP client owned by a single downloader instance
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
    consent_url: String,
}

impl HttpClient {
    pub fn new(options: &DownloaderOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static(CONSENT_COOKIE));

        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT);

        if let Some(ref uri) = options.proxy {
            let proxy = reqwest::Proxy::all(uri)
                .map_err(|e| YtCommentsError::InvalidConfig(format!("invalid proxy URI: {e}")))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            inner: builder.build()?,
            base_url: YOUTUBE_BASE_URL.to_string(),
            consent_url: YOUTUBE_CONSENT_URL.to_string(),
        })
    }

    /// Point all traffic, including the consent-save endpoint, at a
    /// different host. Used by tests against a local server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.base_url = base.to_string();
        self.consent_url = format!("{base}/save");
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn consent_url(&self) -> &str {
        &self.consent_url
    }

    pub async fn get(&self, url: &str) -> reqwest::Result<reqwest::Response> {
        self.inner.get(url).send().await
    }

    /// POST with an empty body and the given query parameters
    /// (the consent-save endpoint takes its fields this way).
    pub async fn post_params(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> reqwest::Result<reqwest::Response> {
        self.inner.post(url).query(params).send().await
    }

    /// Redeem one continuation against the browser API.
    ///
    /// Transient failures and timeouts are retried; a 403 or 413 is
    /// definitive and returns None right away. None always means
    /// "no data" and ends pagination cleanly, never an error.
    pub async fn ajax_request(
        &self,
        endpoint: &Continuation,
        cfg: &SessionContext,
    ) -> Option<Value> {
        self.ajax_request_with(endpoint, cfg, AJAX_RETRIES, AJAX_RETRY_DELAY)
            .await
    }

    pub(crate) async fn ajax_request_with(
        &self,
        endpoint: &Continuation,
        cfg: &SessionContext,
        retries: u32,
        retry_delay: Duration,
    ) -> Option<Value> {
        let url = format!("{}{}", self.base_url, endpoint.api_url);
        let body = json!({
            "context": cfg.context,
            "continuation": endpoint.token,
        });

        for attempt in 0..retries {
            let result = self
                .inner
                .post(&url)
                .query(&[("key", cfg.api_key.as_str())])
                .json(&body)
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        match response.json::<Value>().await {
                            Ok(data) => return Some(data),
                            Err(e) => eprintln!("Error decoding ajax response: {e}"),
                        }
                    } else if status == StatusCode::FORBIDDEN
                        || status == StatusCode::PAYLOAD_TOO_LARGE
                    {
                        return None;
                    }
                    // Any other status: retry
                }
                Err(e) => {
                    if !e.is_timeout() {
                        eprintln!("Error in ajax request: {e}");
                    }
                }
            }

            if attempt + 1 < retries {
                tokio::time::sleep(retry_delay).await;
            }
        }

        None
    }
}
