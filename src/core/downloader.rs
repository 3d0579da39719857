//! Continuation-driven comment pagination
//!
//! A watch page seeds a work queue with one continuation per chosen sort
//! order; every response may carry comments plus further continuations.
//! Top-level comment pages are front-inserted so they finish before any
//! single thread's replies are expanded; reply expansions go to the back
//! and are drained eventually.

use crate::core::bootstrap;
use crate::core::client::HttpClient;
use crate::core::normalize::normalize_comment;
use crate::error::{Result, YtCommentsError};
use crate::types::{Comment, CommentOptions, Continuation, DownloaderOptions, SessionContext};
use crate::utils::search::search_dict;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// Continuation targets addressing the top-level comment section
const COMMENT_SECTION_TARGETS: [&str; 3] = [
    "comments-section",
    "engagement-panel-comments-section",
    "shorts-engagement-panel-comments-section",
];
/// Continuation target prefix for a single comment's reply thread
const COMMENT_REPLIES_TARGET_PREFIX: &str = "comment-replies-item";

/// Downloads comment threads from watch pages via the browser API.
///
/// Each instance owns its HTTP client; independent instances share no
/// state.
pub struct YoutubeCommentDownloader {
    http: HttpClient,
}

impl YoutubeCommentDownloader {
    pub fn new(options: &DownloaderOptions) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(options)?,
        })
    }

    /// Redirect all traffic to a different host. Used by tests.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    /// Stream the comments of a video by id.
    pub async fn get_comments(
        &self,
        youtube_id: &str,
        options: &CommentOptions,
    ) -> Result<CommentStream<'_>> {
        let url = format!("{}/watch?v={}", self.http.base_url(), youtube_id);
        self.get_comments_from_url(&url, options).await
    }

    /// Stream the comments of a full watch-page URL.
    ///
    /// Silent empty-result conditions (unreachable page, missing or
    /// malformed embedded state, comments disabled) return a stream that
    /// yields nothing. An unresolvable sort order is an error.
    pub async fn get_comments_from_url(
        &self,
        youtube_url: &str,
        options: &CommentOptions,
    ) -> Result<CommentStream<'_>> {
        let Some(html) = bootstrap::fetch_page(&self.http, youtube_url).await else {
            return Ok(CommentStream::empty(&self.http, options.sleep));
        };

        let Some(cfg) = bootstrap::extract_config(&html) else {
            eprintln!("Unable to extract YouTube configuration");
            return Ok(CommentStream::empty(&self.http, options.sleep));
        };
        let Some(mut cfg) = SessionContext::from_ytcfg(&cfg) else {
            eprintln!("Unable to extract YouTube configuration");
            return Ok(CommentStream::empty(&self.http, options.sleep));
        };
        if let Some(ref language) = options.language {
            cfg.set_language(language);
        }

        let Some(data) = bootstrap::extract_initial_data(&html) else {
            eprintln!("Unable to extract initial data");
            return Ok(CommentStream::empty(&self.http, options.sleep));
        };

        match self.resolve_sort(&data, &cfg, options.sort_by).await? {
            Some(seed) => Ok(CommentStream::new(&self.http, cfg, seed, options.sleep)),
            // Comments disabled for this content
            None => Ok(CommentStream::empty(&self.http, options.sleep)),
        }
    }

    /// Resolve the requested sort index into the starting continuation.
    ///
    /// Ok(None) means the content has no comment section at all. A menu
    /// that cannot be found (even after one extra round trip) or an
    /// out-of-range index fails loudly.
    async fn resolve_sort(
        &self,
        data: &Value,
        cfg: &SessionContext,
        sort_by: usize,
    ) -> Result<Option<Continuation>> {
        let Some(item_section) = search_dict(data, "itemSectionRenderer").next() else {
            return Ok(None);
        };
        if search_dict(item_section, "continuationItemRenderer")
            .next()
            .is_none()
        {
            return Ok(None);
        }

        let mut sort_menu = sort_menu_endpoints(data);

        if sort_menu.is_empty() {
            // Community posts carry the sort menu one request away
            let continuation = search_dict(data, "sectionListRenderer")
                .next()
                .and_then(|section_list| {
                    search_dict(section_list, "continuationEndpoint").next()
                })
                .and_then(Continuation::from_endpoint);

            if let Some(continuation) = continuation {
                if let Some(response) = self.http.ajax_request(&continuation, cfg).await {
                    sort_menu = sort_menu_endpoints(&response);
                }
            }
        }

        if sort_menu.is_empty() || sort_by >= sort_menu.len() {
            return Err(YtCommentsError::Sorting(format!(
                "no sort option at index {sort_by}"
            )));
        }

        Continuation::from_endpoint(&sort_menu[sort_by])
            .map(Some)
            .ok_or_else(|| {
                YtCommentsError::Sorting(format!("sort option {sort_by} has no endpoint"))
            })
    }
}

/// The serviceEndpoint of every entry in the first sort menu found.
fn sort_menu_endpoints(data: &Value) -> Vec<Value> {
    search_dict(data, "sortFilterSubMenuRenderer")
        .next()
        .and_then(|menu| menu.get("subMenuItems"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| item.get("serviceEndpoint").cloned().unwrap_or(Value::Null))
                .collect()
        })
        .unwrap_or_default()
}

/// Pull-based stream of normalized comments.
///
/// Each call to [`next`](Self::next) pops at most one continuation off
/// the work queue and issues one paginated request; nothing is fetched
/// until the consumer asks. Dropping the stream abandons the remaining
/// queue.
pub struct CommentStream<'a> {
    http: &'a HttpClient,
    /// None makes the stream permanently empty
    cfg: Option<SessionContext>,
    queue: VecDeque<Continuation>,
    ready: VecDeque<Comment>,
    sleep: Duration,
    fetched_once: bool,
}

impl<'a> CommentStream<'a> {
    fn new(http: &'a HttpClient, cfg: SessionContext, seed: Continuation, sleep: Duration) -> Self {
        Self {
            http,
            cfg: Some(cfg),
            queue: VecDeque::from([seed]),
            ready: VecDeque::new(),
            sleep,
            fetched_once: false,
        }
    }

    fn empty(http: &'a HttpClient, sleep: Duration) -> Self {
        Self {
            http,
            cfg: None,
            queue: VecDeque::new(),
            ready: VecDeque::new(),
            sleep,
            fetched_once: false,
        }
    }

    /// The next comment, or None once the stream is exhausted.
    ///
    /// "No data" from the endpoint ends the stream cleanly; a server-side
    /// error marker in a response interrupts it with an error and ends it
    /// for good.
    pub async fn next(&mut self) -> Result<Option<Comment>> {
        loop {
            if let Some(comment) = self.ready.pop_front() {
                return Ok(Some(comment));
            }

            let Some(cfg) = self.cfg.as_ref() else {
                return Ok(None);
            };
            let Some(continuation) = self.queue.pop_front() else {
                return Ok(None);
            };

            if self.fetched_once && !self.sleep.is_zero() {
                tokio::time::sleep(self.sleep).await;
            }
            self.fetched_once = true;

            let Some(response) = self.http.ajax_request(&continuation, cfg).await else {
                self.queue.clear();
                return Ok(None);
            };

            if let Err(e) = process_response(&response, &mut self.queue, &mut self.ready) {
                // Fuse the stream; a caller that swallows the error must
                // not resume pagination on the next call.
                self.cfg = None;
                self.queue.clear();
                self.ready.clear();
                return Err(e);
            }
        }
    }
}

/// Digest one paginated response: re-queue discovered continuations with
/// their priority, then buffer the normalized comments it carries.
fn process_response(
    response: &Value,
    queue: &mut VecDeque<Continuation>,
    ready: &mut VecDeque<Comment>,
) -> Result<()> {
    if let Some(error) = search_dict(response, "externalErrorMessage").next() {
        return Err(YtCommentsError::Server(
            error.as_str().unwrap_or_default().to_string(),
        ));
    }

    let actions: Vec<&Value> = search_dict(response, "reloadContinuationItemsCommand")
        .chain(search_dict(response, "appendContinuationItemsAction"))
        .collect();

    for action in actions {
        let target_id = action
            .get("targetId")
            .and_then(Value::as_str)
            .unwrap_or("");
        let Some(items) = action.get("continuationItems").and_then(Value::as_array) else {
            continue;
        };

        for item in items {
            if COMMENT_SECTION_TARGETS.contains(&target_id) {
                // Front-insert the whole batch as a unit, keeping its
                // internal order: top-level pages before reply threads.
                let batch: Vec<Continuation> = search_dict(item, "continuationEndpoint")
                    .filter_map(Continuation::from_endpoint)
                    .collect();
                for continuation in batch.into_iter().rev() {
                    queue.push_front(continuation);
                }
            }

            if target_id.starts_with(COMMENT_REPLIES_TARGET_PREFIX)
                && item.get("continuationItemRenderer").is_some()
            {
                // A "Show more replies" button under one comment
                let command = search_dict(item, "buttonRenderer")
                    .next()
                    .and_then(|button| button.get("command"))
                    .and_then(Continuation::from_endpoint);
                if let Some(continuation) = command {
                    queue.push_back(continuation);
                }
            }
        }
    }

    let payments = extract_payments(response);
    let toolbar_states = extract_toolbar_states(response);

    // The payload lists comments back-to-front (a consequence of the LIFO
    // tree search); reverse to emit them in display order.
    let raw_comments: Vec<&Value> = search_dict(response, "commentEntityPayload").collect();
    for raw in raw_comments.into_iter().rev() {
        if let Some(comment) = normalize_comment(raw, &toolbar_states, &payments) {
            ready.push_back(comment);
        }
    }

    Ok(())
}

/// Paid-promotion disclosures, keyed first by surface key and then
/// remapped to the comment ids the response's view models tie them to.
/// When a direct id mapping already exists, the last write wins.
fn extract_payments(response: &Value) -> HashMap<String, String> {
    let mut payments = HashMap::new();
    let mut surface_order = Vec::new();

    for payload in search_dict(response, "commentSurfaceEntityPayload") {
        if payload.get("pdgCommentChip").is_none() {
            continue;
        }
        let Some(key) = payload.get("key").and_then(Value::as_str) else {
            continue;
        };
        let text = search_dict(payload, "simpleText")
            .next()
            .and_then(Value::as_str)
            .unwrap_or("");
        payments.insert(key.to_string(), text.to_string());
        surface_order.push(key.to_string());
    }

    if payments.is_empty() {
        return payments;
    }

    let mut surface_keys: HashMap<String, String> = HashMap::new();
    for wrapper in search_dict(response, "commentViewModel") {
        let Some(view_model) = wrapper.get("commentViewModel") else {
            continue;
        };
        let surface_key = view_model
            .get("commentSurfaceKey")
            .and_then(Value::as_str);
        let comment_id = view_model.get("commentId").and_then(Value::as_str);
        if let (Some(surface_key), Some(comment_id)) = (surface_key, comment_id) {
            surface_keys.insert(surface_key.to_string(), comment_id.to_string());
        }
    }

    for key in surface_order {
        if let Some(comment_id) = surface_keys.get(&key) {
            if let Some(text) = payments.get(&key).cloned() {
                payments.insert(comment_id.clone(), text);
            }
        }
    }

    payments
}

/// Liked/hearted flags, keyed by the state key each comment references.
fn extract_toolbar_states(response: &Value) -> HashMap<String, &Value> {
    search_dict(response, "engagementToolbarStateEntityPayload")
        .filter_map(|payload| {
            payload
                .get("key")
                .and_then(Value::as_str)
                .map(|key| (key.to_string(), payload))
        })
        .collect()
}
