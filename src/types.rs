//! Type definitions for yt-comments
//!
//! Source of truth for all data structures.

use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Sort order: "Top comments"
pub const SORT_BY_POPULAR: usize = 0;
/// Sort order: "Newest first"
pub const SORT_BY_RECENT: usize = 1;

/// Separator used in reply comment ids ("<parent>.<reply>")
pub(crate) const REPLY_CID_SEPARATOR: char = '.';

// ============================================
// Output Types
// ============================================

/// A normalized comment, emitted once per raw record.
///
/// `time_parsed` and `paid` are omitted from the serialized JSON when
/// absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    /// Comment id, globally unique within the thread
    pub cid: String,
    pub text: String,
    /// Raw from YouTube, e.g., "2 hours ago"
    pub time: String,
    pub author: String,
    /// Author channel id
    pub channel: String,
    /// Raw like count; "0" when absent
    pub votes: String,
    pub replies: u64,
    /// URL to the author's avatar
    pub photo: String,
    /// Hearted by the video's creator
    pub heart: bool,
    /// True iff `cid` contains the reply separator
    pub reply: bool,
    /// Epoch seconds, present only when `time` was parseable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_parsed: Option<i64>,
    /// Paid-promotion disclosure text, when present for this id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid: Option<String>,
}

// ============================================
// Pagination Types
// ============================================

/// Opaque server-issued pagination cursor plus the API path it must be
/// posted to.
#[derive(Debug, Clone, PartialEq)]
pub struct Continuation {
    /// Relative API path, e.g. "/youtubei/v1/next"
    pub api_url: String,
    pub token: String,
}

impl Continuation {
    /// Parse a continuation endpoint object from page or API JSON.
    pub fn from_endpoint(endpoint: &Value) -> Option<Self> {
        let api_url = endpoint
            .get("commandMetadata")?
            .get("webCommandMetadata")?
            .get("apiUrl")?
            .as_str()?
            .to_string();
        let token = endpoint
            .get("continuationCommand")?
            .get("token")?
            .as_str()?
            .to_string();
        Some(Self { api_url, token })
    }
}

/// API key and request context extracted once per run from the page's
/// ytcfg blob. Shared by every request in the run.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub api_key: String,
    /// INNERTUBE_CONTEXT as-is (locale, client metadata)
    pub context: Value,
}

impl SessionContext {
    pub fn from_ytcfg(ytcfg: &Value) -> Option<Self> {
        let api_key = ytcfg.get("INNERTUBE_API_KEY")?.as_str()?.to_string();
        let context = ytcfg.get("INNERTUBE_CONTEXT")?.clone();
        Some(Self { api_key, context })
    }

    /// Override the client language before first use.
    pub fn set_language(&mut self, language: &str) {
        let Some(context) = self.context.as_object_mut() else {
            return;
        };
        let client = context
            .entry("client")
            .or_insert_with(|| Value::Object(Default::default()));
        if let Some(client) = client.as_object_mut() {
            client.insert("hl".to_string(), Value::String(language.to_string()));
        }
    }
}

// ============================================
// Option Types
// ============================================

/// Options for constructing a downloader instance
#[derive(Debug, Clone, Default)]
pub struct DownloaderOptions {
    /// Upstream proxy URI applied to both plain and encrypted connections
    pub proxy: Option<String>,
}

/// Per-run options for a comment download
#[derive(Debug, Clone)]
pub struct CommentOptions {
    /// 0 = top comments, 1 = newest first
    pub sort_by: usize,
    /// Language hint for server-rendered text (e.g. "en")
    pub language: Option<String>,
    /// Pause between paginated requests
    pub sleep: Duration,
}

impl Default for CommentOptions {
    fn default() -> Self {
        Self {
            sort_by: SORT_BY_RECENT,
            language: None,
            sleep: Duration::from_millis(100),
        }
    }
}
