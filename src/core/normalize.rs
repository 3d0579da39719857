//! Raw comment payload to output-schema mapping

use crate::types::{Comment, REPLY_CID_SEPARATOR};
use crate::utils::time::parse_relative_time;
use serde_json::Value;
use std::collections::HashMap;

const HEARTED_STATE: &str = "TOOLBAR_HEART_STATE_HEARTED";

/// Map one raw commentEntityPayload, plus the response's side tables,
/// onto the output schema.
///
/// Returns None when the payload carries no comment id. Pure: the same
/// inputs always produce the same Comment.
pub fn normalize_comment(
    raw: &Value,
    toolbar_states: &HashMap<String, &Value>,
    payments: &HashMap<String, String>,
) -> Option<Comment> {
    let properties = raw.get("properties")?;
    let cid = properties.get("commentId")?.as_str()?.to_string();
    if cid.is_empty() {
        return None;
    }

    let author = raw.get("author");
    let toolbar = raw.get("toolbar");
    let toolbar_state = properties
        .get("toolbarStateKey")
        .and_then(Value::as_str)
        .and_then(|key| toolbar_states.get(key).copied());

    let text = properties
        .get("content")
        .and_then(|c| c.get("content"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let time = properties
        .get("publishedTime")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let votes = toolbar
        .and_then(|t| t.get("likeCountNotliked"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("0")
        .to_string();
    let replies = toolbar
        .and_then(|t| t.get("replyCount"))
        .map(leading_int)
        .unwrap_or(0);
    let heart = toolbar_state
        .and_then(|state| state.get("heartState"))
        .and_then(Value::as_str)
        == Some(HEARTED_STATE);

    Some(Comment {
        reply: cid.contains(REPLY_CID_SEPARATOR),
        time_parsed: parse_relative_time(&time),
        paid: payments.get(&cid).cloned(),
        text,
        time,
        author: author
            .and_then(|a| a.get("displayName"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        channel: author
            .and_then(|a| a.get("channelId"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        photo: author
            .and_then(|a| a.get("avatarThumbnailUrl"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        votes,
        replies,
        heart,
        cid,
    })
}

/// Leading non-negative integer of a count field, 0 when none.
/// Counts arrive as strings like "1.2K" or occasionally as numbers.
fn leading_int(value: &Value) -> u64 {
    if let Some(n) = value.as_u64() {
        return n;
    }
    let Some(s) = value.as_str() else {
        return 0;
    };
    let digits: String = s
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_comment() -> Value {
        json!({
            "properties": {
                "commentId": "c1",
                "content": { "content": "Nice video" },
                "publishedTime": "2 hours ago",
                "toolbarStateKey": "t1",
            },
            "author": {
                "displayName": "Alice",
                "channelId": "UC123",
                "avatarThumbnailUrl": "https://example.com/a.jpg",
            },
            "toolbar": {
                "likeCountNotliked": "3",
                "replyCount": "5",
            },
        })
    }

    #[test]
    fn test_full_record() {
        let raw = raw_comment();
        let comment = normalize_comment(&raw, &HashMap::new(), &HashMap::new()).unwrap();

        assert_eq!(comment.cid, "c1");
        assert_eq!(comment.text, "Nice video");
        assert_eq!(comment.time, "2 hours ago");
        assert_eq!(comment.author, "Alice");
        assert_eq!(comment.channel, "UC123");
        assert_eq!(comment.votes, "3");
        assert_eq!(comment.replies, 5);
        assert_eq!(comment.photo, "https://example.com/a.jpg");
        assert!(!comment.heart);
        assert!(!comment.reply);
        assert!(comment.time_parsed.is_some());
        assert!(comment.paid.is_none());
    }

    #[test]
    fn test_defaults_for_sparse_record() {
        let raw = json!({ "properties": { "commentId": "c2" } });
        let comment = normalize_comment(&raw, &HashMap::new(), &HashMap::new()).unwrap();

        assert_eq!(comment.cid, "c2");
        assert_eq!(comment.text, "");
        assert_eq!(comment.votes, "0");
        assert_eq!(comment.replies, 0);
        assert!(!comment.heart);
        assert_eq!(comment.time_parsed, None);
    }

    #[test]
    fn test_missing_id_skipped() {
        let raw = json!({ "properties": { "content": { "content": "orphan" } } });
        assert!(normalize_comment(&raw, &HashMap::new(), &HashMap::new()).is_none());
    }

    #[test]
    fn test_reply_detected_from_cid() {
        let raw = json!({ "properties": { "commentId": "c1.r1" } });
        let comment = normalize_comment(&raw, &HashMap::new(), &HashMap::new()).unwrap();
        assert!(comment.reply);
    }

    #[test]
    fn test_heart_from_toolbar_state() {
        let raw = raw_comment();
        let hearted = json!({ "key": "t1", "heartState": "TOOLBAR_HEART_STATE_HEARTED" });
        let mut states = HashMap::new();
        states.insert("t1".to_string(), &hearted);

        let comment = normalize_comment(&raw, &states, &HashMap::new()).unwrap();
        assert!(comment.heart);
    }

    #[test]
    fn test_unhearted_state() {
        let raw = raw_comment();
        let unhearted = json!({ "key": "t1", "heartState": "TOOLBAR_HEART_STATE_UNHEARTED" });
        let mut states = HashMap::new();
        states.insert("t1".to_string(), &unhearted);

        let comment = normalize_comment(&raw, &states, &HashMap::new()).unwrap();
        assert!(!comment.heart);
    }

    #[test]
    fn test_payment_attached_by_id() {
        let raw = raw_comment();
        let mut payments = HashMap::new();
        payments.insert("c1".to_string(), "Thanks".to_string());

        let comment = normalize_comment(&raw, &HashMap::new(), &payments).unwrap();
        assert_eq!(comment.paid.as_deref(), Some("Thanks"));
    }

    #[test]
    fn test_votes_trimmed() {
        let mut raw = raw_comment();
        raw["toolbar"]["likeCountNotliked"] = json!("  12  ");
        let comment = normalize_comment(&raw, &HashMap::new(), &HashMap::new()).unwrap();
        assert_eq!(comment.votes, "12");
    }

    #[test]
    fn test_reply_count_leading_int() {
        let mut raw = raw_comment();
        raw["toolbar"]["replyCount"] = json!("1.2K");
        let comment = normalize_comment(&raw, &HashMap::new(), &HashMap::new()).unwrap();
        assert_eq!(comment.replies, 1);

        raw["toolbar"]["replyCount"] = json!(7);
        let comment = normalize_comment(&raw, &HashMap::new(), &HashMap::new()).unwrap();
        assert_eq!(comment.replies, 7);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        // Unparseable time keeps the output independent of the clock
        let mut raw = raw_comment();
        raw["properties"]["publishedTime"] = json!("unparseable");

        let first = normalize_comment(&raw, &HashMap::new(), &HashMap::new()).unwrap();
        let second = normalize_comment(&raw, &HashMap::new(), &HashMap::new()).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
