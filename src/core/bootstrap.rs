//! Watch-page fetch and embedded-state extraction
//!
//! The page embeds two JSON blobs we need: a configuration object
//! (ytcfg, carrying the API key and request context) and the initial
//! server-rendered state (ytInitialData). Extraction failures on this
//! path are silent: the run simply produces no comments.

use crate::core::client::HttpClient;
use crate::utils::search::regex_search;
use regex::Regex;
use serde_json::Value;

const YT_CFG_RE: &str = r"ytcfg\.set\s*\(\s*(\{.+?\})\s*\)\s*;";
const YT_INITIAL_DATA_RE: &str =
    r#"(?:window\s*\[\s*["']ytInitialData["']\s*\]|ytInitialData)\s*=\s*(\{.+?\})\s*;\s*(?:var\s+meta|</script|\n)"#;
const YT_HIDDEN_INPUT_RE: &str =
    r#"<input\s+type="hidden"\s+name="([A-Za-z0-9_]+)"\s+value="([A-Za-z0-9_\-\.]*)"\s*(?:required|)\s*>"#;

/// Fetch the watch page, resubmitting through the consent interstitial
/// when the request was redirected there. Returns None on any network
/// failure.
pub async fn fetch_page(http: &HttpClient, url: &str) -> Option<String> {
    let response = match http.get(url).await {
        Ok(response) => response,
        Err(e) => {
            eprintln!("Error fetching YouTube page: {e}");
            return None;
        }
    };

    let landed_on_consent = response.url().as_str().contains("consent");
    let html = response.text().await.ok()?;

    if !landed_on_consent {
        return Some(html);
    }

    let mut params = extract_hidden_inputs(&html);
    if params.is_empty() {
        // Interstitial without a form; fall through with what we have
        return Some(html);
    }
    params.push(("continue".to_string(), url.to_string()));
    params.push(("set_eom".to_string(), "false".to_string()));
    params.push(("set_ytc".to_string(), "true".to_string()));
    params.push(("set_apyt".to_string(), "true".to_string()));

    match http.post_params(http.consent_url(), &params).await {
        Ok(response) => response.text().await.ok(),
        Err(e) => {
            eprintln!("Error handling consent: {e}");
            None
        }
    }
}

/// Extract and parse the ytcfg blob embedded in the page.
pub fn extract_config(html: &str) -> Option<Value> {
    let pattern = Regex::new(YT_CFG_RE).expect("Invalid regex");
    let raw = regex_search(html, &pattern, 1, None)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(_) => {
            eprintln!("Failed to parse YouTube configuration");
            None
        }
    }
}

/// Extract and parse the ytInitialData blob embedded in the page.
pub fn extract_initial_data(html: &str) -> Option<Value> {
    let pattern = Regex::new(YT_INITIAL_DATA_RE).expect("Invalid regex");
    let raw = regex_search(html, &pattern, 1, None)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(_) => {
            eprintln!("Failed to parse initial data");
            None
        }
    }
}

/// Hidden name/value form fields on the consent interstitial.
fn extract_hidden_inputs(html: &str) -> Vec<(String, String)> {
    let pattern = Regex::new(YT_HIDDEN_INPUT_RE).expect("Invalid regex");
    pattern
        .captures_iter(html)
        .map(|captures| (captures[1].to_string(), captures[2].to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_config() {
        let html = r#"<script>ytcfg.set({"INNERTUBE_API_KEY":"K","INNERTUBE_CONTEXT":{"client":{}}});</script>"#;
        let config = extract_config(html).unwrap();
        assert_eq!(config["INNERTUBE_API_KEY"], "K");
    }

    #[test]
    fn test_extract_config_missing() {
        assert!(extract_config("<html></html>").is_none());
    }

    #[test]
    fn test_extract_config_malformed_json() {
        let html = r#"ytcfg.set({"INNERTUBE_API_KEY":});"#;
        assert!(extract_config(html).is_none());
    }

    #[test]
    fn test_extract_initial_data_plain_assignment() {
        let html = r#"<script>var ytInitialData = {"contents":{"a":1}};</script>"#;
        let data = extract_initial_data(html).unwrap();
        assert_eq!(data["contents"]["a"], 1);
    }

    #[test]
    fn test_extract_initial_data_window_assignment() {
        let html = "window[\"ytInitialData\"] = {\"contents\":{}};\n";
        let data = extract_initial_data(html).unwrap();
        assert!(data["contents"].is_object());
    }

    #[test]
    fn test_extract_hidden_inputs() {
        let html = concat!(
            r#"<input type="hidden" name="gl" value="DE">"#,
            r#"<input type="hidden" name="pc" value="yt" required>"#,
            r#"<input type="text" name="visible" value="nope">"#,
        );
        let inputs = extract_hidden_inputs(html);
        assert_eq!(
            inputs,
            vec![
                ("gl".to_string(), "DE".to_string()),
                ("pc".to_string(), "yt".to_string()),
            ]
        );
    }
}
