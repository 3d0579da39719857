//! Schema-tolerant search over untyped JSON
//!
//! YouTube's page and API responses are deeply nested, loosely shaped
//! trees. Rather than typing them out, we scan for the handful of key
//! names that matter.

use regex::Regex;
use serde_json::Value;
use std::collections::VecDeque;

/// Iterator over every value bound to a key anywhere in a JSON tree.
///
/// Stack-based depth traversal: a node's children are pushed as a batch
/// and popped last-in-first-out, so siblings come back in reverse order.
/// A matched value is yielded as-is and not descended into again by the
/// same call; everything else keeps being scanned.
pub struct SearchDict<'a> {
    key: &'a str,
    stack: Vec<&'a Value>,
    matches: VecDeque<&'a Value>,
}

/// Search `root` for every value bound to `key`.
pub fn search_dict<'a>(root: &'a Value, key: &'a str) -> SearchDict<'a> {
    SearchDict {
        key,
        stack: vec![root],
        matches: VecDeque::new(),
    }
}

impl<'a> Iterator for SearchDict<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        loop {
            if let Some(found) = self.matches.pop_front() {
                return Some(found);
            }

            let current = self.stack.pop()?;
            match current {
                Value::Array(items) => self.stack.extend(items.iter()),
                Value::Object(map) => {
                    for (key, value) in map {
                        if key.as_str() == self.key {
                            self.matches.push_back(value);
                        } else {
                            self.stack.push(value);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

/// Return `group` of the first match of `pattern` in `text`.
///
/// An empty or absent group counts as no match; `default` (which may be
/// `None`) is returned in that case.
pub fn regex_search(
    text: &str,
    pattern: &Regex,
    group: usize,
    default: Option<&str>,
) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|captures| captures.get(group))
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .or_else(|| default.map(str::to_owned))
}
