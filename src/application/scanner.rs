//! Recursive payload scanner
//!
//! Walks one bound argument and records every disallowed string it finds.
//!
//! Depth accounting:
//! - the argument itself is at depth 0, and elements of a top-level collection
//!   are scanned as roots at depth 0 too;
//! - a record or collection reached through a property is one level deeper
//!   than the record that holds it;
//! - before entering a nested record or collection the depth is checked
//!   against the budget, and a breach stops that branch and flags the verdict.
//!
//! Whitelist exemptions are resolved once per top-level argument and carried
//! unchanged through the whole walk. They cover string-valued properties by
//! name at any level. String elements of a collection are always checked, even
//! when the collection property itself is named in the whitelist, and
//! top-level string arguments are never exempt.

use serde_json::{Map, Value};

use crate::application::pattern::PatternMatcher;
use crate::application::whitelist::WhitelistContext;
use crate::domain::{Node, RecursionState, ScanVerdict};

/// Scratch state for scanning one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
    pub verdict: ScanVerdict,
    pub recursion: RecursionState,
}

impl ScanState {
    pub fn new(max_depth: i32) -> Self {
        Self {
            verdict: ScanVerdict::new(),
            recursion: RecursionState::new(max_depth),
        }
    }
}

/// Scanner for a single top-level argument
pub struct Scanner<'a> {
    matcher: &'a PatternMatcher,
    whitelist: &'a WhitelistContext,
}

impl<'a> Scanner<'a> {
    pub fn new(matcher: &'a PatternMatcher, whitelist: &'a WhitelistContext) -> Self {
        Self { matcher, whitelist }
    }

    /// Scan `root` as a top-level argument, accumulating into `state`
    pub fn scan(&self, root: &Value, state: &mut ScanState) {
        match Node::classify(root) {
            Node::String(text) => {
                if self.matcher.is_disallowed(text) {
                    state.verdict.record_match(text);
                }
            }
            Node::Collection(items) => {
                for item in items {
                    self.scan(item, state);
                }
            }
            Node::Composite(fields) => self.scan_record(fields, 0, state),
            Node::Scalar => {}
        }
    }

    fn scan_record(&self, fields: &Map<String, Value>, depth: usize, state: &mut ScanState) {
        for (name, value) in fields {
            match Node::classify(value) {
                Node::String(text) => self.check_property(name, text, state),
                Node::Collection(items) => self.scan_collection(items, depth + 1, state),
                Node::Composite(nested) => {
                    if self.enter(depth + 1, state) {
                        self.scan_record(nested, depth + 1, state);
                    }
                }
                Node::Scalar => {}
            }
        }
    }

    /// Elements of a nested collection, at `depth`
    fn scan_collection(&self, items: &[Value], depth: usize, state: &mut ScanState) {
        if !self.enter(depth, state) {
            return;
        }

        for item in items {
            match Node::classify(item) {
                Node::String(text) => {
                    if self.matcher.is_disallowed(text) {
                        state.verdict.record_match(text);
                    }
                }
                Node::Collection(nested) => self.scan_collection(nested, depth + 1, state),
                Node::Composite(fields) => self.scan_record(fields, depth, state),
                Node::Scalar => {}
            }
        }
    }

    fn enter(&self, depth: usize, state: &mut ScanState) -> bool {
        if !state.recursion.allows(depth) {
            state.verdict.mark_depth_exceeded();
            return false;
        }
        state.recursion.reach(depth);
        true
    }

    fn check_property(&self, property: &str, text: &str, state: &mut ScanState) {
        if self.matcher.is_disallowed(text) && !self.whitelist.exempts(property) {
            state.verdict.record_match(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scan_with(value: &Value, whitelist: &WhitelistContext, max_depth: i32) -> ScanState {
        let matcher = PatternMatcher::default();
        let mut state = ScanState::new(max_depth);
        Scanner::new(&matcher, whitelist).scan(value, &mut state);
        state
    }

    fn scan(value: &Value) -> ScanState {
        scan_with(value, &WhitelistContext::none(), -1)
    }

    /// `levels` single-child records below the root, leaf text in the last
    fn chain(levels: usize, leaf: &str) -> Value {
        let mut value = json!({ "text": leaf });
        for _ in 0..levels {
            value = json!({ "name": "level", "child": value });
        }
        value
    }

    #[test]
    fn test_top_level_string() {
        let state = scan(&json!("foo@g<>.com"));
        assert_eq!(state.verdict.matched(), ["foo@g<>.com".to_string()]);

        let state = scan(&json!("foo@example.com"));
        assert!(state.verdict.is_clean());
    }

    #[test]
    fn test_top_level_string_ignores_whitelist() {
        let whitelist = WhitelistContext::exempting(["body"]);
        let state = scan_with(&json!("<p>hi</p>"), &whitelist, -1);
        assert!(state.verdict.has_matches());
    }

    #[test]
    fn test_scalars_are_skipped() {
        let state = scan(&json!({"id": 1, "flag": true, "missing": null, "ratio": 0.5}));
        assert!(state.verdict.is_clean());
        assert!(scan(&json!(42)).verdict.is_clean());
    }

    #[test]
    fn test_record_properties_in_declaration_order() {
        let state = scan(&json!({
            "value1": "Good",
            "value2": "<b>",
            "value3": "a;b",
        }));
        assert_eq!(state.verdict.matched(), ["<b>".to_string(), "a;b".to_string()]);
    }

    #[test]
    fn test_top_level_collection_elements_are_roots() {
        let value = json!([
            {"Link": "<script></script>", "nested": {"x": "ok"}},
            {"Link": ""},
            "plain",
            "a&b",
        ]);
        let state = scan_with(&value, &WhitelistContext::none(), 1);

        assert_eq!(
            state.verdict.matched(),
            ["<script></script>".to_string(), "a&b".to_string()]
        );
        assert!(!state.verdict.depth_exceeded());
        assert_eq!(state.recursion.deepest(), 1);
    }

    #[test]
    fn test_nested_collections_of_records() {
        let value = json!({
            "LocationHoliday": {"HolidayName": "New Year", "LocationIds": [1, 2, null]},
            "SubLocationHolidays": [
                {"HolidayName": "Poya"},
                {"HolidayName": "Christmas <>hello</>"},
            ],
        });
        let state = scan(&value);
        assert_eq!(state.verdict.matched(), ["Christmas <>hello</>".to_string()]);
        // LocationIds sits one level below LocationHoliday
        assert_eq!(state.recursion.deepest(), 2);
    }

    #[test]
    fn test_string_elements_of_collection_property() {
        let state = scan(&json!({"tags": ["safe", ["<deep>"]]}));
        assert_eq!(state.verdict.matched(), ["<deep>".to_string()]);
        assert_eq!(state.recursion.deepest(), 2);
    }

    #[test]
    fn test_whitelisted_property_is_exempt() {
        let whitelist = WhitelistContext::exempting(["Body"]);
        let value = json!({"Title": "ok", "Body": "<p>ok</p>", "Tags": ["<i>"]});
        let state = scan_with(&value, &whitelist, -1);
        assert_eq!(state.verdict.matched(), ["<i>".to_string()]);
    }

    #[test]
    fn test_exemption_applies_by_name_at_any_level() {
        let whitelist = WhitelistContext::exempting(["Body"]);
        let value = json!({"Sections": [{"Body": "<h1>x</h1>", "Caption": "<i>"}]});
        let state = scan_with(&value, &whitelist, -1);
        assert_eq!(state.verdict.matched(), ["<i>".to_string()]);
    }

    #[test]
    fn test_exemption_does_not_cascade_into_nested_records() {
        let whitelist = WhitelistContext::exempting(["Body"]);
        let value = json!({"Body": {"Html": "<p>x</p>"}});
        let state = scan_with(&value, &whitelist, -1);
        assert_eq!(state.verdict.matched(), ["<p>x</p>".to_string()]);
    }

    #[test]
    fn test_whitelisted_collection_elements_are_still_checked() {
        let whitelist = WhitelistContext::exempting(["Tags"]);
        let value = json!({"Tags": ["<script>x</script>", ["<img onerror>"], "plain"]});
        let state = scan_with(&value, &whitelist, -1);
        assert_eq!(
            state.verdict.matched(),
            ["<script>x</script>".to_string(), "<img onerror>".to_string()]
        );
    }

    #[test]
    fn test_record_inside_nested_collection_depth() {
        // a: [ [ {b: {}} ] ] puts the inner array at 2, its record at 2, and b at 3
        let value = json!({"a": [[{"b": {}}]]});

        let allowed = scan_with(&value, &WhitelistContext::none(), 3);
        assert!(!allowed.verdict.depth_exceeded());
        assert_eq!(allowed.recursion.deepest(), 3);

        let breached = scan_with(&value, &WhitelistContext::none(), 2);
        assert!(breached.verdict.depth_exceeded());
        assert_eq!(breached.recursion.deepest(), 2);

        let shallow = scan_with(&value, &WhitelistContext::none(), 1);
        assert!(shallow.verdict.depth_exceeded());
        assert_eq!(shallow.recursion.deepest(), 1);
    }

    #[test]
    fn test_unlimited_depth_reaches_deep_leaf() {
        let state = scan(&chain(6, "<unsafe/>"));
        assert_eq!(state.verdict.matched(), ["<unsafe/>".to_string()]);
        assert!(!state.verdict.depth_exceeded());
        assert_eq!(state.recursion.deepest(), 6);
    }

    #[test]
    fn test_depth_limit_stops_branch() {
        let state = scan_with(&chain(6, "<unsafe/>"), &WhitelistContext::none(), 5);
        assert!(state.verdict.depth_exceeded());
        assert!(!state.verdict.has_matches());
        assert_eq!(state.recursion.deepest(), 5);
    }

    #[test]
    fn test_depth_limit_equal_to_nesting_is_allowed() {
        let state = scan_with(&chain(6, "<unsafe/>"), &WhitelistContext::none(), 6);
        assert!(!state.verdict.depth_exceeded());
        assert!(state.verdict.has_matches());
    }

    #[test]
    fn test_depth_breach_keeps_earlier_matches() {
        let value = json!({
            "shallow": "<b>",
            "deep": {"deeper": {"text": "<i>"}},
        });
        let state = scan_with(&value, &WhitelistContext::none(), 1);
        assert!(state.verdict.depth_exceeded());
        assert_eq!(state.verdict.matched(), ["<b>".to_string()]);
    }

    #[test]
    fn test_zero_depth_allows_flat_records_only() {
        let flat = scan_with(&json!({"a": "x", "b": 1}), &WhitelistContext::none(), 0);
        assert!(!flat.verdict.depth_exceeded());

        let nested = scan_with(&json!({"a": []}), &WhitelistContext::none(), 0);
        assert!(nested.verdict.depth_exceeded());
    }

    #[test]
    fn test_scan_is_idempotent() {
        let value = json!({"a": ["<x>", {"b": "y;"}], "c": {"d": "&"}});
        assert_eq!(scan(&value), scan(&value));
    }
}
