// ai
//! 📦 Common data structures: the building blocks of lokx.
//!
//! ---
//!
//! 🎬 COLD OPEN: INT. APPLICATION SERVER, 3:47 AM
//!
//! A request handler somewhere hits an error. It wants to tell someone.
//! It builds a [`StreamEntry`], drops it into a channel, and goes back to work.
//! It never finds out whether Loki got the message. That is the deal. That has
//! always been the deal.
//!
//! 🦆
//!
//! ---
//!
//! This module defines the two structs that ferry log lines from the producer
//! to the wire: [`StreamEntry`] (one label set, one or more timestamped lines)
//! and [`PushBatch`] (a bunch of entries headed out in one request).

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// 🎯 One Loki stream: a label set plus the lines that share it.
///
/// Serializes straight into the push API shape:
/// `{"stream": {"k": "v"}, "values": [["<unix ns>", "line"], ...]}`.
///
/// Built with [`StreamEntry::new`], which sanitizes label keys and stamps every
/// line with one shared timestamp. Entries can also be deserialized from that
/// same JSON shape; those skip the builder, so the delivery path re-checks them
/// with [`StreamEntry::validate`] before anything hits the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEntry {
    /// 🏷️ Sanitized label set. A BTreeMap so the wire body does not depend on hash order.
    #[serde(rename = "stream")]
    labels: BTreeMap<String, String>,
    /// 📜 `(timestamp_ns, line)` pairs in emission order.
    values: Vec<(String, String)>,
}

impl StreamEntry {
    /// 🏗️ Build an entry from a label map and one or more lines.
    ///
    /// - every label key goes through [`sanitize_label_key`], values pass through untouched
    /// - keys that collide after sanitizing: last one iterated wins. Iterating a `HashMap`
    ///   has no defined order, so with colliding keys the survivor is not predictable.
    /// - ONE clock read per call, shared by every line in it
    pub fn new<K, V, L>(
        labels: impl IntoIterator<Item = (K, V)>,
        lines: impl IntoIterator<Item = L>,
    ) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
        L: Into<String>,
    {
        let labels = labels
            .into_iter()
            .map(|(key, value)| (sanitize_label_key(key.as_ref()), value.into()))
            .collect();

        let now = unix_nanos_now();
        let values = lines
            .into_iter()
            .map(|line| (now.clone(), line.into()))
            .collect();

        Self { labels, values }
    }

    /// 🏷️ The sanitized label set.
    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// 📜 The `(timestamp_ns, line)` pairs, oldest first.
    pub fn values(&self) -> &[(String, String)] {
        &self.values
    }

    pub fn line_count(&self) -> usize {
        self.values.len()
    }

    /// 🔍 Check the invariants the builder guarantees.
    ///
    /// Builder-made entries always pass. Deserialized ones might not: keys with
    /// characters outside `[A-Za-z0-9_]`, or timestamps that are not a decimal
    /// nanosecond count.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(key) = self.labels.keys().find(|key| !is_valid_label_key(key)) {
            return Err(format!("label key {key:?} contains characters outside [A-Za-z0-9_]"));
        }
        if let Some((ts, _)) = self
            .values
            .iter()
            .find(|(ts, _)| ts.is_empty() || !ts.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(format!("timestamp {ts:?} is not a decimal nanosecond count"));
        }
        Ok(())
    }
}

/// 🏗️ Free-function spelling of [`StreamEntry::new`], for call sites that read better as a verb.
pub fn push_item<K, V, L>(
    labels: impl IntoIterator<Item = (K, V)>,
    lines: impl IntoIterator<Item = L>,
) -> StreamEntry
where
    K: AsRef<str>,
    V: Into<String>,
    L: Into<String>,
{
    StreamEntry::new(labels, lines)
}

/// 🧼 Replace every character outside `[A-Za-z0-9_]` with `_`, one for one.
///
/// `"seq-now"` → `"seq_now"`, `"abc    "` → `"abc____"`, `"é"` → `"_"` (one char, one underscore).
pub fn sanitize_label_key(key: &str) -> String {
    key.chars()
        .map(|c| if is_label_char(c) { c } else { '_' })
        .collect()
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_valid_label_key(key: &str) -> bool {
    key.chars().all(is_label_char)
}

fn unix_nanos_now() -> String {
    // -- ⏰ a clock before 1970 is a clock with bigger problems than us
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since_epoch| since_epoch.as_nanos())
        .unwrap_or_default()
        .to_string()
}

/// 📦 A `PushBatch`: the entries collected between two triggers.
///
/// One batch, one request. Never split, never merged with the next one.
/// On a failed attempt the very same batch goes out again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushBatch {
    entries: Vec<StreamEntry>,
}

impl PushBatch {
    pub fn new(entries: Vec<StreamEntry>) -> Self {
        Self { entries }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, entry: StreamEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[StreamEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 📏 Total lines across every entry. For the logs, mostly.
    pub fn line_count(&self) -> usize {
        self.entries.iter().map(StreamEntry::line_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn the_one_where_weird_label_keys_get_a_makeover() {
        let labels = HashMap::from([
            ("abc    ".to_string(), "1234".to_string()),
            ("index".to_string(), "debug".to_string()),
            ("seq-now".to_string(), "42".to_string()),
            ("&1234".to_string(), "should be fine".to_string()),
            ("héllo.wörld".to_string(), "unicode".to_string()),
        ]);

        let entry = StreamEntry::new(&labels, ["it is 1 message"]);

        for key in entry.labels().keys() {
            assert!(
                key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'),
                "key {key:?} escaped the sanitizer"
            );
        }
        assert_eq!(entry.labels().get("abc____").map(String::as_str), Some("1234"));
        assert_eq!(entry.labels().get("index").map(String::as_str), Some("debug"));
        assert_eq!(entry.labels().get("seq_now").map(String::as_str), Some("42"));
        assert_eq!(entry.labels().get("_1234").map(String::as_str), Some("should be fine"));
        assert_eq!(entry.labels().get("h_llo_w_rld").map(String::as_str), Some("unicode"));
    }

    #[test]
    fn the_one_where_sanitizing_is_char_for_char() {
        for raw in ["a-b", "x y z", "ok_key", "", "🦆duck", "tab\there"] {
            let cleaned = sanitize_label_key(raw);
            assert_eq!(cleaned.chars().count(), raw.chars().count(), "{raw:?}");
            for (before, after) in raw.chars().zip(cleaned.chars()) {
                if before.is_ascii_alphanumeric() || before == '_' {
                    assert_eq!(before, after);
                } else {
                    assert_eq!(after, '_');
                }
            }
        }
    }

    #[test]
    fn the_one_where_colliding_keys_leave_exactly_one_survivor() {
        let labels = HashMap::from([("a-b", "first"), ("a.b", "second")]);
        let entry = StreamEntry::new(labels, ["line"]);
        assert_eq!(entry.labels().len(), 1);
        let survivor = entry.labels().get("a_b").map(String::as_str);
        assert!(matches!(survivor, Some("first") | Some("second")));
    }

    #[test]
    fn the_one_where_all_lines_in_one_call_share_a_clock() {
        let entry = StreamEntry::new([("app", "lokx")], ["one", "two", "three"]);

        assert_eq!(entry.line_count(), 3);
        let first_ts = &entry.values()[0].0;
        assert!(entry.values().iter().all(|(ts, _)| ts == first_ts));
        assert!(first_ts.parse::<u128>().is_ok(), "timestamp {first_ts:?} is not a number");
        let lines: Vec<&str> = entry.values().iter().map(|(_, line)| line.as_str()).collect();
        assert_eq!(lines, ["one", "two", "three"]);
    }

    #[test]
    fn the_one_where_the_builder_never_makes_an_invalid_entry() {
        let entry = push_item([("we ird!", "v")], ["x"]);
        assert!(entry.validate().is_ok());
    }

    #[test]
    fn the_one_where_deserialized_entries_can_still_be_wrong() -> serde_json::Result<()> {
        let bad_key: StreamEntry =
            serde_json::from_str(r#"{"stream":{"bad-key":"v"},"values":[["1","x"]]}"#)?;
        assert!(bad_key.validate().unwrap_err().contains("bad-key"));

        let bad_ts: StreamEntry =
            serde_json::from_str(r#"{"stream":{"ok":"v"},"values":[["yesterday","x"]]}"#)?;
        assert!(bad_ts.validate().unwrap_err().contains("yesterday"));

        let fine: StreamEntry =
            serde_json::from_str(r#"{"stream":{"ok":"v"},"values":[["17","x"]]}"#)?;
        assert!(fine.validate().is_ok());
        Ok(())
    }

    #[test]
    fn the_one_where_a_batch_counts_its_lines() {
        let batch = PushBatch::new(vec![
            StreamEntry::new([("a", "1")], ["x", "y"]),
            StreamEntry::new([("b", "2")], ["z"]),
        ]);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.line_count(), 3);
        assert!(!batch.is_empty());
        assert!(PushBatch::default().is_empty());
    }
}
