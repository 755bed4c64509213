//! Classifier: pure verdict on whether a document should be archived.
//!
//! Field rules win over tag rules only in evaluation order; either kind
//! of match is sufficient on its own.

use super::snapshot::{normalize_tag, DocumentSnapshot};
use crate::config::RuleSet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

/// Reserved frontmatter field holding the document's declared tags
const TAGS_FIELD: &str = "tags";

/// Delimited tag lists split on commas and/or whitespace
static TAG_LIST_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,\s]+").expect("valid regex"));

/// Decide whether `snapshot` matches the archive rules.
///
/// Any configured trigger field with a truthy value matches first
/// (short-circuit, no field order guaranteed); otherwise any overlap
/// between the configured trigger tags and the document's effective tag
/// set matches. Pure function of its inputs.
pub fn should_archive(snapshot: &DocumentSnapshot, rules: &RuleSet) -> bool {
    for (name, value) in &snapshot.fields {
        if rules.trigger_fields.contains(&name.to_lowercase()) && is_truthy(value, rules) {
            return true;
        }
    }

    if rules.trigger_tags.is_empty() {
        return false;
    }

    let tags = effective_tags(snapshot);
    tags.iter().any(|t| rules.trigger_tags.contains(t))
}

/// Truthiness of a raw metadata value.
///
/// Booleans are taken as-is. Of the numbers, exactly `1` is truthy.
/// Strings compare case-folded against `"true"`, `"1"`, and the
/// configured extra-truthy set. Everything else (null, arrays, objects)
/// is falsy.
pub fn is_truthy(value: &Value, rules: &RuleSet) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => {
            let folded = s.to_lowercase();
            folded == "true" || folded == "1" || rules.extra_truthy.contains(&folded)
        }
        _ => false,
    }
}

/// Merge inline tags with tags declared under the reserved `tags` field.
///
/// The field may hold a list of values or a single delimited string;
/// both forms are normalized token by token.
fn effective_tags(snapshot: &DocumentSnapshot) -> HashSet<String> {
    let mut tags = snapshot.tags.clone();

    for (name, value) in &snapshot.fields {
        if !name.eq_ignore_ascii_case(TAGS_FIELD) {
            continue;
        }
        match value {
            Value::String(s) => {
                for token in TAG_LIST_SPLIT.split(s) {
                    push_tag(&mut tags, token);
                }
            }
            Value::Array(items) => {
                for item in items {
                    if let Value::String(s) = item {
                        push_tag(&mut tags, s);
                    }
                }
            }
            _ => {}
        }
    }

    tags
}

fn push_tag(tags: &mut HashSet<String>, raw: &str) {
    let tag = normalize_tag(raw);
    if !tag.is_empty() {
        tags.insert(tag);
    }
}
