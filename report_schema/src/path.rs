//! Resolution of `dataPath` strings against a JSON tree.
//!
//! Paths are dotted (`results.nps.score`) and may index arrays either with a
//! plain segment (`rows.3`) or with brackets (`rows[3]`). Two prefixes are
//! scoped: `sectionData.` and `question.`.
//!
//! A path that leads nowhere is not an error, it resolves to `None`. A key that
//! is present with an explicit `null` resolves to `Some(&Value::Null)`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JSValue;

pub const SECTION_DATA_PREFIX: &str = "sectionData.";
pub const QUESTION_PREFIX: &str = "question.";

pub const SECTION_DATA_KEY: &str = "sectionData";
pub const QUESTION_KEY: &str = "question";
pub const ACTIVE_SUBSECTION_KEY: &str = "_activeSubsection";

static BRACKET_INDEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d+)\]").expect("bracket index pattern"));

/// The top level of a resolution. Implemented by plain JSON values and by
/// render scopes that overlay a few keys on a document.
pub trait PathRoot {
    /// The value stored directly under `key`, if any.
    fn field(&self, key: &str) -> Option<&JSValue>;
}

impl PathRoot for JSValue {
    fn field(&self, key: &str) -> Option<&JSValue> {
        step(self, key)
    }
}

/// `foo[3].bar` -> `foo.3.bar`
pub fn normalize_path(path: &str) -> String {
    let dotted = BRACKET_INDEX.replace_all(path, ".$1");
    dotted.trim_start_matches('.').to_string()
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// One step down the tree.
fn step<'a>(current: &'a JSValue, segment: &str) -> Option<&'a JSValue> {
    match current {
        JSValue::Array(items) if is_index(segment) => {
            segment.parse::<usize>().ok().and_then(|i| items.get(i))
        }
        JSValue::Object(map) => map.get(segment),
        _ => None,
    }
}

/// Walks `path` from `start`, without any prefix handling.
pub fn walk<'a>(start: &'a JSValue, path: &str) -> Option<&'a JSValue> {
    let normalized = normalize_path(path);
    let mut current = start;
    for segment in normalized.split('.') {
        current = step(current, segment)?;
    }
    Some(current)
}

/// A scope key that is missing or explicitly null is treated as absent.
fn scope<'a, R: PathRoot + ?Sized>(root: &'a R, key: &str) -> Option<&'a JSValue> {
    root.field(key).filter(|v| !v.is_null())
}

/// Resolves `path` against `root`.
///
/// - `sectionData.<rest>` resolves `<rest>` against `root.sectionData`. When
///   the root has no `sectionData`, `root._activeSubsection.data` is used instead.
/// - `question.<rest>` resolves `<rest>` against `root.question`.
/// - anything else is walked from the root.
pub fn resolve_path<'a, R: PathRoot + ?Sized>(root: &'a R, path: &str) -> Option<&'a JSValue> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }

    if let Some(rest) = path.strip_prefix(SECTION_DATA_PREFIX) {
        return match scope(root, SECTION_DATA_KEY) {
            Some(data) => walk(data, rest),
            None => scope(root, ACTIVE_SUBSECTION_KEY)
                .and_then(|active| active.get("data"))
                .and_then(|data| walk(data, rest)),
        };
    }

    if let Some(rest) = path.strip_prefix(QUESTION_PREFIX) {
        return scope(root, QUESTION_KEY).and_then(|q| walk(q, rest));
    }

    let normalized = normalize_path(path);
    let mut segments = normalized.split('.');
    let mut current = root.field(segments.next()?)?;
    for segment in segments {
        current = step(current, segment)?;
    }
    Some(current)
}

/// Same as [resolve_path], returning a copy of `fallback` when nothing is found.
pub fn resolve_path_or<R: PathRoot + ?Sized>(root: &R, path: &str, fallback: JSValue) -> JSValue {
    match resolve_path(root, path) {
        Some(v) => v.clone(),
        None => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_values() {
        let root = json!({"a": {"b": {"c": 5}}});
        assert_eq!(resolve_path(&root, "a.b.c"), Some(&json!(5)));
        assert_eq!(resolve_path(&root, "a.b"), Some(&json!({"c": 5})));
        assert_eq!(resolve_path(&root, "a.x.c"), None);
    }

    #[test]
    fn falsy_values_are_found() {
        let root = json!({"a": {"zero": 0, "no": false, "empty": "", "nothing": null}});
        assert_eq!(resolve_path(&root, "a.zero"), Some(&json!(0)));
        assert_eq!(resolve_path(&root, "a.no"), Some(&json!(false)));
        assert_eq!(resolve_path(&root, "a.empty"), Some(&json!("")));
        assert_eq!(resolve_path(&root, "a.nothing"), Some(&JSValue::Null));
        assert_eq!(
            resolve_path_or(&root, "a.nothing", json!("fallback")),
            JSValue::Null
        );
    }

    #[test]
    fn fallback_when_missing() {
        assert_eq!(
            resolve_path_or(&json!({}), "a.b.c", json!("fallback")),
            json!("fallback")
        );
        assert_eq!(resolve_path_or(&json!({"a": 1}), "", json!(7)), json!(7));
        assert_eq!(resolve_path_or(&JSValue::Null, "a", json!(7)), json!(7));
        assert_eq!(resolve_path(&json!({"a": 1}), "   "), None);
    }

    #[test]
    fn array_indices() {
        let root = json!({"rows": [{"v": "x"}, {"v": "y"}]});
        assert_eq!(resolve_path(&root, "rows.1.v"), Some(&json!("y")));
        assert_eq!(resolve_path(&root, "rows[1].v"), Some(&json!("y")));
        assert_eq!(resolve_path(&root, "rows[2].v"), None);
        assert_eq!(resolve_path(&root, "rows.-1"), None);
        assert_eq!(resolve_path(&root, "rows.+1"), None);
        assert_eq!(resolve_path(&json!([[1, 2], [3]]), "[1][0]"), Some(&json!(3)));
        assert_eq!(normalize_path("a[0][12].b"), "a.0.12.b");
    }

    #[test]
    fn section_data_prefix() {
        assert_eq!(
            resolve_path(&json!({"sectionData": {"x": 1}}), "sectionData.x"),
            Some(&json!(1))
        );
        assert_eq!(resolve_path(&json!({}), "sectionData.x"), None);
        let bridged = json!({"_activeSubsection": {"id": "s", "data": {"x": 2}}});
        assert_eq!(resolve_path(&bridged, "sectionData.x"), Some(&json!(2)));
        // The bridge only applies when sectionData itself is absent.
        let both = json!({"sectionData": {"y": 1}, "_activeSubsection": {"data": {"x": 2}}});
        assert_eq!(resolve_path(&both, "sectionData.x"), None);
    }

    #[test]
    fn question_prefix() {
        let root = json!({"question": {"id": 17, "stats": {"mean": 3.5}}});
        assert_eq!(resolve_path(&root, "question.stats.mean"), Some(&json!(3.5)));
        assert_eq!(resolve_path(&json!({}), "question.id"), None);
    }

    #[test]
    fn resolving_does_not_mutate() {
        let root = json!({"a": [{"b": 1}], "sectionData": {"c": null}});
        let before = root.clone();
        let first: Vec<Option<JSValue>> = ["a[0].b", "sectionData.c", "z"]
            .iter()
            .map(|p| resolve_path(&root, p).cloned())
            .collect();
        let second: Vec<Option<JSValue>> = ["a[0].b", "sectionData.c", "z"]
            .iter()
            .map(|p| resolve_path(&root, p).cloned())
            .collect();
        assert_eq!(first, second);
        assert_eq!(root, before);
    }
}
