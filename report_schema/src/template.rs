//! Localized texts and `{{path}}` templates.

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::json;
use serde_json::Value as JSValue;

use crate::path::{resolve_path, PathRoot};

pub const UI_TEXTS_PREFIX: &str = "uiTexts.";
pub const UI_TEXTS_KEY: &str = "uiTexts";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^}]+)\}\}").expect("placeholder pattern"));
static SINGLE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{\{[^}]+\}\}$").expect("single placeholder pattern"));

/// Receives the non-fatal problems found while resolving.
///
/// Resolution gives the same results with or without a receiver.
pub trait Diagnostics {
    fn warn(&self, message: &str, context: &JSValue);
}

/// Forwards everything to the `log` facade.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn warn(&self, message: &str, context: &JSValue) {
        warn!("{} {}", message, context);
    }
}

/// The text used when a resolved value is substituted in a string.
pub fn stringify(value: &JSValue) -> String {
    match value {
        JSValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Looks up a localized text under `uiTexts`. The `uiTexts.` prefix is optional.
///
/// When the text cannot be found, the path itself is returned so that the gap
/// stays visible.
pub fn resolve_text<R: PathRoot + ?Sized>(
    path: &str,
    root: &R,
    diagnostics: Option<&dyn Diagnostics>,
) -> String {
    let key = path.strip_prefix(UI_TEXTS_PREFIX).unwrap_or(path);
    let found = root
        .field(UI_TEXTS_KEY)
        .and_then(|texts| resolve_path(texts, key))
        .filter(|v| !v.is_null());
    match found {
        Some(v) => stringify(v),
        None => {
            if let Some(d) = diagnostics {
                d.warn(
                    "Missing localized text",
                    &json!({ "path": path, "hasUiTexts": root.field(UI_TEXTS_KEY).is_some() }),
                );
            }
            path.to_string()
        }
    }
}

/// Expands every `{{path}}` in `template`.
///
/// `{{uiTexts.*}}` goes through [resolve_text], anything else through
/// [resolve_path]. A placeholder whose value is missing or null stays in place,
/// except when the whole template is that single placeholder: then the result
/// is empty.
pub fn resolve_template<R: PathRoot + ?Sized>(
    template: &str,
    root: &R,
    diagnostics: Option<&dyn Diagnostics>,
) -> String {
    if template.is_empty() {
        return String::new();
    }

    let expanded = PLACEHOLDER.replace_all(template, |caps: &Captures| {
        let inner = caps[1].trim();
        if inner.starts_with(UI_TEXTS_PREFIX) {
            return resolve_text(inner, root, diagnostics);
        }
        match resolve_path(root, inner) {
            Some(v) if !v.is_null() => stringify(v),
            _ => {
                debug!("resolve_template: unresolved placeholder {:?}", inner);
                caps[0].to_string()
            }
        }
    });

    if SINGLE_PLACEHOLDER.is_match(template.trim()) && expanded.contains("{{") {
        return String::new();
    }
    expanded.into_owned()
}
