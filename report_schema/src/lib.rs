mod document;
mod locator;
pub mod manual;
mod path;
mod render;
mod template;

use log::{debug, info};
use serde::Serialize;

pub use crate::document::*;
pub use crate::locator::*;
pub use crate::path::*;
pub use crate::render::*;
pub use crate::template::*;

// ******** Views *********

#[derive(PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedView {
    /// The key that was asked for.
    pub key: String,
    /// The key actually rendered. Differs from `key` when a section opens on
    /// its first subsection.
    pub resolved_key: String,
    pub section_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub components: Vec<ResolvedComponent>,
}

/// The result of resolving a navigation key.
#[derive(PartialEq, Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ViewOutcome {
    Rendered(RenderedView),
    NotFound(NotFound),
}

/// Resolves a navigation key into components ready for rendering, reporting
/// problems through the `log` facade.
///
/// ```
/// use report_schema::*;
/// use serde_json::json;
///
/// let doc = Document::from_value(json!({
///     "metadata": {"version": "1", "language": "en", "surveyId": "demo"},
///     "sections": [{"id": "summary", "subsections": [
///         {"id": "summary-nps", "data": {"nps": 31}, "components": [
///             {"type": "card", "title": "NPS {{sectionData.nps}}"}
///         ]}
///     ]}]
/// }));
///
/// match resolve_view(&doc, "summary", &RenderSettings::default()) {
///     ViewOutcome::Rendered(view) => {
///         assert_eq!(view.resolved_key, "summary-nps");
///         assert_eq!(view.components[0].title.as_deref(), Some("NPS 31"));
///     }
///     ViewOutcome::NotFound(nf) => panic!("{}", nf),
/// }
/// ```
pub fn resolve_view(document: &Document, active_key: &str, settings: &RenderSettings) -> ViewOutcome {
    resolve_view_with(document, active_key, settings, Some(&LogDiagnostics))
}

/// Same as [resolve_view] with an explicit diagnostics receiver.
pub fn resolve_view_with(
    document: &Document,
    active_key: &str,
    settings: &RenderSettings,
    diagnostics: Option<&dyn Diagnostics>,
) -> ViewOutcome {
    info!("resolve_view: key {:?}", active_key);
    let location = match locate(document, active_key) {
        Ok(l) => l,
        Err(nf) => {
            info!("resolve_view: {}", nf);
            return ViewOutcome::NotFound(nf);
        }
    };

    let section = location.section;
    if !has_renderable_schema(document, &section.id) {
        info!(
            "resolve_view: section {:?} has nothing to render",
            section.id
        );
        return ViewOutcome::NotFound(NotFound {
            key: active_key.to_string(),
            section_id: Some(section.id.clone()),
        });
    }

    let scope = RenderScope::for_location(document, &location);
    let nodes = components_for(&location);
    debug!(
        "resolve_view: {:?} -> {:?} with {} components",
        active_key,
        location.key(),
        nodes.len()
    );
    let components = SectionRenderer::new(settings, diagnostics).render(&nodes, &scope);

    let title = match location.target {
        Target::Subsection(s) => s.name.clone(),
        Target::Question(q) => q.text.clone(),
        Target::Attribute(a) => a.name.clone(),
        Target::Section => section.name.clone(),
    }
    .map(|t| resolve_template(&t, &scope, diagnostics));

    ViewOutcome::Rendered(RenderedView {
        key: active_key.to_string(),
        resolved_key: location.key(),
        section_id: section.id.clone(),
        title,
        components,
    })
}

// ******** Navigation *********

/// One entry of the navigation tree.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct NavEntry {
    /// The navigation key of the entry.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavEntry>,
}

fn nav_children(section: &Section) -> Vec<NavEntry> {
    if let Some(subs) = declared_subsections(section) {
        return by_index(subs)
            .into_iter()
            .map(|s| NavEntry {
                id: s.id.clone(),
                name: s.name.clone(),
                icon: s.icon.clone(),
                children: Vec::new(),
            })
            .collect();
    }
    match section.kind {
        SectionKind::Responses => by_index(&section.questions)
            .into_iter()
            .map(|q| NavEntry {
                id: format!("{}{}", RESPONSES_PREFIX, q.id),
                name: q.text.clone(),
                icon: None,
                children: Vec::new(),
            })
            .collect(),
        SectionKind::Attributes => by_index(&section.navigable_attributes())
            .into_iter()
            .map(|a| NavEntry {
                id: format!("{}{}", ATTRIBUTES_PREFIX, a.id),
                name: a.name.clone(),
                icon: a.icon.clone(),
                children: Vec::new(),
            })
            .collect(),
        SectionKind::Standard => Vec::new(),
    }
}

/// The navigation tree: sections in display order, each with its children.
///
/// Section and subsection names are looked up as localized texts when they
/// are written as `{{uiTexts.*}}` templates.
pub fn navigation(document: &Document) -> Vec<NavEntry> {
    document
        .sections_by_index()
        .into_iter()
        .map(|s| {
            let mut children = nav_children(s);
            for c in children.iter_mut() {
                c.name = c
                    .name
                    .as_deref()
                    .map(|n| resolve_template(n, document, Some(&LogDiagnostics)));
            }
            NavEntry {
                id: s.id.clone(),
                name: s
                    .name
                    .as_deref()
                    .map(|n| resolve_template(n, document, Some(&LogDiagnostics))),
                icon: s.icon.clone(),
                children,
            }
        })
        .collect()
}

/// The key to show when nothing has been selected yet.
pub fn default_key(document: &Document) -> Option<String> {
    document.sections_by_index().first().map(|s| s.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn report() -> Document {
        Document::from_value(json!({
            "metadata": {"version": "4.0", "language": "en", "surveyId": "cs-2024"},
            "uiTexts": {"sections": {"summary": "Summary"}, "labels": {"score": "Score"}},
            "surveyInfo": {"name": "Customer survey", "respondents": 250},
            "sections": [
                {"id": "responses", "index": 3, "name": "Responses",
                 "questions": [{"id": 42, "index": 1, "text": "How likely?", "distribution": [1, 2, 3]}]},
                {"id": "summary", "index": 1, "name": "{{uiTexts.sections.summary}}", "subsections": [
                    {"id": "summary-overview", "index": 1, "name": "Overview",
                     "data": {"nps": 12, "empty": null},
                     "components": [
                        {"type": "card", "index": 1, "title": "{{uiTexts.labels.score}}",
                         "text": "{{sectionData.nps}} of {{surveyInfo.respondents}}",
                         "dataPath": "sectionData.nps",
                         "components": [
                            {"type": "table", "dataPath": "sectionData.empty"},
                            {"type": "chart", "dataPath": "sectionData.missing"}
                         ]}
                     ]}
                ]},
                {"id": "legacy", "index": 2, "name": "Legacy",
                 "data": {"renderSchema": {"subsections": [
                    {"id": "legacy-one", "components": [{"type": "text", "text": "{{surveyInfo.name}}"}]}
                 ]}}},
                {"id": "placeholder", "index": 4}
            ]
        }))
    }

    fn rendered(outcome: ViewOutcome) -> RenderedView {
        match outcome {
            ViewOutcome::Rendered(v) => v,
            ViewOutcome::NotFound(nf) => panic!("not found: {}", nf),
        }
    }

    #[test]
    fn renders_first_subsection_of_section() {
        init_logger();
        let doc = report();
        let view = rendered(resolve_view(&doc, "summary", &RenderSettings::default()));
        assert_eq!(view.resolved_key, "summary-overview");
        assert_eq!(view.section_id, "summary");
        assert_eq!(view.title.as_deref(), Some("Overview"));
        let card = &view.components[0];
        assert_eq!(card.title.as_deref(), Some("Score"));
        assert_eq!(card.text.as_deref(), Some("12 of 250"));
        assert_eq!(card.data, Some(json!(12)));
        assert_eq!(card.components[0].data, Some(serde_json::Value::Null));
        assert_eq!(card.components[1].data, None);
    }

    #[test]
    fn renders_legacy_and_dynamic_views() {
        init_logger();
        let doc = report();
        let view = rendered(resolve_view(&doc, "legacy", &RenderSettings::default()));
        assert_eq!(view.resolved_key, "legacy-one");
        assert_eq!(view.components[0].text.as_deref(), Some("Customer survey"));

        let view = rendered(resolve_view(&doc, "responses", &RenderSettings::default()));
        assert_eq!(view.resolved_key, "responses-42");
        assert_eq!(view.title.as_deref(), Some("How likely?"));
        assert_eq!(view.components[0].component_type, QUESTION_RESULTS_TYPE);
        assert_eq!(view.components[0].data.as_ref().unwrap()["distribution"], json!([1, 2, 3]));
    }

    #[test]
    fn not_found_views() {
        init_logger();
        let doc = report();
        assert_eq!(
            resolve_view(&doc, "placeholder", &RenderSettings::default()),
            ViewOutcome::NotFound(NotFound {
                key: "placeholder".to_string(),
                section_id: Some("placeholder".to_string())
            })
        );
        assert_eq!(
            resolve_view(&doc, "responses-17", &RenderSettings::default()),
            ViewOutcome::NotFound(NotFound {
                key: "responses-17".to_string(),
                section_id: Some("responses".to_string())
            })
        );
        let empty = Document::from_value(json!("not a document"));
        assert_eq!(
            resolve_view(&empty, "summary", &RenderSettings::default()),
            ViewOutcome::NotFound(NotFound {
                key: "summary".to_string(),
                section_id: None
            })
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let doc = report();
        let before = doc.clone();
        let settings = RenderSettings::default();
        for key in ["summary", "summary-overview", "legacy-one", "responses-42", "nope"] {
            assert_eq!(
                resolve_view(&doc, key, &settings),
                resolve_view(&doc, key, &settings)
            );
        }
        assert_eq!(doc, before);
    }

    #[test]
    fn diagnostics_are_optional() {
        struct Count(RefCell<usize>);
        impl Diagnostics for Count {
            fn warn(&self, _message: &str, _context: &serde_json::Value) {
                *self.0.borrow_mut() += 1;
            }
        }
        let doc = Document::from_value(json!({
            "sections": [{"id": "s", "components": [{"type": "text", "text": "{{uiTexts.none}}"}]}]
        }));
        let settings = RenderSettings::default();
        let count = Count(RefCell::new(0));
        let with = resolve_view_with(&doc, "s", &settings, Some(&count));
        let without = resolve_view_with(&doc, "s", &settings, None);
        assert_eq!(with, without);
        assert_eq!(*count.0.borrow(), 1);
    }

    #[test]
    fn navigation_tree() {
        let doc = report();
        let nav = navigation(&doc);
        let ids: Vec<&str> = nav.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["summary", "legacy", "responses", "placeholder"]);
        assert_eq!(nav[0].name.as_deref(), Some("Summary"));
        assert_eq!(nav[0].children[0].id, "summary-overview");
        assert_eq!(nav[1].children[0].id, "legacy-one");
        assert_eq!(nav[2].children[0].id, "responses-42");
        assert!(nav[3].children.is_empty());
        assert_eq!(default_key(&doc), Some("summary".to_string()));
    }

    #[test]
    fn outcome_json_shape() {
        let doc = report();
        let js = serde_json::to_value(resolve_view(&doc, "nope", &RenderSettings::default())).unwrap();
        assert_eq!(js, json!({"status": "notFound", "key": "nope", "sectionId": null}));
    }
}
