//! Turns a located subsection into resolved components.

use std::collections::HashMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::{Number, Value as JSValue};

use crate::document::*;
use crate::locator::{Location, Target};
use crate::path::*;
use crate::template::{resolve_template, Diagnostics};

pub const CARD_STYLE_VARIANT: &str = "cardStyleVariant";
pub const CARD_CONTENT_VARIANT: &str = "cardContentVariant";
pub const TITLE_STYLE_VARIANT: &str = "titleStyleVariant";

/// Component types produced for dynamic children when their section does not
/// provide a template.
pub const QUESTION_RESULTS_TYPE: &str = "questionResults";
pub const ATTRIBUTE_DETAIL_TYPE: &str = "attributeDetail";

// ********* Settings **********

/// Style buckets (`cardStyleVariant`, ...) mapping variant names to classes.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleRegistry {
    buckets: HashMap<String, HashMap<String, String>>,
}

impl StyleRegistry {
    pub fn new() -> StyleRegistry {
        StyleRegistry::default()
    }

    pub fn with(mut self, bucket: &str, variant: &str, classes: &str) -> StyleRegistry {
        self.buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(variant.to_string(), classes.to_string());
        self
    }

    /// The classes for `variant` in `bucket`. Falls back to the bucket's
    /// `default` entry, then to an empty string.
    pub fn class_for(&self, bucket: &str, variant: Option<&str>) -> String {
        let Some(entries) = self.buckets.get(bucket) else {
            return String::new();
        };
        let name = variant.filter(|v| !v.is_empty()).unwrap_or("default");
        entries
            .get(name)
            .or_else(|| entries.get("default"))
            .cloned()
            .unwrap_or_default()
    }

    pub fn builtin() -> StyleRegistry {
        StyleRegistry::new()
            .with(CARD_STYLE_VARIANT, "default", "card")
            .with(CARD_STYLE_VARIANT, "highlight", "card card-highlight")
            .with(CARD_STYLE_VARIANT, "plain", "card card-plain")
            .with(CARD_CONTENT_VARIANT, "default", "card-content")
            .with(CARD_CONTENT_VARIANT, "compact", "card-content card-content-compact")
            .with(TITLE_STYLE_VARIANT, "default", "title")
            .with(TITLE_STYLE_VARIANT, "section", "title title-section")
            .with(TITLE_STYLE_VARIANT, "muted", "title title-muted")
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderSettings {
    /// Component nesting deeper than this is cut off.
    pub max_depth: usize,
    pub style_variants: StyleRegistry,
}

impl RenderSettings {
    pub const DEFAULT_MAX_DEPTH: usize = 32;
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            max_depth: RenderSettings::DEFAULT_MAX_DEPTH,
            style_variants: StyleRegistry::builtin(),
        }
    }
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize)]
pub struct StyleClasses {
    pub card: String,
    pub content: String,
    pub title: String,
}

/// A component ready for its render routine: templates expanded, data attached.
#[derive(PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedComponent {
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_path: Option<String>,
    /// The value behind `data_path`. An explicit `null` in the document is kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JSValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<JSValue>,
    pub classes: StyleClasses,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ResolvedComponent>,
    /// Set when the children were dropped by the depth limit.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

// ********* Render scope **********

/// The data visible to paths and templates while rendering one target.
///
/// `sectionData`, `question` and `_activeSubsection` are overlaid on the
/// document; every other key is read from the document.
pub struct RenderScope<'a> {
    document: &'a JSValue,
    section_data: Option<&'a JSValue>,
    question: Option<&'a JSValue>,
    active_subsection: Option<JSValue>,
}

impl<'a> RenderScope<'a> {
    pub fn for_document(document: &'a JSValue) -> RenderScope<'a> {
        RenderScope {
            document,
            section_data: None,
            question: None,
            active_subsection: None,
        }
    }

    pub fn for_location(document: &'a Document, location: &Location<'a>) -> RenderScope<'a> {
        let section = location.section;
        let section_data = section.data.as_ref();
        let mut scope = RenderScope::for_document(document.raw());
        match location.target {
            Target::Subsection(sub) => {
                scope.section_data = sub.data.as_ref().or(section_data);
                scope.active_subsection = Some(json!({"id": sub.id, "data": sub.data}));
            }
            Target::Question(q) => {
                scope.section_data = section_data;
                scope.question = Some(&q.raw);
                scope.active_subsection = Some(json!({"id": location.key(), "data": q.raw}));
            }
            Target::Attribute(a) => {
                scope.section_data = Some(a.data());
                scope.active_subsection = Some(json!({"id": location.key(), "data": a.data()}));
            }
            Target::Section => {
                scope.section_data = section_data;
            }
        }
        scope
    }
}

impl PathRoot for RenderScope<'_> {
    fn field(&self, key: &str) -> Option<&JSValue> {
        let overlay = match key {
            SECTION_DATA_KEY => self.section_data,
            QUESTION_KEY => self.question,
            ACTIVE_SUBSECTION_KEY => self.active_subsection.as_ref(),
            _ => None,
        };
        overlay.or_else(|| self.document.field(key))
    }
}

// ********* Rendering **********

/// The components a location renders, before resolution.
pub fn components_for(location: &Location) -> Vec<ComponentNode> {
    let section = location.section;
    match location.target {
        Target::Subsection(sub) => sub.components.clone(),
        Target::Section => {
            let legacy = section
                .legacy_schema
                .as_ref()
                .or(section.flat_schema.as_ref())
                .map(|s| s.components.clone())
                .unwrap_or_default();
            if section.components.is_empty() {
                legacy
            } else {
                section.components.clone()
            }
        }
        Target::Question(q) => {
            if !q.components.is_empty() {
                q.components.clone()
            } else if !section.components.is_empty() {
                section.components.clone()
            } else {
                vec![ComponentNode::new(QUESTION_RESULTS_TYPE)
                    .bound_to(QUESTION_KEY)
                    .titled(q.text.clone())]
            }
        }
        Target::Attribute(a) => {
            if !section.components.is_empty() {
                section.components.clone()
            } else {
                vec![ComponentNode::new(ATTRIBUTE_DETAIL_TYPE)
                    .bound_to(SECTION_DATA_KEY)
                    .titled(a.name.clone())]
            }
        }
    }
}

/// Resolves component trees within a scope.
pub struct SectionRenderer<'a> {
    settings: &'a RenderSettings,
    diagnostics: Option<&'a dyn Diagnostics>,
}

impl<'a> SectionRenderer<'a> {
    pub fn new(
        settings: &'a RenderSettings,
        diagnostics: Option<&'a dyn Diagnostics>,
    ) -> SectionRenderer<'a> {
        SectionRenderer {
            settings,
            diagnostics,
        }
    }

    /// Resolves `nodes` in sibling order.
    pub fn render(&self, nodes: &[ComponentNode], scope: &RenderScope) -> Vec<ResolvedComponent> {
        self.render_level(nodes, scope, 1)
    }

    fn render_level(
        &self,
        nodes: &[ComponentNode],
        scope: &RenderScope,
        depth: usize,
    ) -> Vec<ResolvedComponent> {
        by_index(nodes)
            .into_iter()
            .map(|node| self.render_node(node, scope, depth))
            .collect()
    }

    fn render_node(
        &self,
        node: &ComponentNode,
        scope: &RenderScope,
        depth: usize,
    ) -> ResolvedComponent {
        let styles = &self.settings.style_variants;
        let classes = StyleClasses {
            card: styles.class_for(CARD_STYLE_VARIANT, node.card_style_variant.as_deref()),
            content: styles.class_for(CARD_CONTENT_VARIANT, node.card_content_variant.as_deref()),
            title: styles.class_for(TITLE_STYLE_VARIANT, node.title_style_variant.as_deref()),
        };

        // A bare scope key (`sectionData`, `question`) binds the whole scope.
        let data = node.data_path.as_deref().and_then(|p| {
            let found = resolve_path(scope, p).cloned();
            if found.is_none() {
                debug!("render_node: {}: nothing at {:?}", node.component_type, p);
            }
            found
        });

        let truncated = !node.components.is_empty() && depth >= self.settings.max_depth;
        if truncated {
            warn!(
                "render_node: {} at depth {}: dropping {} nested components",
                node.component_type,
                depth,
                node.components.len()
            );
            if let Some(d) = self.diagnostics {
                d.warn(
                    "Component tree too deep",
                    &json!({"type": node.component_type, "depth": depth}),
                );
            }
        }
        let components = if truncated {
            Vec::new()
        } else {
            self.render_level(&node.components, scope, depth + 1)
        };

        ResolvedComponent {
            component_type: node.component_type.clone(),
            index: node.index.clone(),
            title: node
                .title
                .as_deref()
                .map(|t| resolve_template(t, scope, self.diagnostics)),
            text: node
                .text
                .as_deref()
                .map(|t| resolve_template(&t.replace("\\n", "\n"), scope, self.diagnostics)),
            data_path: node.data_path.clone(),
            data,
            config: node.config.clone(),
            classes,
            components,
            truncated,
        }
    }
}

// ********* Dispatch **********

pub type RenderRoutine<T> = Box<dyn Fn(&ResolvedComponent) -> T>;

/// Maps component types to render routines.
pub struct RenderRegistry<T> {
    routines: HashMap<String, RenderRoutine<T>>,
    fallback: Option<RenderRoutine<T>>,
}

impl<T> Default for RenderRegistry<T> {
    fn default() -> Self {
        RenderRegistry {
            routines: HashMap::new(),
            fallback: None,
        }
    }
}

impl<T> RenderRegistry<T> {
    pub fn new() -> RenderRegistry<T> {
        RenderRegistry::default()
    }

    pub fn register<F>(mut self, component_type: &str, routine: F) -> RenderRegistry<T>
    where
        F: Fn(&ResolvedComponent) -> T + 'static,
    {
        self.routines
            .insert(component_type.to_string(), Box::new(routine));
        self
    }

    /// Used for the types without a routine of their own.
    pub fn with_fallback<F>(mut self, routine: F) -> RenderRegistry<T>
    where
        F: Fn(&ResolvedComponent) -> T + 'static,
    {
        self.fallback = Some(Box::new(routine));
        self
    }

    pub fn knows(&self, component_type: &str) -> bool {
        self.routines.contains_key(component_type)
    }

    /// Runs the routine for the component's type. `None` for an unknown type
    /// without fallback.
    pub fn dispatch(&self, component: &ResolvedComponent) -> Option<T> {
        match self
            .routines
            .get(&component.component_type)
            .or(self.fallback.as_ref())
        {
            Some(routine) => Some(routine(component)),
            None => {
                warn!(
                    "dispatch: no render routine for type {:?}",
                    component.component_type
                );
                None
            }
        }
    }
}
