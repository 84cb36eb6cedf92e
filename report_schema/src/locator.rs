//! Finds the section and subsection an active navigation key points to.
//!
//! Keys are flat strings coming from the navigation state: a section id
//! (`executive`), a declared subsection id (`executive-summary`) or a dynamic
//! id (`responses-42`, `attributes-customerType`). Nothing in the string tells
//! them apart, so every lookup goes through the document.
//!
//! Subsection ids are looked up across the whole document, they are expected
//! to be unique document-wide.

use std::error::Error;
use std::fmt::Display;

use log::debug;
use serde::Serialize;

use crate::document::*;

pub const RESPONSES_PREFIX: &str = "responses-";
pub const ATTRIBUTES_PREFIX: &str = "attributes-";

// ********* Format adapters **********

/// One of the document layouts that declare subsections.
pub trait SchemaFormat: Sync {
    fn name(&self) -> &'static str;

    /// The subsections declared in this layout, or `None` if there are none.
    fn subsections<'a>(&self, section: &'a Section) -> Option<&'a [Subsection]>;
}

fn non_empty(subsections: &[Subsection]) -> Option<&[Subsection]> {
    if subsections.is_empty() {
        None
    } else {
        Some(subsections)
    }
}

/// `section.subsections`
struct ModernFormat;

impl SchemaFormat for ModernFormat {
    fn name(&self) -> &'static str {
        "subsections"
    }

    fn subsections<'a>(&self, section: &'a Section) -> Option<&'a [Subsection]> {
        non_empty(&section.subsections)
    }
}

/// `section.data.renderSchema.subsections`
struct LegacyRenderSchema;

impl SchemaFormat for LegacyRenderSchema {
    fn name(&self) -> &'static str {
        "data.renderSchema"
    }

    fn subsections<'a>(&self, section: &'a Section) -> Option<&'a [Subsection]> {
        section
            .legacy_schema
            .as_ref()
            .and_then(|s| non_empty(&s.subsections))
    }
}

/// `document[<sectionId>].renderSchema.subsections`
struct FlatTopLevel;

impl SchemaFormat for FlatTopLevel {
    fn name(&self) -> &'static str {
        "<sectionId>.renderSchema"
    }

    fn subsections<'a>(&self, section: &'a Section) -> Option<&'a [Subsection]> {
        section
            .flat_schema
            .as_ref()
            .and_then(|s| non_empty(&s.subsections))
    }
}

/// The supported layouts, most recent first.
pub static FORMATS: &[&dyn SchemaFormat] = &[&ModernFormat, &LegacyRenderSchema, &FlatTopLevel];

/// The declared subsections of a section, from the first layout that has any.
pub fn declared_subsections(section: &Section) -> Option<&[Subsection]> {
    FORMATS.iter().find_map(|f| {
        let found = f.subsections(section);
        if found.is_some() {
            debug!(
                "declared_subsections: {} uses format {}",
                section.id,
                f.name()
            );
        }
        found
    })
}

fn declared_subsection<'a>(section: &'a Section, subsection_id: &str) -> Option<&'a Subsection> {
    FORMATS
        .iter()
        .filter_map(|f| f.subsections(section))
        .flat_map(|subs| subs.iter())
        .find(|s| s.id == subsection_id)
}

// ********* Lookup results **********

/// What a key resolved to inside its section.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Target<'a> {
    Subsection(&'a Subsection),
    Question(&'a Question),
    Attribute(&'a AttributeRecord),
    /// The section has no children, its own components are rendered.
    Section,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Location<'a> {
    pub section: &'a Section,
    pub target: Target<'a>,
}

impl<'a> Location<'a> {
    /// The navigation key of the resolved target.
    pub fn key(&self) -> String {
        match self.target {
            Target::Subsection(s) => s.id.clone(),
            Target::Question(q) => format!("{}{}", RESPONSES_PREFIX, q.id),
            Target::Attribute(a) => format!("{}{}", ATTRIBUTES_PREFIX, a.id),
            Target::Section => self.section.id.clone(),
        }
    }
}

/// A key that does not lead anywhere. `section_id` is set when the owning
/// section was found but not the child.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFound {
    pub key: String,
    pub section_id: Option<String>,
}

impl Error for NotFound {}

impl Display for NotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.section_id {
            Some(sid) => write!(f, "Nothing found for {:?} in section {:?}", self.key, sid),
            None => write!(f, "No section found for {:?}", self.key),
        }
    }
}

// ********* Lookups **********

/// The id of the section that owns `active_key`. First match wins:
///
/// 1. a section with that id
/// 2. a section declaring a subsection with that id (in any layout)
/// 3. `responses-*` / `attributes-*` when such a section exists, whether or
///    not the suffix names an actual question or attribute
/// 4. the longest hyphen-separated prefix naming a section that either has
///    dynamic subsections or declares the remaining suffix as a subsection
pub fn extract_section_id<'a>(document: &'a Document, active_key: &str) -> Option<&'a str> {
    if let Some(s) = document.section(active_key) {
        return Some(&s.id);
    }

    if let Some(s) = document
        .sections
        .iter()
        .find(|s| declared_subsection(s, active_key).is_some())
    {
        return Some(&s.id);
    }

    if active_key.starts_with(RESPONSES_PREFIX) {
        if let Some(s) = document.responses_section() {
            return Some(&s.id);
        }
    }
    if active_key.starts_with(ATTRIBUTES_PREFIX) {
        if let Some(s) = document.attributes_section() {
            return Some(&s.id);
        }
    }

    let parts: Vec<&str> = active_key.split('-').collect();
    for len in (1..parts.len()).rev() {
        let candidate = parts[..len].join("-");
        let suffix = parts[len..].join("-");
        if let Some(s) = document.section(&candidate) {
            if s.has_dynamic_subsections() || declared_subsection(s, &suffix).is_some() {
                debug!(
                    "extract_section_id: {:?} -> {:?} by prefix",
                    active_key, candidate
                );
                return Some(&s.id);
            }
        }
    }

    debug!("extract_section_id: no section for {:?}", active_key);
    None
}

/// The key of the initial child of a section:
///
/// 1. the declared subsection with the lowest index, in the first layout that
///    declares any (missing index sorts last, ties keep array order)
/// 2. for the responses section, `responses-<id>` of the first question
/// 3. for the attributes section, `attributes-<id>` of the first attribute
///    with an icon
/// 4. `None`: the section is rendered from its own components
pub fn first_subsection(section: &Section) -> Option<String> {
    if let Some(subs) = declared_subsections(section) {
        return by_index(subs).first().map(|s| s.id.clone());
    }
    match section.kind {
        SectionKind::Responses => by_index(&section.questions)
            .first()
            .map(|q| format!("{}{}", RESPONSES_PREFIX, q.id)),
        SectionKind::Attributes => by_index(&section.navigable_attributes())
            .first()
            .map(|a| format!("{}{}", ATTRIBUTES_PREFIX, a.id)),
        SectionKind::Standard => None,
    }
}

/// Whether the section can be drawn by the generic renderer.
pub fn has_renderable_schema(document: &Document, section_id: &str) -> bool {
    let oldest = document
        .raw()
        .get(section_id)
        .and_then(|v| v.get("renderSchema"))
        .is_some();
    let Some(section) = document.section(section_id) else {
        return oldest;
    };
    (section.kind == SectionKind::Responses && !section.questions.is_empty())
        || (section.kind == SectionKind::Attributes && !section.navigable_attributes().is_empty())
        || !section.subsections.is_empty()
        || section.legacy_schema.is_some()
        || oldest
        || !section.components.is_empty()
}

fn find_child<'a>(section: &'a Section, key: &str) -> Option<Target<'a>> {
    if let Some(s) = declared_subsection(section, key) {
        return Some(Target::Subsection(s));
    }
    match section.kind {
        SectionKind::Responses => {
            if let Some(q) = key
                .strip_prefix(RESPONSES_PREFIX)
                .and_then(|qid| section.question(qid))
            {
                return Some(Target::Question(q));
            }
        }
        SectionKind::Attributes => {
            if let Some(a) = key
                .strip_prefix(ATTRIBUTES_PREFIX)
                .and_then(|aid| section.attribute(aid))
            {
                return Some(Target::Attribute(a));
            }
        }
        SectionKind::Standard => {}
    }
    // `<sectionId>-<subsectionId>`
    key.strip_prefix(section.id.as_str())
        .and_then(|rest| rest.strip_prefix('-'))
        .and_then(|suffix| declared_subsection(section, suffix))
        .map(Target::Subsection)
}

/// Resolves a navigation key down to the section and the child to render.
pub fn locate<'a>(document: &'a Document, active_key: &str) -> Result<Location<'a>, NotFound> {
    let section = extract_section_id(document, active_key)
        .and_then(|sid| document.section(sid))
        .ok_or_else(|| NotFound {
            key: active_key.to_string(),
            section_id: None,
        })?;
    let not_found = || NotFound {
        key: active_key.to_string(),
        section_id: Some(section.id.clone()),
    };

    if section.id == active_key {
        return match first_subsection(section) {
            Some(first) => {
                debug!("locate: {:?} opens on {:?}", active_key, first);
                let target = find_child(section, &first).ok_or_else(not_found)?;
                Ok(Location { section, target })
            }
            None => Ok(Location {
                section,
                target: Target::Section,
            }),
        };
    }

    let target = find_child(section, active_key).ok_or_else(not_found)?;
    Ok(Location { section, target })
}
