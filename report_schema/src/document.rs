// ********* Document data structures ***********

use std::collections::HashMap;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value as JSValue};

use crate::path::PathRoot;

/// The ordering key used when a node does not declare an `index`.
pub const DEFAULT_INDEX: f64 = 999.0;

/// Anything that carries a display order.
pub trait Indexed {
    fn index(&self) -> Option<f64>;

    fn order_key(&self) -> f64 {
        self.index().unwrap_or(DEFAULT_INDEX)
    }
}

/// Returns the items sorted by `index` ascending. Missing indices sort last
/// and ties keep the input order.
pub fn by_index<T: Indexed>(items: &[T]) -> Vec<&T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by(|a, b| a.order_key().total_cmp(&b.order_key()));
    sorted
}

/// Reads a list of `T`, skipping (and reporting) the entries that cannot be read.
/// Anything that is not an array is read as an empty list.
pub(crate) fn read_list<T: DeserializeOwned>(raw: &JSValue, what: &str) -> Vec<T> {
    match raw {
        JSValue::Array(items) => items
            .iter()
            .enumerate()
            .filter_map(|(pos, item)| match T::deserialize(item) {
                Ok(x) => Some(x),
                Err(e) => {
                    warn!("read_list: skipping {} #{}: {}", what, pos, e);
                    None
                }
            })
            .collect(),
        JSValue::Null => Vec::new(),
        other => {
            warn!("read_list: expected an array of {}, found {}", what, other);
            Vec::new()
        }
    }
}

fn lenient_components<'de, D>(deserializer: D) -> Result<Vec<ComponentNode>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = JSValue::deserialize(deserializer)?;
    Ok(read_list(&raw, "component"))
}

fn lenient_subsections<'de, D>(deserializer: D) -> Result<Vec<Subsection>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = JSValue::deserialize(deserializer)?;
    Ok(read_list(&raw, "subsection"))
}

fn lenient_index<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = JSValue::deserialize(deserializer)?;
    Ok(raw.as_f64())
}

/// Component indices are kept as written so that they come back out unchanged.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<Number>, D::Error>
where
    D: Deserializer<'de>,
{
    match JSValue::deserialize(deserializer)? {
        JSValue::Number(n) => Ok(Some(n)),
        _ => Ok(None),
    }
}

/// Ids are strings in the modern format, but numbers are common in older
/// documents.
fn read_id(raw: Option<&JSValue>) -> Option<String> {
    match raw {
        Some(JSValue::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(JSValue::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = JSValue::deserialize(deserializer)?;
    read_id(Some(&raw)).ok_or_else(|| serde::de::Error::custom(format!("unusable id {}", raw)))
}

fn read_string(raw: Option<&JSValue>) -> Option<String> {
    raw.and_then(|v| v.as_str()).map(|s| s.to_string())
}

/// A node of the component tree. `type` selects the render routine.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ComponentNode {
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub index: Option<Number>,
    #[serde(rename = "dataPath")]
    pub data_path: Option<String>,
    pub config: Option<JSValue>,
    pub title: Option<String>,
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_components")]
    pub components: Vec<ComponentNode>,
    #[serde(rename = "cardStyleVariant")]
    pub card_style_variant: Option<String>,
    #[serde(rename = "cardContentVariant")]
    pub card_content_variant: Option<String>,
    #[serde(rename = "titleStyleVariant")]
    pub title_style_variant: Option<String>,
}

impl ComponentNode {
    /// A bare node of the given type.
    pub fn new(component_type: &str) -> ComponentNode {
        ComponentNode {
            component_type: component_type.to_string(),
            index: None,
            data_path: None,
            config: None,
            title: None,
            text: None,
            components: Vec::new(),
            card_style_variant: None,
            card_content_variant: None,
            title_style_variant: None,
        }
    }

    pub fn bound_to(mut self, data_path: &str) -> ComponentNode {
        self.data_path = Some(data_path.to_string());
        self
    }

    pub fn titled(mut self, title: Option<String>) -> ComponentNode {
        self.title = title;
        self
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Subsection {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_index")]
    pub index: Option<f64>,
    pub name: Option<String>,
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "lenient_components")]
    pub components: Vec<ComponentNode>,
    pub data: Option<JSValue>,
}

/// The older wrapper, found under `section.data.renderSchema` or under a
/// top-level key named after the section.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderSchema {
    #[serde(default, deserialize_with = "lenient_subsections")]
    pub subsections: Vec<Subsection>,
    #[serde(default, deserialize_with = "lenient_components")]
    pub components: Vec<ComponentNode>,
}

impl RenderSchema {
    fn from_holder(holder: Option<&JSValue>, owner: &str) -> Option<RenderSchema> {
        let raw = holder?.get("renderSchema")?;
        if !raw.is_object() {
            warn!("{}: renderSchema is not an object, ignoring it", owner);
            return None;
        }
        match RenderSchema::deserialize(raw) {
            Ok(schema) => Some(schema),
            Err(e) => {
                warn!("{}: could not read renderSchema: {}", owner, e);
                None
            }
        }
    }
}

/// A question of the responses section. Each one becomes a navigable
/// `responses-<id>` entry.
#[derive(PartialEq, Debug, Clone)]
pub struct Question {
    pub id: String,
    pub index: Option<f64>,
    pub text: Option<String>,
    pub components: Vec<ComponentNode>,
    pub raw: JSValue,
}

impl Question {
    pub fn from_value(raw: &JSValue) -> Option<Question> {
        let id = read_id(raw.get("id"))?;
        Some(Question {
            id,
            index: raw.get("index").and_then(|i| i.as_f64()),
            text: read_string(raw.get("text")).or_else(|| read_string(raw.get("title"))),
            components: raw
                .get("components")
                .map(|c| read_list(c, "component"))
                .unwrap_or_default(),
            raw: raw.clone(),
        })
    }
}

/// An attribute record. Only records with an icon are navigable.
#[derive(PartialEq, Debug, Clone)]
pub struct AttributeRecord {
    pub id: String,
    pub index: Option<f64>,
    pub name: Option<String>,
    pub icon: Option<String>,
    pub raw: JSValue,
}

impl AttributeRecord {
    pub fn from_value(raw: &JSValue) -> Option<AttributeRecord> {
        let id = read_id(raw.get("id"))?;
        Some(AttributeRecord {
            id,
            index: raw.get("index").and_then(|i| i.as_f64()),
            name: read_string(raw.get("name")),
            icon: read_string(raw.get("icon")).filter(|s| !s.is_empty()),
            raw: raw.clone(),
        })
    }

    pub fn is_navigable(&self) -> bool {
        self.icon.is_some()
    }

    /// The record's own `data` if it has one, else the record itself.
    pub fn data(&self) -> &JSValue {
        match self.raw.get("data") {
            Some(d) if !d.is_null() => d,
            _ => &self.raw,
        }
    }
}

/// How the children of a section are produced.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKind {
    /// Children are declared in the document.
    Standard,
    /// One child per question, keyed `responses-<questionId>`.
    Responses,
    /// One child per attribute record with an icon, keyed `attributes-<attributeId>`.
    Attributes,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Section {
    pub id: String,
    pub index: Option<f64>,
    pub name: Option<String>,
    pub icon: Option<String>,
    pub kind: SectionKind,
    pub dynamic_subsections: bool,
    pub subsections: Vec<Subsection>,
    pub components: Vec<ComponentNode>,
    pub questions: Vec<Question>,
    pub attributes: Vec<AttributeRecord>,
    pub data: Option<JSValue>,
    /// `data.renderSchema`
    pub legacy_schema: Option<RenderSchema>,
    /// `document[<id>].renderSchema`
    pub flat_schema: Option<RenderSchema>,
}

impl Section {
    /// Reads a section, or `None` if it has no usable id.
    ///
    /// `document` is the whole document, needed for the oldest format where the
    /// schema sits under a top-level key named after the section.
    pub fn from_value(raw: &JSValue, document: &JSValue) -> Option<Section> {
        let id = read_id(raw.get("id"))?;
        let data = raw.get("data").filter(|d| !d.is_null()).cloned();

        let attributes_raw = raw
            .get("attributes")
            .or_else(|| data.as_ref().and_then(|d| d.get("attributes")));
        let attributes: Vec<AttributeRecord> = match attributes_raw {
            Some(JSValue::Array(items)) => items
                .iter()
                .filter_map(AttributeRecord::from_value)
                .collect(),
            _ => Vec::new(),
        };

        let dynamic_subsections = raw
            .get("dynamicSubsections")
            .and_then(|b| b.as_bool())
            .unwrap_or(false);

        // Only the responses section reads `data.questions`; elsewhere a
        // questions table under `data` is plain section data.
        let top_questions = raw
            .get("questions")
            .filter(|q| q.as_array().map_or(false, |a| !a.is_empty()));
        let is_responses =
            matches!(id.as_str(), "responses" | "questions") || top_questions.is_some();
        let questions_raw = if is_responses {
            top_questions.or_else(|| data.as_ref().and_then(|d| d.get("questions")))
        } else {
            None
        };
        let questions: Vec<Question> = match questions_raw {
            Some(JSValue::Array(items)) => items.iter().filter_map(Question::from_value).collect(),
            _ => Vec::new(),
        };

        let kind = match id.as_str() {
            "attributes" => SectionKind::Attributes,
            _ if is_responses => SectionKind::Responses,
            _ if dynamic_subsections && !attributes.is_empty() => SectionKind::Attributes,
            _ => SectionKind::Standard,
        };

        let legacy_schema = RenderSchema::from_holder(data.as_ref(), &id);
        let flat_schema = RenderSchema::from_holder(document.get(id.as_str()), &id);

        let section = Section {
            index: raw.get("index").and_then(|i| i.as_f64()),
            name: read_string(raw.get("name")),
            icon: read_string(raw.get("icon")),
            kind,
            dynamic_subsections,
            subsections: raw
                .get("subsections")
                .map(|s| read_list(s, "subsection"))
                .unwrap_or_default(),
            components: raw
                .get("components")
                .map(|c| read_list(c, "component"))
                .unwrap_or_default(),
            questions,
            attributes,
            data,
            legacy_schema,
            flat_schema,
            id,
        };
        debug!(
            "Section::from_value: {} kind: {:?} subsections: {} components: {} questions: {} attributes: {}",
            section.id,
            section.kind,
            section.subsections.len(),
            section.components.len(),
            section.questions.len(),
            section.attributes.len()
        );
        Some(section)
    }

    /// True when the children of this section are derived from data rather
    /// than declared.
    pub fn has_dynamic_subsections(&self) -> bool {
        self.dynamic_subsections || self.kind != SectionKind::Standard
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    /// Attribute records that can be navigated to, in input order.
    pub fn navigable_attributes(&self) -> Vec<&AttributeRecord> {
        self.attributes.iter().filter(|a| a.is_navigable()).collect()
    }

    pub fn attribute(&self, attribute_id: &str) -> Option<&AttributeRecord> {
        self.attributes
            .iter()
            .find(|a| a.id == attribute_id && a.is_navigable())
    }
}

impl Indexed for Section {
    fn index(&self) -> Option<f64> {
        self.index
    }
}

impl Indexed for Subsection {
    fn index(&self) -> Option<f64> {
        self.index
    }
}

impl Indexed for ComponentNode {
    fn index(&self) -> Option<f64> {
        self.index.as_ref().and_then(|n| n.as_f64())
    }
}

impl Indexed for Question {
    fn index(&self) -> Option<f64> {
        self.index
    }
}

impl Indexed for AttributeRecord {
    fn index(&self) -> Option<f64> {
        self.index
    }
}

impl<T: Indexed> Indexed for &T {
    fn index(&self) -> Option<f64> {
        (*self).index()
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub version: Option<JSValue>,
    pub language: Option<String>,
    #[serde(rename = "surveyId")]
    pub survey_id: Option<JSValue>,
}

/// A report document. Reading never fails: whatever cannot be understood is
/// reported and left out, so that lookups simply come back empty.
#[derive(PartialEq, Debug, Clone)]
pub struct Document {
    raw: JSValue,
    pub metadata: Option<Metadata>,
    pub sections: Vec<Section>,
    positions: HashMap<String, usize>,
}

impl Document {
    pub fn from_value(raw: JSValue) -> Document {
        let metadata = match raw.get("metadata") {
            Some(m) => match Metadata::deserialize(m) {
                Ok(x) => Some(x),
                Err(e) => {
                    warn!("Document: could not read metadata: {}", e);
                    None
                }
            },
            None => {
                warn!("Document: no metadata");
                None
            }
        };

        let mut sections: Vec<Section> = Vec::new();
        match raw.get("sections") {
            Some(JSValue::Array(items)) => {
                for (pos, item) in items.iter().enumerate() {
                    match Section::from_value(item, &raw) {
                        Some(s) => sections.push(s),
                        None => warn!("Document: skipping section #{} without an id", pos),
                    }
                }
            }
            Some(other) => warn!("Document: sections is not an array: {}", other),
            None => warn!("Document: no sections"),
        }

        // The first section wins when ids are repeated.
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (pos, s) in sections.iter().enumerate() {
            if positions.contains_key(&s.id) {
                warn!("Document: duplicate section id {:?}", s.id);
            } else {
                positions.insert(s.id.clone(), pos);
            }
        }

        debug!(
            "Document::from_value: {} sections, metadata: {:?}",
            sections.len(),
            metadata
        );
        Document {
            raw,
            metadata,
            sections,
            positions,
        }
    }

    /// The document as it was read.
    pub fn raw(&self) -> &JSValue {
        &self.raw
    }

    pub fn ui_texts(&self) -> Option<&JSValue> {
        self.raw.get("uiTexts")
    }

    pub fn survey_info(&self) -> Option<&JSValue> {
        self.raw.get("surveyInfo")
    }

    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.positions
            .get(section_id)
            .and_then(|pos| self.sections.get(*pos))
    }

    /// Sections in display order.
    pub fn sections_by_index(&self) -> Vec<&Section> {
        by_index(&self.sections)
    }

    /// The section owning `responses-*` keys: `responses` or `questions` by
    /// id, else the first section of that kind.
    pub fn responses_section(&self) -> Option<&Section> {
        self.owner_of(&["responses", "questions"], SectionKind::Responses)
    }

    /// The section owning `attributes-*` keys: `attributes` by id, else the
    /// first section of that kind.
    pub fn attributes_section(&self) -> Option<&Section> {
        self.owner_of(&["attributes"], SectionKind::Attributes)
    }

    fn owner_of(&self, ids: &[&str], kind: SectionKind) -> Option<&Section> {
        ids.iter()
            .filter_map(|id| self.section(id))
            .find(|s| s.kind == kind)
            .or_else(|| self.sections.iter().find(|s| s.kind == kind))
    }
}

impl PathRoot for Document {
    fn field(&self, key: &str) -> Option<&JSValue> {
        self.raw.field(key)
    }
}
