use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{ContentSection, SectionId};

/// Immutable point-in-time copy of the document state.
///
/// Sections are shared behind `Arc`, so a snapshot taken after an edit to one
/// section still points at the same allocations for every other section.
/// Consumers can use `Arc::ptr_eq` for cheap change detection.
///
/// The serialized form is the `content` payload of a `CONTENT_UPDATE` message:
/// `{"sections": [...], "globalStyle": "...", "selectedSection": "..."}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub sections: Vec<Arc<ContentSection>>,
    #[serde(default)]
    pub global_style: String,
    #[serde(rename = "selectedSection", default, with = "selection")]
    pub selected_section_id: Option<SectionId>,
}

impl Snapshot {
    pub fn new(
        sections: Vec<ContentSection>,
        global_style: impl Into<String>,
        selected_section_id: Option<SectionId>,
    ) -> Self {
        Self {
            sections: sections.into_iter().map(Arc::new).collect(),
            global_style: global_style.into(),
            selected_section_id,
        }
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn section(&self, id: &SectionId) -> Option<&ContentSection> {
        self.sections
            .iter()
            .find(|section| &section.id == id)
            .map(Arc::as_ref)
    }

    pub fn position(&self, id: &SectionId) -> Option<usize> {
        self.sections.iter().position(|section| &section.id == id)
    }

    pub fn section_ids(&self) -> impl Iterator<Item = &SectionId> {
        self.sections.iter().map(|section| &section.id)
    }

    pub fn is_selected(&self, id: &SectionId) -> bool {
        self.selected_section_id.as_ref() == Some(id)
    }
}

/// `selectedSection` travels as a plain string; `""`, `null` and absence all
/// mean "no selection".
mod selection {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::models::SectionId;

    pub fn serialize<S: Serializer>(
        value: &Option<SectionId>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_ref().map(SectionId::as_str).unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<SectionId>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.filter(|id| !id.is_empty()).map(SectionId::from))
    }
}
