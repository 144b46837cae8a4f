use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, stable identifier of a content section.
///
/// Freshly created sections get a v4 UUID, so an id is never handed out twice
/// within a session. Ids restored from a saved file are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    /// Generate a new unique id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Class name used to scope this section's style rule.
    ///
    /// Characters outside `[A-Za-z0-9-]` are hex-escaped as `_xx` so that two
    /// distinct ids never map to the same class.
    pub fn css_class(&self) -> String {
        let mut class = String::with_capacity("content-section-".len() + self.0.len());
        class.push_str("content-section-");
        for ch in self.0.chars() {
            if ch.is_ascii_alphanumeric() || ch == '-' {
                class.push(ch);
            } else {
                let mut buf = [0u8; 4];
                for byte in ch.encode_utf8(&mut buf).bytes() {
                    class.push_str(&format!("_{byte:02x}"));
                }
            }
        }
        class
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The editable fields of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionField {
    Content,
    Styling,
}

/// One unit of document content: markdown source plus CSS scoped to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSection {
    pub id: SectionId,
    pub content: String,
    #[serde(default)]
    pub styling: String,
}

impl ContentSection {
    /// Create an empty section with a fresh id
    pub fn new() -> Self {
        Self {
            id: SectionId::generate(),
            content: String::new(),
            styling: String::new(),
        }
    }

    pub fn with_content(id: impl Into<SectionId>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            styling: String::new(),
        }
    }

    /// Copy of this section with one field replaced
    pub fn with_field(&self, field: SectionField, value: String) -> Self {
        let mut updated = self.clone();
        match field {
            SectionField::Content => updated.content = value,
            SectionField::Styling => updated.styling = value,
        }
        updated
    }
}

impl Default for ContentSection {
    fn default() -> Self {
        Self::new()
    }
}
