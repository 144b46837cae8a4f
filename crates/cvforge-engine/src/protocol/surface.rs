use html_escape::encode_double_quoted_attribute;

use crate::models::SectionId;
use crate::render::{DOCUMENT_ROOT_CLASS, RenderedSection};

/// Which part of the document a style element belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleOwner {
    Global,
    Section(SectionId),
}

/// An injected `<style>` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleElement {
    pub owner: StyleOwner,
    pub css: String,
}

/// A rendered section as placed in the document body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceSection {
    pub id: SectionId,
    pub class_name: String,
    pub html: String,
    pub selected: bool,
}

/// The guest's render target: head styles plus the document body.
///
/// Style elements are keyed by owner. Each one is created the first time its
/// owner is seen and updated in place afterwards; elements whose section is
/// gone are removed.
#[derive(Debug, Default)]
pub struct PreviewSurface {
    styles: Vec<StyleElement>,
    sections: Vec<SurfaceSection>,
    reflow: bool,
}

impl PreviewSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or update the style element owned by `owner`
    pub fn upsert_style(&mut self, owner: StyleOwner, css: String) {
        match self.styles.iter_mut().find(|element| element.owner == owner) {
            Some(element) => element.css = css,
            None => self.styles.push(StyleElement { owner, css }),
        }
    }

    /// Replace the body with `rendered` and sync section style elements to it
    pub fn replace_sections(&mut self, rendered: Vec<RenderedSection>, selected: Option<&SectionId>) {
        self.styles.retain(|element| match &element.owner {
            StyleOwner::Global => true,
            StyleOwner::Section(id) => rendered.iter().any(|section| &section.id == id),
        });

        let mut sections = Vec::with_capacity(rendered.len());
        for section in rendered {
            self.upsert_style(StyleOwner::Section(section.id.clone()), section.style_rule);
            sections.push(SurfaceSection {
                selected: selected == Some(&section.id),
                id: section.id,
                class_name: section.class_name,
                html: section.html,
            });
        }
        self.sections = sections;
    }

    pub fn sections(&self) -> &[SurfaceSection] {
        &self.sections
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn styles(&self) -> &[StyleElement] {
        &self.styles
    }

    pub fn style_element_count(&self) -> usize {
        self.styles.len()
    }

    pub fn set_reflow(&mut self, reflow: bool) {
        self.reflow = reflow;
    }

    pub fn is_reflowing(&self) -> bool {
        self.reflow
    }

    /// Serialize the surface as an HTML fragment (head styles followed by the body)
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for element in &self.styles {
            let owner = match &element.owner {
                StyleOwner::Global => "global".to_string(),
                StyleOwner::Section(id) => encode_double_quoted_attribute(id.as_str()).into_owned(),
            };
            out.push_str(&format!(
                "<style data-owner=\"{owner}\">{}</style>\n",
                element.css
            ));
        }

        out.push_str(&format!("<div class=\"{DOCUMENT_ROOT_CLASS}\""));
        if self.reflow {
            out.push_str(" data-print-reflow");
        }
        out.push_str(">\n");
        for section in &self.sections {
            out.push_str(&format!(
                "<div class=\"content-section {}\" data-section-id=\"{}\"",
                section.class_name,
                encode_double_quoted_attribute(section.id.as_str())
            ));
            if section.selected {
                out.push_str(" data-selected");
            }
            out.push_str(&format!(">{}</div>\n", section.html));
        }
        out.push_str("</div>\n");
        out
    }
}
