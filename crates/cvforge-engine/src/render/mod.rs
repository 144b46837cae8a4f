//! Section rendering: markdown source and scoped CSS in, sanitized markup out.

pub mod markdown;
pub mod sanitize;

use std::collections::HashMap;
use std::sync::Arc;

pub use markdown::{CommonMark, MarkdownRenderer};
pub use sanitize::{AllowListSanitizer, SanitizeContext, Sanitizer};

use crate::models::{ContentSection, SectionId};

/// Class that scopes the global stylesheet to the document root
pub const DOCUMENT_ROOT_CLASS: &str = "cv-document";

/// Sanitized output for one section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSection {
    pub id: SectionId,
    /// Class applied to the section's container; the style rule targets it
    pub class_name: String,
    pub html: String,
    pub style_rule: String,
}

struct CacheEntry {
    source: Arc<ContentSection>,
    rendered: RenderedSection,
}

/// Renders sections through a markdown renderer and a sanitizer.
///
/// Output is a pure function of `(id, content, styling)`. The last result per
/// section id is cached; a cache hit is checked against the full source, so
/// clearing or bypassing the cache never changes what is returned.
pub struct SectionRenderer {
    markdown: Box<dyn MarkdownRenderer>,
    sanitizer: Box<dyn Sanitizer>,
    cache: HashMap<SectionId, CacheEntry>,
}

impl SectionRenderer {
    pub fn new(
        markdown: impl MarkdownRenderer + 'static,
        sanitizer: impl Sanitizer + 'static,
    ) -> Self {
        Self {
            markdown: Box::new(markdown),
            sanitizer: Box::new(sanitizer),
            cache: HashMap::new(),
        }
    }

    /// Render one section, reusing the cached result when the source is unchanged
    pub fn render(&mut self, section: &Arc<ContentSection>) -> RenderedSection {
        if let Some(entry) = self.cache.get(&section.id)
            && (Arc::ptr_eq(&entry.source, section) || *entry.source == **section)
        {
            return entry.rendered.clone();
        }

        let rendered = self.render_uncached(section);
        self.cache.insert(
            section.id.clone(),
            CacheEntry {
                source: Arc::clone(section),
                rendered: rendered.clone(),
            },
        );
        rendered
    }

    /// Render every section in order and evict cache entries for sections that are gone
    pub fn render_all(&mut self, sections: &[Arc<ContentSection>]) -> Vec<RenderedSection> {
        let rendered: Vec<_> = sections.iter().map(|section| self.render(section)).collect();
        self.cache
            .retain(|id, _| sections.iter().any(|section| &section.id == id));
        rendered
    }

    /// Render without touching the cache
    pub fn render_uncached(&self, section: &ContentSection) -> RenderedSection {
        let raw_html = self.markdown.to_html(&section.content);
        let html = self
            .sanitizer
            .sanitize(SanitizeContext::Html, &raw_html)
            .unwrap_or_else(|| {
                log::warn!("Sanitizer rejected markup of section {}", section.id);
                String::new()
            });

        let class_name = section.id.css_class();
        let styling = self.sanitize_style(&section.styling);
        let style_rule = format!(".{class_name} {{ {styling} }}");

        RenderedSection {
            id: section.id.clone(),
            class_name,
            html,
            style_rule,
        }
    }

    /// Global stylesheet as a single rule scoped to the document root
    pub fn render_global_style(&self, global_style: &str) -> String {
        let styling = self.sanitize_style(global_style);
        format!(".{DOCUMENT_ROOT_CLASS} {{ {styling} }}")
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    fn sanitize_style(&self, css: &str) -> String {
        self.sanitizer
            .sanitize(SanitizeContext::Style, css)
            .unwrap_or_default()
    }
}

impl Default for SectionRenderer {
    fn default() -> Self {
        Self::new(CommonMark::default(), AllowListSanitizer)
    }
}
