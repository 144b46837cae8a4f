use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, TextMergeStream, html};

/// Turns a section's markdown source into (unsanitized) HTML
pub trait MarkdownRenderer: Send + Sync {
    fn to_html(&self, source: &str) -> String;
}

/// CommonMark with tables, strikethrough and `==highlight==` marks.
///
/// Raw HTML in the source is passed through; the section renderer sanitizes
/// the result afterwards.
#[derive(Debug, Clone)]
pub struct CommonMark {
    options: Options,
    highlight: bool,
}

impl CommonMark {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            highlight: true,
        }
    }

    /// Disable the `==text==` to `<mark>` extension
    pub fn without_highlight(mut self) -> Self {
        self.highlight = false;
        self
    }
}

impl Default for CommonMark {
    fn default() -> Self {
        Self::new(Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH)
    }
}

impl MarkdownRenderer for CommonMark {
    fn to_html(&self, source: &str) -> String {
        let parser = TextMergeStream::new(Parser::new_ext(source, self.options));
        let mut out = String::with_capacity(source.len() * 3 / 2);
        if self.highlight {
            let mut in_code_block = false;
            let events = parser.flat_map(move |event| {
                match &event {
                    Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
                    Event::End(TagEnd::CodeBlock) => in_code_block = false,
                    _ => {}
                }
                if in_code_block {
                    vec![event]
                } else {
                    mark_highlights(event)
                }
            });
            html::push_html(&mut out, events);
        } else {
            html::push_html(&mut out, parser);
        }
        out
    }
}

/// Split `==marked==` spans out of a text event. Never called on code block text.
///
/// Delimiters pair up left to right within one (merged) text run; a trailing
/// unpaired `==` stays literal.
fn mark_highlights(event: Event<'_>) -> Vec<Event<'_>> {
    let text = match event {
        Event::Text(text) if text.contains("==") => text,
        other => return vec![other],
    };

    let parts: Vec<&str> = text.split("==").collect();
    let delimiters = parts.len() - 1;
    let paired = delimiters - delimiters % 2;

    let mut events = Vec::with_capacity(parts.len() * 2);
    let mut open = false;
    for (i, part) in parts.iter().enumerate() {
        if !part.is_empty() {
            events.push(Event::Text(CowStr::from(part.to_string())));
        }
        if i < paired {
            let tag = if open { "</mark>" } else { "<mark>" };
            events.push(Event::InlineHtml(CowStr::Borrowed(tag)));
            open = !open;
        } else if i < delimiters {
            events.push(Event::Text(CowStr::Borrowed("==")));
        }
    }
    events
}
