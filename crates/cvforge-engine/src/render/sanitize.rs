//! Untrusted markup and stylesheet sanitizing.
//!
//! Every string that reaches a render surface passes through a [`Sanitizer`]
//! first. The default [`AllowListSanitizer`] keeps a conservative subset of
//! HTML (formatting, lists, tables, links, images) and rejects stylesheets
//! that could escape their `<style>` element or execute script.

use html_escape::{decode_html_entities, encode_double_quoted_attribute};

/// Where the sanitized string is going to be inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeContext {
    /// Element content
    Html,
    /// Body of a `<style>` element
    Style,
}

pub trait Sanitizer: Send + Sync {
    /// Return a safe version of `input`, or `None` if it is rejected outright
    fn sanitize(&self, context: SanitizeContext, input: &str) -> Option<String>;
}

/// Default allow-list sanitizer
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowListSanitizer;

impl Sanitizer for AllowListSanitizer {
    fn sanitize(&self, context: SanitizeContext, input: &str) -> Option<String> {
        match context {
            SanitizeContext::Html => Some(sanitize_html(input)),
            SanitizeContext::Style => sanitize_style(input),
        }
    }
}

const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "article", "b", "blockquote", "br", "caption", "code", "dd", "del", "div", "dl",
    "dt", "em", "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "i", "img", "ins", "kbd", "li", "mark", "ol", "p", "pre", "s", "section", "small",
    "span", "strong", "sub", "sup", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "u",
    "ul",
];

/// Dropped together with everything up to their closing tag
const DROPPED_WITH_CONTENT: &[&str] = &[
    "embed", "head", "iframe", "math", "noscript", "object", "script", "select", "style", "svg",
    "template", "textarea", "title",
];

const VOID_TAGS: &[&str] = &["br", "hr", "img"];

const GLOBAL_ATTRIBUTES: &[&str] = &["class", "dir", "id", "lang", "title"];

fn tag_attributes(tag: &str) -> &'static [&'static str] {
    match tag {
        "a" => &["href"],
        "img" => &["src", "alt", "width", "height"],
        "td" | "th" => &["colspan", "rowspan", "align"],
        "ol" => &["start"],
        _ => &[],
    }
}

fn sanitize_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..lt]);
        rest = &rest[lt..];

        if let Some(after) = rest.strip_prefix("<!--") {
            rest = after.find("-->").map_or("", |end| &after[end + 3..]);
            continue;
        }

        let parsed = find_tag_end(rest).and_then(|gt| Tag::parse(&rest[1..gt]).map(|tag| (tag, gt)));
        let Some((tag, gt)) = parsed else {
            // A bare '<' in text
            out.push_str("&lt;");
            rest = &rest[1..];
            continue;
        };
        rest = &rest[gt + 1..];

        if tag.closing {
            if ALLOWED_TAGS.contains(&tag.name.as_str()) && !VOID_TAGS.contains(&tag.name.as_str())
            {
                out.push_str("</");
                out.push_str(&tag.name);
                out.push('>');
            }
        } else if DROPPED_WITH_CONTENT.contains(&tag.name.as_str()) {
            if !tag.self_closing {
                rest = skip_past_closing(rest, &tag.name);
            }
        } else if ALLOWED_TAGS.contains(&tag.name.as_str()) {
            tag.write_to(&mut out);
        }
    }

    out.push_str(rest);
    out
}

/// Byte index of the `>` closing the tag that starts at `src[0] == '<'`,
/// ignoring `>` inside quoted attribute values
fn find_tag_end(src: &str) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, byte) in src.bytes().enumerate().skip(1) {
        match (quote, byte) {
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(byte),
            (None, b'>') => return Some(i),
            (None, b'<') => return None,
            (None, _) => {}
        }
    }
    None
}

fn skip_past_closing<'a>(rest: &'a str, name: &str) -> &'a str {
    let lower = rest.to_ascii_lowercase();
    let needle = format!("</{name}");
    let Some(start) = lower.find(&needle) else {
        return "";
    };
    match lower[start..].find('>') {
        Some(end) => &rest[start + end + 1..],
        None => "",
    }
}

#[derive(Debug)]
struct Tag {
    name: String,
    closing: bool,
    self_closing: bool,
    attributes: Vec<(String, Option<String>)>,
}

impl Tag {
    /// Parse the text between `<` and `>`
    fn parse(src: &str) -> Option<Self> {
        let (closing, body) = match src.strip_prefix('/') {
            Some(body) => (true, body),
            None => (false, src),
        };
        if !body.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return None;
        }
        let name_end = body
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(body.len());
        let name = body[..name_end].to_ascii_lowercase();
        let mut attrs_src = &body[name_end..];
        let self_closing = attrs_src.trim_end().ends_with('/');

        let mut attributes = Vec::new();
        loop {
            attrs_src = attrs_src.trim_start_matches(|c: char| c.is_whitespace() || c == '/');
            if attrs_src.is_empty() {
                break;
            }
            let key_end = attrs_src
                .find(|c: char| c.is_whitespace() || c == '=' || c == '/')
                .unwrap_or(attrs_src.len());
            let key = attrs_src[..key_end].to_ascii_lowercase();
            attrs_src = attrs_src[key_end..].trim_start();

            let value = if let Some(after_eq) = attrs_src.strip_prefix('=') {
                let after_eq = after_eq.trim_start();
                let (value, remaining) = match after_eq.chars().next() {
                    Some(q @ ('"' | '\'')) => {
                        let inner = &after_eq[1..];
                        match inner.find(q) {
                            Some(close) => (&inner[..close], &inner[close + 1..]),
                            None => (inner, ""),
                        }
                    }
                    _ => {
                        let end = after_eq
                            .find(char::is_whitespace)
                            .unwrap_or(after_eq.len());
                        (&after_eq[..end], &after_eq[end..])
                    }
                };
                attrs_src = remaining;
                Some(decode_html_entities(value).into_owned())
            } else {
                None
            };

            if !key.is_empty() {
                attributes.push((key, value));
            }
        }

        Some(Self {
            name,
            closing,
            self_closing,
            attributes,
        })
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        let allowed = tag_attributes(&self.name);
        for (key, value) in &self.attributes {
            if !GLOBAL_ATTRIBUTES.contains(&key.as_str()) && !allowed.contains(&key.as_str()) {
                continue;
            }
            let Some(value) = value else {
                continue;
            };
            if (key == "href" || key == "src") && !is_safe_url(value, key == "src") {
                continue;
            }
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&encode_double_quoted_attribute(value));
            out.push('"');
        }
        if VOID_TAGS.contains(&self.name.as_str()) {
            out.push_str(" />");
        } else {
            out.push('>');
        }
    }
}

fn is_safe_url(url: &str, allow_image_data: bool) -> bool {
    let normalized: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    let scheme_end = normalized.find(':');
    let path_start = normalized.find(['/', '?', '#']);
    let scheme = match (scheme_end, path_start) {
        (Some(colon), Some(path)) if path < colon => None,
        (Some(colon), _) => Some(&normalized[..colon]),
        (None, _) => None,
    };

    match scheme {
        None => true,
        Some("http" | "https" | "mailto" | "tel") => true,
        Some("data") if allow_image_data => ["png", "jpeg", "gif", "webp"]
            .iter()
            .any(|format| normalized.starts_with(&format!("data:image/{format}"))),
        Some(_) => false,
    }
}

/// Constructs that are never allowed in a section or global stylesheet
const FORBIDDEN_STYLE_TOKENS: &[&str] = &[
    "<",
    "expression(",
    "javascript:",
    "vbscript:",
    "-moz-binding",
    "behavior:",
];

fn sanitize_style(input: &str) -> Option<String> {
    let lower = input.to_ascii_lowercase();
    if let Some(token) = FORBIDDEN_STYLE_TOKENS.iter().find(|t| lower.contains(**t)) {
        log::debug!("Rejecting stylesheet containing {token:?}");
        return None;
    }
    Some(strip_imports(input))
}

/// Remove `@import ...;` statements, which would pull in unsanitized sheets
fn strip_imports(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(at) = rest.to_ascii_lowercase().find("@import") {
        out.push_str(&rest[..at]);
        rest = match rest[at..].find(';') {
            Some(semicolon) => &rest[at + semicolon + 1..],
            None => "",
        };
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn html(input: &str) -> String {
        AllowListSanitizer
            .sanitize(SanitizeContext::Html, input)
            .unwrap()
    }

    fn style(input: &str) -> Option<String> {
        AllowListSanitizer.sanitize(SanitizeContext::Style, input)
    }

    #[test]
    fn test_allowed_markup_is_unchanged() {
        let input = "<h1>Jane</h1>\n<p>A <strong>bold</strong> <em>move</em></p>\n";
        assert_eq!(html(input), input);
    }

    #[rstest]
    #[case("<p>a<script>alert(1)</script>b</p>", "<p>ab</p>")]
    #[case("<p>a<SCRIPT src=x></SCRIPT>b</p>", "<p>ab</p>")]
    #[case("<style>body{}</style><p>x</p>", "<p>x</p>")]
    #[case("<iframe src=\"evil\"></iframe>ok", "ok")]
    #[case("<p>unterminated<script>alert(1)", "<p>unterminated")]
    fn test_dangerous_elements_are_dropped_with_content(
        #[case] input: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(html(input), expected);
    }

    #[test]
    fn test_unknown_tags_are_dropped_but_content_kept() {
        assert_eq!(html("<blink>hey</blink>"), "hey");
    }

    #[test]
    fn test_event_handlers_and_styles_are_stripped() {
        assert_eq!(
            html(r#"<p onclick="alert(1)" style="color:red" class="lead">x</p>"#),
            r#"<p class="lead">x</p>"#
        );
    }

    #[rstest]
    #[case("javascript:alert(1)")]
    #[case("JaVaScRiPt:alert(1)")]
    #[case("java\tscript:alert(1)")]
    #[case("vbscript:msgbox")]
    #[case("data:text/html;base64,PHNjcmlwdD4=")]
    fn test_unsafe_link_targets_are_removed(#[case] href: &str) {
        let input = format!(r#"<a href="{href}">x</a>"#);
        assert_eq!(html(&input), "<a>x</a>");
    }

    #[rstest]
    #[case("https://example.com/cv")]
    #[case("mailto:jane@example.com")]
    #[case("/relative/path")]
    #[case("#skills")]
    #[case("page?x=a:b")]
    fn test_safe_link_targets_are_kept(#[case] href: &str) {
        let input = format!(r#"<a href="{href}">x</a>"#);
        assert!(html(&input).contains("href="), "dropped {href}");
    }

    #[test]
    fn test_image_data_urls_are_allowed_for_src_only() {
        assert_eq!(
            html(r#"<img src="data:image/png;base64,AAAA" alt="me">"#),
            r#"<img src="data:image/png;base64,AAAA" alt="me" />"#
        );
        assert_eq!(
            html(r#"<a href="data:image/png;base64,AAAA">x</a>"#),
            "<a>x</a>"
        );
    }

    #[test]
    fn test_comments_are_removed() {
        assert_eq!(html("a<!-- secret -->b"), "ab");
    }

    #[test]
    fn test_bare_angle_brackets_are_escaped() {
        assert_eq!(html("1 < 2"), "1 &lt; 2");
        assert_eq!(html("a <3 b"), "a &lt;3 b");
    }

    #[test]
    fn test_quoted_gt_inside_attribute() {
        assert_eq!(
            html(r#"<a title="a>b" href="/x">y</a>"#),
            r#"<a title="a&gt;b" href="/x">y</a>"#
        );
    }

    #[test]
    fn test_attribute_entities_are_not_double_escaped() {
        assert_eq!(
            html(r#"<a href="/q?a=1&amp;b=2">q</a>"#),
            r#"<a href="/q?a=1&amp;b=2">q</a>"#
        );
    }

    #[test]
    fn test_plain_style_passes() {
        assert_eq!(
            style("color: red; h1 { font-size: 2em; }").as_deref(),
            Some("color: red; h1 { font-size: 2em; }")
        );
    }

    #[rstest]
    #[case("</style><script>alert(1)</script>")]
    #[case("width: expression(alert(1))")]
    #[case("background: url(javascript:alert(1))")]
    #[case("-moz-binding: url(x)")]
    fn test_dangerous_styles_are_rejected(#[case] input: &str) {
        assert_eq!(style(input), None);
    }

    #[test]
    fn test_imports_are_stripped() {
        assert_eq!(
            style("@import url(x.css); p { margin: 0; }").as_deref(),
            Some(" p { margin: 0; }")
        );
    }
}
