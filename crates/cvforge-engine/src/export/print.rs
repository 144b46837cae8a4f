use html_escape::encode_double_quoted_attribute;

use crate::editing::Snapshot;
use crate::render::{DOCUMENT_ROOT_CLASS, SectionRenderer};

const PRINT_BASE_STYLES: &str = "\
@media print {
  * {
    -webkit-print-color-adjust: exact !important;
    color-adjust: exact !important;
    print-color-adjust: exact !important;
  }
}
body {
  margin: 0;
  padding: 20px;
  font-family: 'Martian Mono', monospace;
  font-size: 12pt;
  line-height: 1.4;
  color: #000;
  background: #fff;
}
.content-section {
  margin-bottom: 1em;
  break-inside: avoid;
}
";

/// Compose a standalone, printable HTML page for `snapshot`.
///
/// Every section goes through `renderer`, so the page carries exactly the
/// sanitized markup and scoped rules the live preview shows.
pub fn render_print_html(snapshot: &Snapshot, renderer: &mut SectionRenderer) -> String {
    let rendered = renderer.render_all(&snapshot.sections);

    let mut styles = String::from(PRINT_BASE_STYLES);
    styles.push_str(&renderer.render_global_style(&snapshot.global_style));
    styles.push('\n');
    for section in &rendered {
        styles.push_str(&section.style_rule);
        styles.push('\n');
    }

    let mut body = String::new();
    for section in &rendered {
        body.push_str(&format!(
            "<div class=\"content-section {}\" data-section-id=\"{}\">\n{}</div>\n",
            section.class_name,
            encode_double_quoted_attribute(section.id.as_str()),
            section.html
        ));
    }

    format!(
        "<!DOCTYPE html>
<html lang=\"en\">
<head>
<meta charset=\"UTF-8\">
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">
<title>CV Export</title>
<style>
{styles}</style>
</head>
<body>
<div class=\"{DOCUMENT_ROOT_CLASS}\">
{body}</div>
</body>
</html>
"
    )
}
