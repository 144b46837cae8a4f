use anyhow::{Context, Result, bail};
use std::io::Write;
use std::process::Command;

/// Open `initial` in the external editor `command` and return the saved text.
///
/// `command` may carry arguments (`"code --wait"`); the temp file path is
/// appended. `suffix` picks the file extension so editors highlight properly.
pub fn edit_text(command: &str, initial: &str, suffix: &str) -> Result<String> {
    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        bail!("No editor configured");
    };

    let mut file = tempfile::Builder::new()
        .prefix("cvforge-")
        .suffix(suffix)
        .tempfile()
        .context("Failed to create temp file for editing")?;
    file.write_all(initial.as_bytes())?;
    file.flush()?;

    let status = Command::new(program)
        .args(parts)
        .arg(file.path())
        .status()
        .with_context(|| format!("Failed to launch editor '{program}'"))?;
    if !status.success() {
        bail!("Editor '{program}' exited with {status}");
    }

    std::fs::read_to_string(file.path()).context("Failed to read edited text back")
}

/// Rough plain-text view of sanitized section markup for the terminal
pub fn html_to_lines(html: &str) -> Vec<String> {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find('<') {
        text.push_str(&rest[..start]);
        let Some(end) = rest[start..].find('>') else {
            rest = "";
            break;
        };
        let tag = &rest[start + 1..start + end];
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or_default();
        match name {
            "li" if !tag.starts_with('/') => text.push_str("• "),
            "br" | "p" | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "tr" | "hr"
                if tag.starts_with('/') || name == "br" || name == "hr" =>
            {
                text.push('\n')
            }
            _ => {}
        }
        rest = &rest[start + end + 1..];
    }
    text.push_str(rest);

    html_escape::decode_html_entities(&text)
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_html_to_lines() {
        let html = "<h1>Jane &amp; Co</h1>\n<ul>\n<li>Rust</li>\n<li>Go</li>\n</ul>\n<p>a<br />b</p>\n";
        assert_eq!(
            html_to_lines(html),
            vec!["Jane & Co", "• Rust", "• Go", "a", "b"]
        );
    }

    #[test]
    fn test_edit_with_non_interactive_command() {
        // `true` leaves the file untouched
        let edited = edit_text("true", "# Draft", ".md").unwrap();
        assert_eq!(edited, "# Draft");
    }

    #[test]
    fn test_failing_editor_is_an_error() {
        assert!(edit_text("false", "", ".md").is_err());
        assert!(edit_text("   ", "", ".md").is_err());
    }
}
