use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use crate::app::App;
use crate::editor::html_to_lines;

pub fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)].as_ref())
        .split(f.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)].as_ref())
        .split(rows[0]);

    // Host panel: the authoritative section list
    let snapshot = app.snapshot();
    let section_items: Vec<ListItem> = snapshot
        .sections
        .iter()
        .map(|section| {
            let marker = if snapshot.is_selected(&section.id) { "● " } else { "  " };
            let title = section
                .content
                .lines()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("(empty)");
            let styled = if section.styling.trim().is_empty() { "" } else { " [css]" };
            ListItem::new(Line::from(format!("{marker}{title}{styled}")))
        })
        .collect();

    let title = format!("Sections ({})", app.document_path().display());
    let sections_list = List::new(section_items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));
    f.render_stateful_widget(sections_list, columns[0], &mut app.sections_state);

    // Preview panel: whatever the guest replica last rendered
    let preview_items: Vec<ListItem> = app
        .guest()
        .surface()
        .sections()
        .iter()
        .map(|section| {
            let mut lines: Vec<Line> = html_to_lines(&section.html)
                .into_iter()
                .map(|line| Line::from(Span::raw(line)))
                .collect();
            if lines.is_empty() {
                lines.push(Line::from(Span::styled(
                    "(empty section)",
                    Style::default().fg(Color::DarkGray),
                )));
            }
            lines.push(Line::from(""));
            let item = ListItem::new(lines);
            if section.selected {
                item.style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan))
            } else {
                item
            }
        })
        .collect();

    let preview_title = if app.guest().surface().is_reflowing() {
        "Preview (printing)"
    } else {
        "Preview"
    };
    let preview = List::new(preview_items)
        .block(Block::default().borders(Borders::ALL).title(preview_title))
        .highlight_style(Style::default().bg(Color::DarkGray));
    f.render_stateful_widget(preview, columns[1], &mut app.preview_state);

    let status_text = if app.export_in_flight() {
        format!("[exporting] {}", app.status)
    } else {
        app.status.clone()
    };
    let status = Paragraph::new(Line::from(Span::styled(
        status_text,
        Style::default().fg(Color::Green),
    )));
    f.render_widget(status, rows[1]);

    let help_text = Line::from(vec![
        Span::raw("q: Quit | ↑/↓: Section | a: Add | x: Remove | e/s: Edit text/css | g: Global css | "),
        Span::raw("j/k: Preview | Enter: Select | J/K: Move | w: Save | o: Load | p: PDF | P: Print"),
    ]);
    f.render_widget(Paragraph::new(vec![help_text]), rows[2]);
}
