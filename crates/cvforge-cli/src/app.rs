use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use cvforge_engine::editing::{DocumentStore, RestoreSelection, Snapshot};
use cvforge_engine::export::{ExportError, PdfExporter};
use cvforge_engine::io::{self, Autosave};
use cvforge_engine::models::{DEFAULT_GLOBAL_STYLE, SectionField, SectionId};
use cvforge_engine::protocol::{ChannelTransport, Inbox, PreviewBridge, PreviewRenderer, channel};
use cvforge_engine::render::SectionRenderer;
use ratatui::widgets::ListState;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use tokio::runtime::Handle;

/// Something the run loop has to do outside the alternate screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    Content(SectionId),
    Styling(SectionId),
    GlobalStyle,
}

impl EditTarget {
    pub fn file_suffix(&self) -> &'static str {
        match self {
            EditTarget::Content(_) => ".md",
            EditTarget::Styling(_) | EditTarget::GlobalStyle => ".css",
        }
    }
}

type ExportOutcome = Result<Vec<u8>, ExportError>;

/// The editor session: the host document with its bridge on one side, the
/// preview replica on the other, connected only through channel transports.
pub struct App {
    store: DocumentStore,
    bridge: PreviewBridge<ChannelTransport>,
    guest: PreviewRenderer<ChannelTransport>,
    to_guest: Inbox,
    to_host: Inbox,
    autosave: Option<Autosave>,
    document_path: PathBuf,
    exporter: PdfExporter,
    runtime: Handle,
    export_results: (Sender<ExportOutcome>, Receiver<ExportOutcome>),
    export_in_flight: bool,
    pub sections_state: ListState,
    pub preview_state: ListState,
    pub status: String,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        initial: Snapshot,
        document_path: PathBuf,
        autosave_path: Option<&Path>,
        exporter: PdfExporter,
        runtime: Handle,
    ) -> Self {
        let mut store = DocumentStore::new();
        store.restore_snapshot(initial, RestoreSelection::Replace);

        let autosave = autosave_path.map(|path| Autosave::attach(&mut store, path));

        let (host_transport, to_guest) = channel();
        let (guest_transport, to_host) = channel();
        let mut bridge = PreviewBridge::new(host_transport);
        bridge.attach(&mut store);
        let guest = PreviewRenderer::new(guest_transport, SectionRenderer::default());

        let mut app = Self {
            store,
            bridge,
            guest,
            to_guest,
            to_host,
            autosave,
            document_path,
            exporter,
            runtime,
            export_results: mpsc::channel(),
            export_in_flight: false,
            sections_state: ListState::default(),
            preview_state: ListState::default(),
            status: String::new(),
            should_quit: false,
        };
        app.pump();
        app.sync_cursors();
        app
    }

    /// Initial document: the file if it exists, else the last autosave, else a fresh one
    pub fn initial_snapshot(document_path: &Path, autosave_path: Option<&Path>) -> Result<Snapshot> {
        if document_path.exists() {
            return io::load_from_file(document_path)
                .with_context(|| format!("Failed to load {}", document_path.display()));
        }
        Ok(autosave_path
            .and_then(Autosave::restore)
            .unwrap_or_else(|| Snapshot::new(Vec::new(), DEFAULT_GLOBAL_STYLE, None)))
    }

    pub fn snapshot(&self) -> &Snapshot {
        self.store.snapshot()
    }

    pub fn guest(&self) -> &PreviewRenderer<ChannelTransport> {
        &self.guest
    }

    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    pub fn export_in_flight(&self) -> bool {
        self.export_in_flight
    }

    /// Deliver in-flight messages in both directions until there are none
    pub fn pump(&mut self) {
        loop {
            let to_host = self.to_host.drain();
            let to_guest = self.to_guest.drain();
            if to_host.is_empty() && to_guest.is_empty() {
                break;
            }
            for raw in &to_host {
                self.bridge.handle_message(&mut self.store, raw);
            }
            for raw in &to_guest {
                self.guest.handle_message(raw);
            }
        }
    }

    /// Per-frame work: message delivery and finished exports
    pub fn tick(&mut self) {
        self.pump();
        self.sync_cursors();
        self.poll_export();
    }

    /// Handle a key press. Returns a text to edit when the key needs the external editor.
    pub fn handle_key(&mut self, code: KeyCode) -> Option<EditTarget> {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up => step(&mut self.sections_state, self.store.snapshot().len(), -1),
            KeyCode::Down => step(&mut self.sections_state, self.store.snapshot().len(), 1),
            KeyCode::Char('a') => {
                let id = self.store.add_section();
                self.sections_state.select(self.store.snapshot().position(&id));
            }
            KeyCode::Char('x') => {
                if let Some(id) = self.cursor_section() {
                    self.store.remove_section(&id);
                    self.status = "Section removed".to_string();
                }
            }
            KeyCode::Char('e') => return self.cursor_section().map(EditTarget::Content),
            KeyCode::Char('s') => return self.cursor_section().map(EditTarget::Styling),
            KeyCode::Char('g') => return Some(EditTarget::GlobalStyle),
            KeyCode::Char('j') => {
                let len = self.preview_len();
                step(&mut self.preview_state, len, 1)
            }
            KeyCode::Char('k') => {
                let len = self.preview_len();
                step(&mut self.preview_state, len, -1)
            }
            KeyCode::Enter => {
                if let Some(section) = self
                    .preview_state
                    .selected()
                    .and_then(|index| self.guest.surface().sections().get(index))
                {
                    self.guest.click_section(&section.id);
                }
            }
            KeyCode::Char('J') => self.drag_preview_cursor(1),
            KeyCode::Char('K') => self.drag_preview_cursor(-1),
            KeyCode::Char('w') => self.save(),
            KeyCode::Char('o') => self.reload(),
            KeyCode::Char('p') => self.start_export(),
            KeyCode::Char('P') => self.print_preview(),
            _ => {}
        }
        self.pump();
        self.sync_cursors();
        None
    }

    /// Current text of an edit target, for seeding the external editor
    pub fn text_for(&self, target: &EditTarget) -> Option<String> {
        let snapshot = self.store.snapshot();
        match target {
            EditTarget::Content(id) => snapshot.section(id).map(|s| s.content.clone()),
            EditTarget::Styling(id) => snapshot.section(id).map(|s| s.styling.clone()),
            EditTarget::GlobalStyle => Some(snapshot.global_style.clone()),
        }
    }

    pub fn apply_edit(&mut self, target: EditTarget, text: String) {
        match target {
            EditTarget::Content(id) => {
                self.store
                    .update_section_field(&id, SectionField::Content, text)
            }
            EditTarget::Styling(id) => {
                self.store
                    .update_section_field(&id, SectionField::Styling, text)
            }
            EditTarget::GlobalStyle => self.store.set_global_style(text),
        }
        self.pump();
    }

    /// Tear down the preview and flush autosave
    pub fn shutdown(mut self) {
        self.bridge.destroy(&mut self.store);
        if let Some(autosave) = self.autosave.take() {
            autosave.finish(&mut self.store);
        }
    }

    fn cursor_section(&self) -> Option<SectionId> {
        let index = self.sections_state.selected()?;
        self.store
            .snapshot()
            .sections
            .get(index)
            .map(|section| section.id.clone())
    }

    fn preview_len(&self) -> usize {
        self.guest.surface().section_count()
    }

    /// Report a one-step drag of the section under the preview cursor.
    ///
    /// The cursor follows the section right away; the replica itself only
    /// changes once the host echoes the new order.
    fn drag_preview_cursor(&mut self, delta: isize) {
        let Some(from) = self.preview_state.selected() else {
            return;
        };
        let Some(to) = from.checked_add_signed(delta) else {
            return;
        };
        if to >= self.preview_len() {
            return;
        }
        self.guest.drop_section(from, to);
        self.preview_state.select(Some(to));
    }

    fn save(&mut self) {
        self.status = match io::save_to_file(self.store.snapshot(), &self.document_path) {
            Ok(()) => format!("Saved {}", self.document_path.display()),
            Err(e) => {
                log::warn!("Save failed: {e}");
                format!("Save failed: {e}")
            }
        };
    }

    /// Re-read the document file. A bad file is reported and the session keeps its state.
    fn reload(&mut self) {
        self.status = match io::load_from_file(&self.document_path) {
            Ok(snapshot) => {
                self.store
                    .restore_snapshot(snapshot, RestoreSelection::KeepIfPresent);
                format!("Loaded {}", self.document_path.display())
            }
            Err(e) => {
                log::warn!("Load failed: {e}");
                format!("Load failed: {e}")
            }
        };
    }

    fn start_export(&mut self) {
        if self.export_in_flight {
            self.status = "Export already running".to_string();
            return;
        }
        let snapshot = self.store.snapshot().clone();
        let exporter = self.exporter.clone();
        let results = self.export_results.0.clone();
        self.runtime.spawn(async move {
            let outcome = exporter.export(&snapshot).await;
            report_export(&results, outcome);
        });
        self.export_in_flight = true;
        self.status = format!("Exporting via {}...", self.exporter.endpoint());
    }

    fn poll_export(&mut self) {
        let Ok(outcome) = self.export_results.1.try_recv() else {
            return;
        };
        self.export_in_flight = false;
        let target = self.document_path.with_extension("pdf");
        self.status = match outcome {
            Ok(bytes) => match std::fs::write(&target, &bytes) {
                Ok(()) => format!("Exported {}", target.display()),
                Err(e) => format!("Failed to write {}: {e}", target.display()),
            },
            Err(e) => {
                log::error!("Export failed: {e}");
                format!("Export failed: {e}")
            }
        };
    }

    fn print_preview(&mut self) {
        let target = self.document_path.with_extension("preview.html");
        let fonts_ready = std::future::ready(Ok::<(), std::io::Error>(()));
        let html = self
            .runtime
            .block_on(self.guest.print(fonts_ready, |surface| surface.to_html()));
        self.status = match std::fs::write(&target, html) {
            Ok(()) => format!("Printed preview to {}", target.display()),
            Err(e) => format!("Failed to write {}: {e}", target.display()),
        };
    }

    /// Keep both cursors inside their lists
    fn sync_cursors(&mut self) {
        clamp(&mut self.sections_state, self.store.snapshot().len());
        clamp(&mut self.preview_state, self.guest.surface().section_count());
    }
}

/// Hand an export outcome back to the editor. False when the editor is gone.
fn report_export(results: &Sender<ExportOutcome>, outcome: ExportOutcome) -> bool {
    if results.send(outcome).is_err() {
        log::debug!("Editor closed before the export finished");
        return false;
    }
    true
}

fn step(state: &mut ListState, len: usize, delta: isize) {
    if len == 0 {
        state.select(None);
        return;
    }
    let current = state.selected().unwrap_or(0);
    let next = current.saturating_add_signed(delta).min(len - 1);
    state.select(Some(next));
}

fn clamp(state: &mut ListState, len: usize) {
    match (state.selected(), len) {
        (_, 0) => state.select(None),
        (None, _) => state.select(Some(0)),
        (Some(index), len) if index >= len => state.select(Some(len - 1)),
        _ => {}
    }
}
