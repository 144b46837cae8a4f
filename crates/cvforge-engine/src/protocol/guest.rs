use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::editing::Snapshot;
use crate::models::SectionId;
use crate::protocol::surface::{PreviewSurface, StyleOwner};
use crate::protocol::{Message, SectionMove, Transport};
use crate::render::SectionRenderer;

/// Upper bound on waiting for fonts before a print layout is frozen
pub const FONT_READY_TIMEOUT: Duration = Duration::from_secs(2);

/// Guest side of the preview: a replica of the host's document that it renders
/// but never edits.
///
/// Construction announces readiness to the host exactly once. Interactions
/// (clicks, drops) are reported upward and only become visible once the host
/// echoes back a new snapshot.
pub struct PreviewRenderer<T: Transport> {
    transport: T,
    renderer: SectionRenderer,
    state: Snapshot,
    surface: PreviewSurface,
    updates_applied: u64,
}

impl<T: Transport> PreviewRenderer<T> {
    pub fn new(transport: T, renderer: SectionRenderer) -> Self {
        let guest = Self {
            transport,
            renderer,
            state: Snapshot::default(),
            surface: PreviewSurface::new(),
            updates_applied: 0,
        };
        guest.send(&Message::IframeReady);
        guest
    }

    /// The replica as of the last applied snapshot
    pub fn snapshot(&self) -> &Snapshot {
        &self.state
    }

    pub fn surface(&self) -> &PreviewSurface {
        &self.surface
    }

    /// Number of content updates applied since construction
    pub fn updates_applied(&self) -> u64 {
        self.updates_applied
    }

    /// Handle one raw inbound message. Anything other than a well-formed
    /// content update is ignored.
    pub fn handle_message(&mut self, raw: &str) {
        match Message::from_json(raw) {
            Ok(Message::ContentUpdate { content }) => self.apply_snapshot(content),
            Ok(other) => log::debug!("Guest ignoring {} message", other.kind()),
            Err(e) => log::debug!("Guest ignoring inbound message: {e}"),
        }
    }

    /// Replace the local state wholesale and re-render everything
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.state = snapshot;
        self.updates_applied += 1;

        let global = self.renderer.render_global_style(&self.state.global_style);
        self.surface.upsert_style(StyleOwner::Global, global);

        let rendered = self.renderer.render_all(&self.state.sections);
        self.surface
            .replace_sections(rendered, self.state.selected_section_id.as_ref());
    }

    /// Report a click on the section with `id`
    pub fn click_section(&self, id: &SectionId) {
        self.send(&Message::SectionSelected {
            section_id: id.clone(),
        });
    }

    /// Report a completed drag gesture
    pub fn drop_section(&self, previous_index: usize, current_index: usize) {
        let (Ok(previous_index), Ok(current_index)) =
            (i64::try_from(previous_index), i64::try_from(current_index))
        else {
            return;
        };
        self.send(&Message::SectionMoved {
            section_moved: SectionMove {
                previous_index,
                current_index,
            },
        });
    }

    /// Prepare the surface for printing.
    ///
    /// Waits for `fonts_ready` for at most [`FONT_READY_TIMEOUT`]; a failure or
    /// timeout is logged and printing goes ahead. Then forces a reflow.
    pub async fn before_print<F, E>(&mut self, fonts_ready: F)
    where
        F: Future<Output = Result<(), E>>,
        E: Display,
    {
        match tokio::time::timeout(FONT_READY_TIMEOUT, fonts_ready).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("Font loading failed before print: {e}"),
            Err(_) => log::warn!("Fonts not ready after {FONT_READY_TIMEOUT:?}, printing anyway"),
        }
        self.surface.set_reflow(true);
    }

    pub fn after_print(&mut self) {
        self.surface.set_reflow(false);
    }

    /// Run the whole print sequence around `print`
    pub async fn print<F, E, R>(&mut self, fonts_ready: F, print: impl FnOnce(&PreviewSurface) -> R) -> R
    where
        F: Future<Output = Result<(), E>>,
        E: Display,
    {
        self.before_print(fonts_ready).await;
        let result = print(&self.surface);
        self.after_print();
        result
    }

    fn send(&self, message: &Message) {
        if let Err(e) = self.transport.post(message) {
            log::warn!("Preview could not reach host: {e}");
        }
    }
}
