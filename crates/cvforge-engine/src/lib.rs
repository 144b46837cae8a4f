pub mod editing;
pub mod export;
pub mod io;
pub mod models;
pub mod protocol;
pub mod render;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{DocumentStore, RestoreSelection, Snapshot, SubscriptionId};
pub use export::{ExportError, ExportRequest, PdfExporter, render_print_html};
pub use io::{FileError, load_from_file, save_to_file};
pub use models::{ContentSection, DEFAULT_GLOBAL_STYLE, SectionField, SectionId};
pub use protocol::{BridgeState, Message, PreviewBridge, PreviewRenderer};
pub use render::{RenderedSection, SectionRenderer};
