use crate::editing::{DocumentStore, RestoreSelection, Snapshot};
use crate::models::ContentSection;

/// Build a store whose sections have ids `names` and content `"<name> content"`
pub fn store_with(names: &[&str]) -> DocumentStore {
    let mut store = DocumentStore::new();
    store.restore_snapshot(snapshot_with(names), RestoreSelection::Replace);
    store
}

/// Snapshot whose sections have ids `names` and content `"<name> content"`
pub fn snapshot_with(names: &[&str]) -> Snapshot {
    let sections = names
        .iter()
        .map(|name| ContentSection::with_content(*name, format!("{name} content")))
        .collect();
    Snapshot::new(sections, "", None)
}

/// Section ids in order
pub fn ids(snapshot: &Snapshot) -> Vec<&str> {
    snapshot.section_ids().map(|id| id.as_str()).collect()
}
