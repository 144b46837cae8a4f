use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::editing::{DocumentStore, Snapshot, SubscriptionId};
use crate::io::{load_from_file, save_to_file};

/// Persists every committed store state to a file on a background thread.
///
/// The store's notification only queues the snapshot; writing happens on the
/// worker, which collapses a backlog down to the newest state. A failed write
/// is logged and the in-memory document is left alone.
pub struct Autosave {
    subscription: SubscriptionId,
    worker: JoinHandle<()>,
}

impl Autosave {
    pub fn attach(store: &mut DocumentStore, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (sender, receiver) = mpsc::channel::<Snapshot>();

        log::info!("Autosaving to {}", path.display());
        let worker = thread::spawn(move || write_loop(&path, receiver));

        let subscription = store.subscribe(move |snapshot| queue(&sender, snapshot));

        Self {
            subscription,
            worker,
        }
    }

    /// Stop observing `store` and wait for pending writes to land
    pub fn finish(self, store: &mut DocumentStore) {
        // Dropping the listener drops the last sender, which ends the worker
        store.unsubscribe(self.subscription);
        if self.worker.join().is_err() {
            log::error!("Autosave worker panicked");
        }
    }

    /// Load the last autosaved document, if there is a usable one
    pub fn restore(path: &Path) -> Option<Snapshot> {
        if !path.exists() {
            return None;
        }
        match load_from_file(path) {
            Ok(snapshot) => {
                log::info!("Restored autosave from {}", path.display());
                Some(snapshot)
            }
            Err(e) => {
                log::warn!("Ignoring unusable autosave: {e}");
                None
            }
        }
    }
}

fn queue(sender: &Sender<Snapshot>, snapshot: &Snapshot) {
    if sender.send(snapshot.clone()).is_err() {
        log::warn!("Autosave worker is gone, change not persisted");
    }
}

fn write_loop(path: &Path, receiver: Receiver<Snapshot>) {
    while let Ok(mut snapshot) = receiver.recv() {
        if let Some(newest) = receiver.try_iter().last() {
            snapshot = newest;
        }
        match save_to_file(&snapshot, path) {
            Ok(()) => log::debug!("Autosaved {} sections", snapshot.len()),
            Err(e) => log::warn!("Autosave failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SectionField;
    use crate::tests::store_with;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_latest_state_is_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("autosave.json");
        let mut store = store_with(&["a"]);

        let autosave = Autosave::attach(&mut store, &path);
        let id = store.add_section();
        store.update_section_field(&id, SectionField::Content, "# New");
        store.select(id);
        autosave.finish(&mut store);

        let mut expected = store.snapshot().clone();
        expected.selected_section_id = None;
        assert_eq!(Autosave::restore(&path), Some(expected));
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_failed_write_leaves_document_intact() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be written as a file
        let mut store = store_with(&["a"]);
        let autosave = Autosave::attach(&mut store, dir.path());

        store.add_section();
        autosave.finish(&mut store);

        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn test_restore_ignores_missing_and_corrupt_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("autosave.json");
        assert_eq!(Autosave::restore(&path), None);

        std::fs::write(&path, "{broken").unwrap();
        assert_eq!(Autosave::restore(&path), None);
    }
}
