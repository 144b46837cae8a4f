use std::sync::Arc;

use crate::editing::Snapshot;
use crate::models::{ContentSection, SectionField, SectionId};

/// Callback registered with [`DocumentStore::subscribe`]
pub type Listener = Box<dyn FnMut(&Snapshot)>;

/// Handle returned by [`DocumentStore::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// How [`DocumentStore::restore_snapshot`] treats the current selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreSelection {
    /// Take the snapshot's selection as-is
    Replace,
    /// Keep the current selection when its section survives the restore, clear it otherwise
    KeepIfPresent,
}

/// Authoritative document state on the host side.
///
/// Every mutation goes through the methods below. A mutation that changes
/// state bumps the version and synchronously notifies every listener with the
/// full current state. Mutations that turn out to be no-ops (unknown id,
/// out-of-range index) leave the version alone and notify nobody.
///
/// Listeners only ever see `&Snapshot`, so they cannot call back into the
/// store while a notification is in flight. Cross-boundary reactions (the
/// preview bridge) hold their own handles and act on the next inbound message.
pub struct DocumentStore {
    state: Snapshot,
    version: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl DocumentStore {
    /// Create an empty document
    pub fn new() -> Self {
        Self::from_snapshot(Snapshot::default())
    }

    /// Create a store hydrated from a previously persisted snapshot
    pub fn from_snapshot(state: Snapshot) -> Self {
        Self {
            state,
            version: 0,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Current state
    pub fn snapshot(&self) -> &Snapshot {
        &self.state
    }

    /// Number of committed mutations since construction
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn selected_section_id(&self) -> Option<&SectionId> {
        self.state.selected_section_id.as_ref()
    }

    /// Append an empty section with a fresh id. Selection is unchanged.
    pub fn add_section(&mut self) -> SectionId {
        let section = ContentSection::new();
        let id = section.id.clone();
        log::debug!("Adding section {id}");
        self.state.sections.push(Arc::new(section));
        self.commit();
        id
    }

    /// Remove the section with `id`; clears the selection if it pointed there
    pub fn remove_section(&mut self, id: &SectionId) {
        let Some(index) = self.state.position(id) else {
            return;
        };
        log::debug!("Removing section {id} at index {index}");
        self.state.sections.remove(index);
        if self.state.selected_section_id.as_ref() == Some(id) {
            self.state.selected_section_id = None;
        }
        self.commit();
    }

    /// Replace one field of the section with `id`.
    ///
    /// Only that section's `Arc` is swapped; every other section keeps its
    /// allocation.
    pub fn update_section_field(
        &mut self,
        id: &SectionId,
        field: SectionField,
        value: impl Into<String>,
    ) {
        let Some(index) = self.state.position(id) else {
            return;
        };
        let updated = self.state.sections[index].with_field(field, value.into());
        log::debug!("Updating {field:?} of section {id}");
        self.state.sections[index] = Arc::new(updated);
        self.commit();
    }

    /// Move the section at `from` so that it ends up at `to`.
    ///
    /// List-move semantics: remove, then reinsert into the remaining sequence.
    /// Both indices must be `< len`; anything else is a no-op.
    pub fn reorder(&mut self, from: usize, to: usize) {
        let len = self.state.sections.len();
        if from >= len || to >= len {
            log::debug!("Ignoring out-of-range reorder {from} -> {to} (len {len})");
            return;
        }
        if from == to {
            return;
        }
        let section = self.state.sections.remove(from);
        self.state.sections.insert(to, section);
        self.commit();
    }

    /// Select `id`. The id is not checked against the current sections.
    pub fn select(&mut self, id: impl Into<SectionId>) {
        self.state.selected_section_id = Some(id.into());
        self.commit();
    }

    /// Replace the global stylesheet wholesale
    pub fn set_global_style(&mut self, text: impl Into<String>) {
        self.state.global_style = text.into();
        self.commit();
    }

    /// Replace sections and global style (and optionally selection) wholesale
    pub fn restore_snapshot(&mut self, snapshot: Snapshot, selection: RestoreSelection) {
        let selected = match selection {
            RestoreSelection::Replace => snapshot.selected_section_id,
            RestoreSelection::KeepIfPresent => self
                .state
                .selected_section_id
                .take()
                .filter(|id| snapshot.sections.iter().any(|section| &section.id == id)),
        };
        self.state = Snapshot {
            sections: snapshot.sections,
            global_style: snapshot.global_style,
            selected_section_id: selected,
        };
        log::debug!("Restored snapshot with {} sections", self.state.len());
        self.commit();
    }

    /// Register a listener called after every committed mutation
    pub fn subscribe(&mut self, listener: impl FnMut(&Snapshot) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(subscription, _)| *subscription != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn commit(&mut self) {
        self.version += 1;
        let state = &self.state;
        for (_, listener) in self.listeners.iter_mut() {
            listener(state);
        }
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{ids, store_with};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_add_section_appends_empty_section() {
        let mut store = DocumentStore::new();
        let first = store.add_section();
        let second = store.add_section();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.sections[0].id, first);
        assert_eq!(snapshot.sections[1].id, second);
        assert_eq!(snapshot.sections[1].content, "");
        assert_eq!(snapshot.sections[1].styling, "");
        assert_eq!(store.selected_section_id(), None);
    }

    #[test]
    fn test_add_section_leaves_selection_alone() {
        let mut store = store_with(&["a"]);
        store.select("a");
        store.add_section();
        assert_eq!(store.selected_section_id(), Some(&SectionId::from("a")));
    }

    #[rstest]
    #[case(0, 2, &["B", "C", "A", "D"])]
    #[case(3, 0, &["D", "A", "B", "C"])]
    #[case(1, 2, &["A", "C", "B", "D"])]
    #[case(2, 1, &["A", "C", "B", "D"])]
    #[case(1, 1, &["A", "B", "C", "D"])]
    fn test_reorder_is_list_move(
        #[case] from: usize,
        #[case] to: usize,
        #[case] expected: &[&str],
    ) {
        let mut store = store_with(&["A", "B", "C", "D"]);
        store.reorder(from, to);
        assert_eq!(ids(store.snapshot()), expected);
    }

    #[rstest]
    #[case(0, 999)]
    #[case(999, 0)]
    #[case(3, 0)]
    #[case(0, 3)]
    fn test_reorder_out_of_bounds_is_noop(#[case] from: usize, #[case] to: usize) {
        let mut store = store_with(&["A", "B", "C"]);
        let before = store.snapshot().clone();
        let version = store.version();

        store.reorder(from, to);

        assert_eq!(store.snapshot(), &before);
        assert_eq!(store.version(), version);
    }

    #[test]
    fn test_removing_selected_section_clears_selection() {
        let mut store = store_with(&["X", "Y"]);
        store.select("X");

        store.remove_section(&"X".into());

        assert_eq!(ids(store.snapshot()), vec!["Y"]);
        assert_eq!(store.selected_section_id(), None);
    }

    #[test]
    fn test_removing_other_section_keeps_selection() {
        let mut store = store_with(&["X", "Y"]);
        store.select("X");

        store.remove_section(&"Y".into());

        assert_eq!(store.selected_section_id(), Some(&SectionId::from("X")));
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut store = store_with(&["A"]);
        let version = store.version();
        store.remove_section(&"missing".into());
        assert_eq!(ids(store.snapshot()), vec!["A"]);
        assert_eq!(store.version(), version);
    }

    #[test]
    fn test_update_keeps_other_sections_by_reference() {
        let mut store = store_with(&["A", "B", "C"]);
        let before = store.snapshot().clone();

        store.update_section_field(&"B".into(), SectionField::Content, "# Changed");

        let after = store.snapshot();
        assert!(Arc::ptr_eq(&before.sections[0], &after.sections[0]));
        assert!(!Arc::ptr_eq(&before.sections[1], &after.sections[1]));
        assert!(Arc::ptr_eq(&before.sections[2], &after.sections[2]));
        assert_eq!(after.sections[1].content, "# Changed");
        assert_eq!(after.sections[1].id, SectionId::from("B"));
        // The earlier snapshot is untouched
        assert_eq!(before.sections[1].content, "B content");
    }

    #[test]
    fn test_update_styling_field() {
        let mut store = store_with(&["A"]);
        store.update_section_field(&"A".into(), SectionField::Styling, "color: red;");
        assert_eq!(store.snapshot().sections[0].styling, "color: red;");
        assert_eq!(store.snapshot().sections[0].content, "A content");
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut store = store_with(&["A"]);
        let version = store.version();
        store.update_section_field(&"nope".into(), SectionField::Content, "x");
        assert_eq!(store.version(), version);
    }

    #[test]
    fn test_select_is_permissive() {
        let mut store = store_with(&["A"]);
        store.select("does-not-exist");
        assert_eq!(
            store.selected_section_id(),
            Some(&SectionId::from("does-not-exist"))
        );
    }

    #[test]
    fn test_set_global_style_replaces_text() {
        let mut store = DocumentStore::new();
        store.set_global_style("body { color: red; }");
        store.set_global_style("body { color: blue; }");
        assert_eq!(store.snapshot().global_style, "body { color: blue; }");
    }

    #[test]
    fn test_restore_snapshot_replaces_everything() {
        let mut store = store_with(&["A", "B"]);
        store.select("A");
        let restored = Snapshot::new(
            vec![ContentSection::with_content("Z", "zz")],
            "h1 {}",
            Some(SectionId::from("Z")),
        );

        store.restore_snapshot(restored.clone(), RestoreSelection::Replace);

        assert_eq!(store.snapshot(), &restored);
    }

    #[test]
    fn test_restore_keeps_selection_only_when_section_survives() {
        let mut store = store_with(&["A", "B"]);
        store.select("A");
        let keeps_a = Snapshot::new(vec![ContentSection::with_content("A", "new")], "", None);
        store.restore_snapshot(keeps_a, RestoreSelection::KeepIfPresent);
        assert_eq!(store.selected_section_id(), Some(&SectionId::from("A")));

        let drops_a = Snapshot::new(vec![ContentSection::with_content("Q", "q")], "", None);
        store.restore_snapshot(drops_a, RestoreSelection::KeepIfPresent);
        assert_eq!(store.selected_section_id(), None);
    }

    #[test]
    fn test_subscribers_receive_full_state_after_each_mutation() {
        let mut store = DocumentStore::new();
        let seen: Rc<RefCell<Vec<usize>>> = Rc::default();
        let sink = Rc::clone(&seen);
        store.subscribe(move |snapshot| sink.borrow_mut().push(snapshot.len()));

        let id = store.add_section();
        store.add_section();
        store.update_section_field(&id, SectionField::Content, "hi");
        store.reorder(0, 7); // no-op, no notification

        assert_eq!(*seen.borrow(), vec![1, 2, 2]);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut store = DocumentStore::new();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let subscription = store.subscribe(move |_| *sink.borrow_mut() += 1);

        store.add_section();
        assert!(store.unsubscribe(subscription));
        assert!(!store.unsubscribe(subscription));
        store.add_section();

        assert_eq!(*count.borrow(), 1);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_listeners_run_in_subscription_order() {
        let mut store = DocumentStore::new();
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        for name in ["first", "second", "third"] {
            let sink = Rc::clone(&order);
            store.subscribe(move |_| sink.borrow_mut().push(name));
        }

        store.add_section();

        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }
}
