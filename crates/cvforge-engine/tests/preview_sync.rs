//! Host and guest wired together over an in-process channel, pumped by hand
//! the way the terminal editor does it.

use cvforge_engine::editing::{DocumentStore, RestoreSelection, Snapshot};
use cvforge_engine::models::{ContentSection, SectionField};
use cvforge_engine::protocol::{
    BridgeState, ChannelTransport, Inbox, Message, PreviewBridge, PreviewRenderer, channel,
};
use cvforge_engine::render::SectionRenderer;
use pretty_assertions::assert_eq;

struct Session {
    store: DocumentStore,
    bridge: PreviewBridge<ChannelTransport>,
    guest: PreviewRenderer<ChannelTransport>,
    to_guest: Inbox,
    to_host: Inbox,
}

impl Session {
    /// Store and bridge exist first; the guest is constructed afterwards, as
    /// when a preview surface starts loading.
    fn start(store: DocumentStore) -> Self {
        let (host_transport, to_guest) = channel();
        let (guest_transport, to_host) = channel();

        let mut store = store;
        let mut bridge = PreviewBridge::new(host_transport);
        bridge.attach(&mut store);
        let guest = PreviewRenderer::new(guest_transport, SectionRenderer::default());

        Self {
            store,
            bridge,
            guest,
            to_guest,
            to_host,
        }
    }

    /// Deliver everything in flight in both directions until quiet
    fn pump(&mut self) {
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
}

fn ids(snapshot: &Snapshot) -> Vec<String> {
    snapshot.section_ids().map(|id| id.to_string()).collect()
}

#[test]
fn test_end_to_end_single_heading() {
    let mut session = Session::start(DocumentStore::new());

    let id = session.store.add_section();
    assert_eq!(session.store.snapshot().len(), 1);
    assert_eq!(session.store.snapshot().sections[0].content, "");

    session
        .store
        .update_section_field(&id, SectionField::Content, "# Hi");
    session.pump();

    assert_eq!(session.bridge.state(), BridgeState::Ready);
    assert_eq!(session.guest.surface().section_count(), 1);
    let section = &session.guest.surface().sections()[0];
    assert_eq!(section.html, "<h1>Hi</h1>\n");
    assert_eq!(session.guest.snapshot(), session.store.snapshot());
}

#[test]
fn test_edits_before_readiness_are_not_lost() {
    let mut session = Session::start(DocumentStore::new());

    // Nothing has been delivered yet, so the host is still waiting
    session.store.add_section();
    session.store.add_section();
    assert_eq!(session.bridge.state(), BridgeState::AwaitingReady);
    assert!(session.to_guest.drain().is_empty());

    session.pump();
    assert_eq!(session.guest.surface().section_count(), 2);
    assert_eq!(session.guest.updates_applied(), 1);
}

#[test]
fn test_load_complete_before_ready_announcement_converges() {
    let mut session = Session::start(DocumentStore::new());
    session.store.add_section();

    session.bridge.on_load_complete(&session.store);
    session.pump();

    // One update from load-complete, one resend after the announcement
    assert_eq!(session.guest.updates_applied(), 2);
    assert_eq!(session.guest.snapshot(), session.store.snapshot());
    assert_eq!(session.guest.surface().style_element_count(), 2);
}

#[test]
fn test_guest_interactions_round_trip_through_the_host() {
    let mut store = DocumentStore::new();
    store.restore_snapshot(
        Snapshot::new(
            ["a", "b", "c", "d"]
                .into_iter()
                .map(|id| ContentSection::with_content(id, id.to_uppercase()))
                .collect(),
            "",
            None,
        ),
        RestoreSelection::Replace,
    );
    let mut session = Session::start(store);
    session.pump();

    session.guest.drop_section(0, 2);
    // The guest reports but does not reorder its replica on its own
    assert_eq!(ids(session.guest.snapshot()), vec!["a", "b", "c", "d"]);

    session.pump();
    assert_eq!(ids(session.store.snapshot()), vec!["b", "c", "a", "d"]);
    assert_eq!(ids(session.guest.snapshot()), vec!["b", "c", "a", "d"]);

    session.guest.click_section(&"c".into());
    session.pump();
    assert_eq!(session.store.selected_section_id(), Some(&"c".into()));
    let selected: Vec<_> = session
        .guest
        .surface()
        .sections()
        .iter()
        .filter(|section| section.selected)
        .map(|section| section.id.to_string())
        .collect();
    assert_eq!(selected, vec!["c"]);
}

#[test]
fn test_out_of_range_moves_from_guest_change_nothing() {
    let mut store = DocumentStore::new();
    store.restore_snapshot(
        Snapshot::new(
            vec![
                ContentSection::with_content("a", "A"),
                ContentSection::with_content("b", "B"),
                ContentSection::with_content("c", "C"),
            ],
            "",
            None,
        ),
        RestoreSelection::Replace,
    );
    let mut session = Session::start(store);
    session.pump();
    let version = session.store.version();

    let negative = Message::SectionMoved {
        section_moved: cvforge_engine::protocol::SectionMove {
            previous_index: -1,
            current_index: 0,
        },
    };
    session
        .bridge
        .handle_message(&mut session.store, &negative.to_json().unwrap());
    session.guest.drop_section(0, 999);
    session.pump();

    assert_eq!(session.store.version(), version);
    assert_eq!(ids(session.store.snapshot()), vec!["a", "b", "c"]);
}

#[test]
fn test_removing_selected_section_clears_selection_on_both_sides() {
    let mut session = Session::start(DocumentStore::new());
    let first = session.store.add_section();
    let second = session.store.add_section();
    session.store.select(second.clone());
    session.pump();
    assert!(session.guest.snapshot().is_selected(&second));

    session.store.remove_section(&second);
    session.pump();

    assert_eq!(session.store.selected_section_id(), None);
    assert_eq!(session.guest.snapshot().selected_section_id, None);
    assert_eq!(ids(session.guest.snapshot()), vec![first.to_string()]);
    // The removed section's style element is gone as well
    assert_eq!(session.guest.surface().style_element_count(), 2);
}

#[test]
fn test_destroyed_preview_leaves_editing_usable() {
    let mut session = Session::start(DocumentStore::new());
    session.pump();

    session.bridge.destroy(&mut session.store);
    session.store.add_section();
    session.pump();

    assert_eq!(session.store.snapshot().len(), 1);
    assert_eq!(session.guest.surface().section_count(), 0);
}
