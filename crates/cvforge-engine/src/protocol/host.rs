use std::cell::Cell;
use std::rc::Rc;

use crate::editing::{DocumentStore, Snapshot, SubscriptionId};
use crate::protocol::{Message, Transport};

/// Lifecycle of one preview surface as seen from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Uninitialized,
    AwaitingReady,
    Ready,
    Destroyed,
}

/// Host side of the preview: pushes full snapshots out, applies reported
/// interactions to the store.
///
/// Snapshots are only pushed once the guest is known to be listening, either
/// because it announced itself or because the surface reported load-complete.
/// Whichever arrives first wins; the current state is sent at that moment so
/// the guest never waits for the next edit.
pub struct PreviewBridge<T: Transport> {
    state: Rc<Cell<BridgeState>>,
    transport: Rc<T>,
    subscription: Option<SubscriptionId>,
}

impl<T: Transport + 'static> PreviewBridge<T> {
    pub fn new(transport: T) -> Self {
        Self {
            state: Rc::new(Cell::new(BridgeState::Uninitialized)),
            transport: Rc::new(transport),
            subscription: None,
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state.get()
    }

    /// Start observing `store`. Called when the surface starts loading.
    pub fn attach(&mut self, store: &mut DocumentStore) {
        if self.state.get() == BridgeState::Destroyed || self.subscription.is_some() {
            return;
        }

        let state = Rc::clone(&self.state);
        let transport = Rc::clone(&self.transport);
        self.subscription = Some(store.subscribe(move |snapshot| {
            if state.get() == BridgeState::Ready {
                push_snapshot(transport.as_ref(), snapshot);
            }
        }));

        if self.state.get() == BridgeState::Uninitialized {
            self.state.set(BridgeState::AwaitingReady);
        }
        log::debug!("Preview bridge attached, waiting for the guest");
    }

    /// The surface's native load-complete signal
    pub fn on_load_complete(&mut self, store: &DocumentStore) {
        if self.state.get() == BridgeState::AwaitingReady {
            log::info!("Preview surface loaded");
            self.become_ready(store.snapshot());
        }
    }

    /// Handle one raw message from the guest.
    ///
    /// Accepted in every state but `Destroyed`; the ready announcement itself
    /// arrives here while the bridge is still waiting. Malformed input is
    /// dropped.
    pub fn handle_message(&mut self, store: &mut DocumentStore, raw: &str) {
        if self.state.get() == BridgeState::Destroyed {
            return;
        }

        let message = match Message::from_json(raw) {
            Ok(message) => message,
            Err(e) => {
                log::debug!("Host ignoring inbound message: {e}");
                return;
            }
        };

        match message {
            Message::IframeReady => {
                log::info!("Preview announced readiness");
                self.become_ready(store.snapshot());
            }
            Message::SectionMoved { section_moved } => {
                match (
                    usize::try_from(section_moved.previous_index),
                    usize::try_from(section_moved.current_index),
                ) {
                    (Ok(from), Ok(to)) => store.reorder(from, to),
                    _ => log::debug!("Ignoring negative reorder {section_moved:?}"),
                }
            }
            Message::SectionSelected { section_id } => store.select(section_id),
            Message::ContentUpdate { .. } => {
                log::debug!("Host ignoring CONTENT_UPDATE from guest");
            }
        }
    }

    /// Tear the surface down. Nothing is sent afterwards.
    pub fn destroy(&mut self, store: &mut DocumentStore) {
        self.state.set(BridgeState::Destroyed);
        if let Some(subscription) = self.subscription.take() {
            store.unsubscribe(subscription);
        }
        log::info!("Preview bridge destroyed");
    }

    fn become_ready(&self, snapshot: &Snapshot) {
        self.state.set(BridgeState::Ready);
        push_snapshot(self.transport.as_ref(), snapshot);
    }
}

fn push_snapshot<T: Transport>(transport: &T, snapshot: &Snapshot) {
    let message = Message::ContentUpdate {
        content: snapshot.clone(),
    };
    if let Err(e) = transport.post(&message) {
        log::warn!("Failed to push snapshot to preview: {e}");
    }
}
