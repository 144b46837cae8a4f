use std::sync::mpsc::{self, Receiver, Sender};

use thiserror::Error;

use crate::protocol::{Message, MessageError};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Peer is gone; message {kind} was dropped")]
    Disconnected { kind: &'static str },

    #[error("Failed to encode message: {0}")]
    Encode(#[from] MessageError),
}

/// One direction of the host/guest channel.
///
/// Delivery is fire-and-forget: no acknowledgement, no retry. A sender only
/// learns that the peer is definitely gone.
pub trait Transport {
    fn post(&self, message: &Message) -> Result<(), TransportError>;
}

/// Transport over an in-process channel carrying encoded JSON
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    sender: Sender<String>,
}

impl Transport for ChannelTransport {
    fn post(&self, message: &Message) -> Result<(), TransportError> {
        let encoded = message.to_json()?;
        self.sender
            .send(encoded)
            .map_err(|_| TransportError::Disconnected {
                kind: message.kind(),
            })
    }
}

/// Receiving end of a [`ChannelTransport`]
#[derive(Debug)]
pub struct Inbox {
    receiver: Receiver<String>,
}

impl Inbox {
    /// Every raw message that has arrived so far, in arrival order
    pub fn drain(&self) -> Vec<String> {
        self.receiver.try_iter().collect()
    }
}

/// Create a connected transport/inbox pair
pub fn channel() -> (ChannelTransport, Inbox) {
    let (sender, receiver) = mpsc::channel();
    (ChannelTransport { sender }, Inbox { receiver })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_posted_messages_arrive_encoded_in_order() {
        let (transport, inbox) = channel();
        transport.post(&Message::IframeReady).unwrap();
        transport
            .post(&Message::SectionSelected {
                section_id: "a".into(),
            })
            .unwrap();

        assert_eq!(
            inbox.drain(),
            vec![
                r#"{"type":"IFRAME_READY"}"#.to_string(),
                r#"{"type":"SECTION_SELECTED","sectionId":"a"}"#.to_string(),
            ]
        );
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn test_post_after_inbox_dropped_reports_disconnect() {
        let (transport, inbox) = channel();
        drop(inbox);

        let err = transport.post(&Message::IframeReady).unwrap_err();
        assert!(matches!(
            err,
            TransportError::Disconnected {
                kind: "IFRAME_READY"
            }
        ));
    }
}
