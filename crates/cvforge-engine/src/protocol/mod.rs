/*!
# Preview synchronization protocol

The editor (host) owns the [`DocumentStore`](crate::editing::DocumentStore);
the preview (guest) only ever holds a replica. The two sides talk through a
[`Transport`] carrying JSON envelopes of the form `{"type": ..., ...payload}`:

| type               | direction     | payload                                               |
|--------------------|---------------|-------------------------------------------------------|
| `IFRAME_READY`     | guest -> host | none                                                  |
| `CONTENT_UPDATE`   | host -> guest | `{content: {sections, globalStyle, selectedSection}}` |
| `SECTION_MOVED`    | guest -> host | `{sectionMoved: {previousIndex, currentIndex}}`       |
| `SECTION_SELECTED` | guest -> host | `{sectionId}`                                         |

Every content update is a full snapshot. The guest replaces its state
wholesale and never mutates it in response to its own outbound events, so the
latest snapshot to arrive always wins.
*/

pub mod guest;
pub mod host;
pub mod surface;
pub mod transport;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::editing::Snapshot;
use crate::models::SectionId;

pub use guest::{FONT_READY_TIMEOUT, PreviewRenderer};
pub use host::{BridgeState, PreviewBridge};
pub use surface::PreviewSurface;
pub use transport::{ChannelTransport, Inbox, Transport, TransportError, channel};

/// Indices of a completed drag-reorder gesture.
///
/// Kept signed on the wire: a misbehaving guest may report `-1`, which the
/// host treats like any other out-of-range index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionMove {
    pub previous_index: i64,
    pub current_index: i64,
}

/// One message crossing the host/guest boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    #[serde(rename = "IFRAME_READY")]
    IframeReady,
    #[serde(rename = "CONTENT_UPDATE")]
    ContentUpdate { content: Snapshot },
    #[serde(rename = "SECTION_MOVED", rename_all = "camelCase")]
    SectionMoved { section_moved: SectionMove },
    #[serde(rename = "SECTION_SELECTED", rename_all = "camelCase")]
    SectionSelected { section_id: SectionId },
}

#[derive(Error, Debug)]
pub enum MessageError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl Message {
    pub fn from_json(raw: &str) -> Result<Self, MessageError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> Result<String, MessageError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Wire name of the message type
    pub fn kind(&self) -> &'static str {
        match self {
            Message::IframeReady => "IFRAME_READY",
            Message::ContentUpdate { .. } => "CONTENT_UPDATE",
            Message::SectionMoved { .. } => "SECTION_MOVED",
            Message::SectionSelected { .. } => "SECTION_SELECTED",
        }
    }
}
