//! Listener notification for received data
//!
//! Passive packets (keystrokes, directory entries, file contents, acks and
//! the data half of ping-pong exchanges) end their life as a [`PeerEvent`]
//! handed to whoever owns the connection. The hand-off is an explicit
//! channel given to the connection at construction time.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::logging::*;
use crate::protocol::commands::{Ack, StatReport};
use crate::protocol::types::{RemotePath, SystemInfo};

/// Something the peer told us
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum PeerEvent {
	SystemInfo(SystemInfo),
	Keystroke { key_code: i32 },
	DirectoryEntry { path: RemotePath },
	FileContents {
		path: RemotePath,
		#[serde(skip)]
		data: Vec<u8>,
	},
	Stat(StatReport),
	Ack(Ack),
}

pub type EventReceiver = mpsc::UnboundedReceiver<PeerEvent>;

/// Sending side of the listener channel
///
/// A sink without a channel drops every event, which is what a responder
/// that nobody is watching wants.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
	tx: Option<mpsc::UnboundedSender<PeerEvent>>,
}

impl EventSink {
	/// Create a sink together with the receiver that observes it
	pub fn channel() -> (EventSink, EventReceiver) {
		let (tx, rx) = mpsc::unbounded_channel();
		(EventSink { tx: Some(tx) }, rx)
	}

	/// A sink that discards events
	pub fn discard() -> EventSink {
		EventSink { tx: None }
	}

	pub fn notify(&self, event: PeerEvent) {
		match &self.tx {
			Some(tx) => {
				if tx.send(event).is_err() {
					debug!("event listener gone, dropping event");
				}
			}
			None => debug!("no listener for {:?}", event_name(&event)),
		}
	}
}

fn event_name(event: &PeerEvent) -> &'static str {
	match event {
		PeerEvent::SystemInfo(_) => "system-info",
		PeerEvent::Keystroke { .. } => "keystroke",
		PeerEvent::DirectoryEntry { .. } => "directory-entry",
		PeerEvent::FileContents { .. } => "file-contents",
		PeerEvent::Stat(_) => "stat",
		PeerEvent::Ack(_) => "ack",
	}
}


// vim: ts=4
