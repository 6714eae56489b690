//! # remotectl - Packet Protocol for Remote Administration
//!
//! remotectl lets one peer drive another over a single TCP stream: ask for
//! its identity, browse and manipulate the directory tree it exports, stat
//! files, and receive keystroke reports.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use remotectl::{config::Config, connect::connect, protocol::RemotePath};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let (mut client, task) = connect("127.0.0.1:7471", &config).await?;
//!     let info = client.system_info().await?;
//!     println!("{} on {}", info.name, info.os);
//!     client.list(RemotePath::root())?;
//!     while let Some(event) = client.next_event().await {
//!         println!("{:?}", event);
//!     }
//!     client.close();
//!     task.await??;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod connect;
pub mod error;
pub mod events;
pub mod logging;
pub mod protocol;
pub mod provider;
pub mod serve;
pub mod validation;

// Re-export commonly used types and functions
pub use client::{Client, FileCommand};
pub use config::Config;
pub use error::{ConfigError, ConnectionError};
pub use events::{EventReceiver, EventSink, PeerEvent};
pub use protocol::{Connection, ConnectionHandle, Packet, PacketKind, ProtocolError, RemotePath};
pub use provider::{FileSystemProvider, IdentityProvider, Services};

// vim: ts=4
