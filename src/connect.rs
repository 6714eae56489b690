//! Requester: open a connection to a responder

use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use crate::client::Client;
use crate::config::Config;
use crate::error::ConnectionError;
use crate::events::EventSink;
use crate::logging::*;
use crate::protocol::{Connection, ProtocolResult};
use crate::provider::Services;

/// Connect to `addr` and start the connection task
///
/// The returned task finishes when both sides have closed; await it after
/// [`Client::close`] to be sure everything queued was written.
pub async fn connect(
	addr: &str,
	config: &Config,
) -> Result<(Client, JoinHandle<ProtocolResult<()>>), ConnectionError> {
	let stream = TcpStream::connect(addr)
		.await
		.map_err(|e| ConnectionError::ConnectFailed { addr: addr.to_string(), source: e })?;
	stream.set_nodelay(true)?;
	debug!("connected to {}", addr);

	let (events, rx) = EventSink::channel();
	let connection = Connection::new(stream, addr, Services::requester(), events, config.limits);
	let client = Client::new(connection.handle(), rx);
	let task = tokio::spawn(connection.run());
	Ok((client, task))
}

// vim: ts=4
