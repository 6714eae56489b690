//! Responder: accept peers and serve each on its own task

use tokio::net::TcpListener;

use crate::config::Config;
use crate::error::ConnectionError;
use crate::events::{EventSink, PeerEvent};
use crate::logging::*;
use crate::protocol::{Connection, Limits};
use crate::provider::Services;

/// Bind `config.listen_addr` and serve until the process is stopped
pub async fn serve(config: &Config) -> Result<(), ConnectionError> {
	let listener = TcpListener::bind(&config.listen_addr).await.map_err(|e| {
		ConnectionError::BindFailed { addr: config.listen_addr.clone(), source: e }
	})?;
	info!(
		"listening on {} (root {}, execute {})",
		listener.local_addr()?,
		config.root_dir.display(),
		if config.allow_execute { "allowed" } else { "disabled" }
	);
	let services = Services::responder(config.root_dir.clone(), config.allow_execute);
	serve_listener(listener, services, config.limits).await
}

/// Accept loop over an already bound listener
pub async fn serve_listener(
	listener: TcpListener,
	services: Services,
	limits: Limits,
) -> Result<(), ConnectionError> {
	loop {
		let (stream, peer) = match listener.accept().await {
			Ok(accepted) => accepted,
			Err(e) => {
				warn!("accept failed: {}", e);
				continue;
			}
		};
		let (events, mut rx) = EventSink::channel();
		let connection = Connection::new(stream, peer.to_string(), services.clone(), events, limits);
		let id = connection.id();
		info!("accepted {} as connection {}", peer, id);

		tokio::spawn(async move {
			while let Some(event) = rx.recv().await {
				log_event(&event);
			}
		});
		tokio::spawn(async move {
			match connection.run().await {
				Ok(()) => info!("connection {} closed", id),
				Err(e) => warn!("connection {} ended: {}", id, e),
			}
		});
	}
}

fn log_event(event: &PeerEvent) {
	match event {
		PeerEvent::Keystroke { key_code } => info!("peer key {}", key_code),
		PeerEvent::SystemInfo(info) => {
			info!("peer is {} on {} ({})", info.name, info.os, info.version)
		}
		other => debug!("peer event {:?}", other),
	}
}

// vim: ts=4
