use clap::{Arg, ArgAction, ArgMatches, Command};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use remotectl::client::FileCommand;
use remotectl::config::Config;
use remotectl::error::ConnectionError;
use remotectl::events::PeerEvent;
use remotectl::logging::*;
use remotectl::protocol::{ActionStatus, RemotePath};
use remotectl::validation::Validator;
use remotectl::{connect, serve};

///////////////////////
// Output formatting //
///////////////////////

fn print_event(event: &PeerEvent, json: bool) {
	if json {
		match serde_json::to_string(event) {
			Ok(line) => println!("{}", line),
			Err(e) => warn!("cannot encode event: {}", e),
		}
		return;
	}
	match event {
		PeerEvent::SystemInfo(info) => {
			println!("name:    {}", info.name);
			println!("os:      {}", info.os);
			println!("version: {}", info.version);
		}
		PeerEvent::Keystroke { key_code } => println!("key {}", key_code),
		PeerEvent::DirectoryEntry { path } => println!("{}", path),
		PeerEvent::FileContents { path, data } => println!("{}: {} bytes", path, data.len()),
		PeerEvent::Stat(report) => match &report.result {
			Ok(info) => println!(
				"{}: {} size={} modified={}",
				report.path,
				if info.directory { "directory" } else { "file" },
				info.size,
				info.modified
			),
			Err(failure) => println!("{}: {}", report.path, failure),
		},
		PeerEvent::Ack(ack) => match &ack.status {
			ActionStatus::Ok => println!("{} {}: ok", ack.command, ack.path),
			ActionStatus::Failed(failure) => println!("{} {}: {}", ack.command, ack.path, failure),
		},
	}
}

/// Failure carried by the event that finished a command, if any
fn event_failure(event: &PeerEvent) -> Option<String> {
	match event {
		PeerEvent::Ack(ack) => ack.status.failure().map(|f| f.to_string()),
		PeerEvent::Stat(report) => report.result.as_ref().err().map(|f| f.to_string()),
		_ => None,
	}
}

async fn with_timeout<T, F>(secs: u64, fut: F) -> Result<T, ConnectionError>
where
	F: std::future::Future<Output = Result<T, ConnectionError>>,
{
	tokio::time::timeout(Duration::from_secs(secs), fut)
		.await
		.map_err(|_| ConnectionError::Timeout { secs })?
}

//////////////
// Commands //
//////////////

async fn run_serve(mut config: Config, matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
	if let Some(listen) = matches.get_one::<String>("listen") {
		config.listen_addr = listen.clone();
	}
	if let Some(root) = matches.get_one::<String>("root") {
		config.root_dir = PathBuf::from(root);
	}
	if matches.get_flag("allow-execute") {
		config.allow_execute = true;
	}
	config.validate()?;

	tokio::select! {
		result = serve::serve(&config) => result?,
		_ = tokio::signal::ctrl_c() => info!("interrupted, shutting down"),
	}
	Ok(())
}

async fn run_connect(mut config: Config, matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
	let addr = matches.get_one::<String>("addr").ok_or("connect: address argument required")?;
	let name = matches.get_one::<String>("command").ok_or("connect: command argument required")?;
	let json = matches.get_flag("json");
	if let Some(secs) = matches.get_one::<u64>("timeout") {
		config.request_timeout_secs = *secs;
	}
	config.validate()?;
	let secs = config.request_timeout_secs;

	let path = matches.get_one::<String>("path").map(|p| RemotePath::from_display(p));
	let local = matches.get_one::<String>("local").map(PathBuf::from);

	let (mut client, task) = connect::connect(addr, &config).await?;

	let mut failure = None;
	if name == "info" {
		let info = with_timeout(secs, client.system_info()).await?;
		print_event(&PeerEvent::SystemInfo(info), json);
	} else {
		let command =
			FileCommand::parse(name).ok_or_else(|| format!("unknown command: {}", name))?;
		let path = path.unwrap_or_else(RemotePath::root);
		let data = if command.takes_data() {
			let local = local.as_deref().ok_or_else(|| {
				format!("{}: local file argument required", command.name())
			})?;
			tokio::fs::read(local).await?
		} else {
			Vec::new()
		};

		let mut contents = None;
		with_timeout(
			secs,
			client.run_command(command, path, data, |event| {
				print_event(event, json);
				if let Some(message) = event_failure(event) {
					failure = Some(message);
				}
				if let PeerEvent::FileContents { data, .. } = event {
					contents = Some(data.clone());
				}
			}),
		)
		.await?;

		if let (Some(data), Some(local)) = (contents, local.as_deref()) {
			save_download(local, &data).await?;
		}
	}

	client.close();
	match task.await? {
		Ok(()) => {}
		Err(e) => warn!("connection ended with error: {}", e),
	}

	match failure {
		Some(message) => Err(message.into()),
		None => Ok(()),
	}
}

async fn save_download(local: &Path, data: &[u8]) -> Result<(), Box<dyn Error>> {
	tokio::fs::write(local, data).await?;
	info!("saved {} bytes to {}", data.len(), local.display());
	Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
	init_tracing();

	let matches = Command::new("remotectl")
		.version(env!("CARGO_PKG_VERSION"))
		.author("Szilard Hajba <szilu@symbion.hu>")
		.about("Remote administration over a typed packet protocol")
		.subcommand_required(true)
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("FILE")
				.global(true)
				.help("TOML configuration file"),
		)
		.subcommand(
			Command::new("serve")
				.about("Export a directory tree to connecting peers")
				.arg(Arg::new("listen").short('l').long("listen").value_name("ADDR"))
				.arg(Arg::new("root").short('r').long("root").value_name("DIR"))
				.arg(
					Arg::new("allow-execute")
						.long("allow-execute")
						.action(ArgAction::SetTrue)
						.help("Let peers launch processes"),
				),
		)
		.subcommand(
			Command::new("connect")
				.about("Run one command against a serving peer")
				.arg(Arg::new("addr").required(true).value_name("ADDR"))
				.arg(Arg::new("command").required(true).value_name("COMMAND").help(
					"info, list, download, upload, execute, delete, mkdir, drop or stat",
				))
				.arg(Arg::new("path").value_name("PATH"))
				.arg(Arg::new("local").value_name("LOCAL_FILE"))
				.arg(
					Arg::new("timeout")
						.short('t')
						.long("timeout")
						.value_name("SECS")
						.value_parser(clap::value_parser!(u64)),
				)
				.arg(
					Arg::new("json")
						.long("json")
						.action(ArgAction::SetTrue)
						.help("Print events as JSON lines"),
				),
		)
		.get_matches();

	let config_path = matches.get_one::<String>("config").map(PathBuf::from);
	let config = Config::load(config_path.as_deref())?;

	if let Some(sub_matches) = matches.subcommand_matches("serve") {
		run_serve(config, sub_matches).await?;
	} else if let Some(sub_matches) = matches.subcommand_matches("connect") {
		run_connect(config, sub_matches).await?;
	}

	Ok(())
}

// vim: ts=4
