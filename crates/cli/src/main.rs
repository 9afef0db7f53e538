use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, warn};
use wsauth::Client;
use wsauth_cli::{cli::Cli, console, logging};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = run(cli).await {
		error!(target = "wsauth", error = %format!("{err:#}"), "session failed");
		std::process::exit(1);
	}
}

async fn run(cli: Cli) -> anyhow::Result<()> {
	let config = cli.into_config();

	let (events_tx, events_rx) = mpsc::unbounded_channel();
	let printer = tokio::spawn(console::print_events(events_rx));

	let client = Client::new(config).with_observer(events_tx);
	let outcome = client
		.run(interrupted())
		.await
		.with_context(|| format!("could not run session against {}", client.config().url))?;

	// The printer ends once the client's sender is gone.
	drop(client);
	printer.await.context("event printer panicked")?;

	println!("{}", console::summary(&outcome));
	Ok(())
}

async fn interrupted() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		warn!(target = "wsauth", error = %err, "cannot listen for ctrl-c; run until the server closes");
		std::future::pending::<()>().await;
	}
}
