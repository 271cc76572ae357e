//! smsroute - handle SMS commands from the command line.

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use smsroute::config::{self, Config};
use smsroute::models::NewFacility;
use smsroute::transport::{Transport, open_store};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "smsroute",
    version,
    about = "Parse SMS commands and dispatch them to their handlers."
)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print Prometheus metrics after the command finishes.
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse the provided text message and handle it.
    Handle {
        text: String,
        /// Sender number. Defaults to the login user name.
        #[arg(long)]
        sender: Option<String>,
    },
    /// Manage health facilities.
    #[command(subcommand)]
    Facility(FacilityCommand),
}

#[derive(Debug, Subcommand)]
enum FacilityCommand {
    /// Register a health facility.
    Add {
        hmis: i64,
        name: String,
        #[arg(long)]
        location: Option<String>,
    },
}

fn login_name() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "anonymous".to_string())
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load(path).map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to load config");
            e
        })?,
        None => Config::default(),
    };

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("configuration has {} error(s)", errors.len());
    }
    Ok(config)
}

async fn handle(config: &Config, text: &str, sender: &str) -> anyhow::Result<()> {
    let (transport, mut deliveries) = Transport::from_config(config).await?;
    let message = transport
        .incoming(sender, text)
        .await
        .context("message could not be handled")?;

    println!("1/1 {}", message.time.to_rfc3339());
    println!("--> {}", message.text);
    println!("----{}", "-".repeat(message.text.chars().count()));

    let total = message.replies.len();
    for (i, reply) in message.replies.iter().enumerate() {
        println!("    {}/{} {}", i + 1, total, reply.uri);
        println!("    <-- {}", reply.text);
    }

    while let Ok(delivery) = deliveries.try_recv() {
        println!(
            "    queued {} <-- {}",
            transport.uri(&delivery.recipient),
            delivery.text
        );
    }
    Ok(())
}

async fn add_facility(config: &Config, facility: NewFacility) -> anyhow::Result<()> {
    let store = open_store(&config.database).await?;
    let mut session = store.session().await?;
    let id = match session.add_facility(&facility).await {
        Ok(id) => id,
        Err(e) => {
            session.rollback().await?;
            return Err(e.into());
        }
    };
    session.commit().await?;
    info!(id, hmis = facility.hmis, "Facility added");
    println!("{} (HMIS {}) added as #{id:04}", facility.name, facility.hmis);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    if cli.metrics {
        smsroute::metrics::init();
    }

    match cli.command {
        Command::Handle { text, sender } => {
            let sender = sender.unwrap_or_else(login_name);
            handle(&config, &text, &sender).await?;
        }
        Command::Facility(FacilityCommand::Add {
            hmis,
            name,
            location,
        }) => {
            add_facility(
                &config,
                NewFacility {
                    hmis,
                    name,
                    location,
                },
            )
            .await?;
        }
    }

    if cli.metrics {
        print!("{}", smsroute::metrics::gather_metrics());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_handle() {
        let cli = Cli::try_parse_from(["smsroute", "--metrics", "handle", "+vht 1", "--sender", "42"])
            .unwrap();
        assert!(cli.metrics);
        assert!(matches!(
            cli.command,
            Command::Handle { ref text, sender: Some(ref s) } if text == "+vht 1" && s == "42"
        ));
    }

    #[test]
    fn test_parse_facility_add() {
        let cli = Cli::try_parse_from([
            "smsroute", "facility", "add", "1234", "Kasangati", "--location", "Wakiso",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Facility(FacilityCommand::Add { hmis: 1234, .. })
        ));
    }
}
