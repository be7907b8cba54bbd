//! swarmdesk binary entry point.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use swarmdesk::channel::{Channel, ConsoleChannel};
use swarmdesk::cli::{Cli, Command};
use swarmdesk::config::AppConfig;
use swarmdesk::db::Database;
use swarmdesk::scheduler::ReminderSweep;
use swarmdesk::server;
use swarmdesk::service::RequestService;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "swarmdesk=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database.path = database;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let db = Arc::new(Database::open(&config.database.path)?);
    info!(path = %config.database.path.display(), "database ready");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let channel: Arc<dyn Channel> = Arc::new(ConsoleChannel::new());
            let service = Arc::new(
                RequestService::new(Arc::clone(&db), Arc::clone(&channel)).with_retry_backoff(
                    Duration::from_millis(config.delivery.retry_backoff_ms),
                ),
            );

            if config.reminders.enabled {
                let sweep =
                    ReminderSweep::new(Arc::clone(&db), channel, config.reminders.clone());
                tokio::spawn(sweep.run());
            }

            server::serve(service, config.server.port).await?;
        }
        Command::Stats => {
            let stats = db.get_stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Sweep => {
            let channel: Arc<dyn Channel> = Arc::new(ConsoleChannel::new());
            let sweep = ReminderSweep::new(db, channel, config.reminders.clone());
            let posted = sweep.sweep_once().await?;
            println!("posted {posted} reminder(s)");
        }
    }

    Ok(())
}
