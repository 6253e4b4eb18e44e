use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use syspulse::{
    actors::{PublisherHandle, SubscriberHandle},
    collector::SnapshotCollector,
    config::{Config, read_config_file},
    journal::EventJournal,
    transport::{Broker, LoopbackTransport, MqttTransport, Transport},
    util::{get_broker_host_override, get_broker_port_override},
};
use sysinfo::System;
use tracing::{debug, error, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

/// Grace given to in-flight transport work during shutdown.
const DISCONNECT_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: Option<String>,

    /// Run both loops against an in-process broker instead of MQTT
    #[arg(long)]
    loopback: bool,
}

fn init_logging(path: &Path) -> anyhow::Result<()> {
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("fatal: cannot open system log at {}", path.display()))?;

    let filter = filter::Targets::new().with_target("syspulse", LevelFilter::TRACE);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(log_file))
                .with_ansi(false),
        )
        .with(filter)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let config = match &args.file {
        Some(path) => read_config_file(path)?,
        None => Config::default(),
    };

    init_logging(&config.system_log())?;
    trace!("started with args: {args:?}");
    debug!("loaded config: {config:?}");

    let hostname = System::host_name().unwrap_or_else(|| String::from("unknown"));

    let (publisher_transport, subscriber_transport) = connect(&args, &config, &hostname).await?;

    let messages = match subscriber_transport.subscribe(&config.topic).await {
        Ok(messages) => messages,
        Err(e) => {
            error!("fatal: cannot subscribe to {}: {e}", config.topic);
            return Err(e.into());
        }
    };

    let journal = match EventJournal::open(&config.event_log()).await {
        Ok(journal) => journal,
        Err(e) => {
            error!(
                "fatal: cannot open event log at {}: {e}",
                config.event_log().display()
            );
            return Err(e.into());
        }
    };

    let (subscriber, subscriber_task) = SubscriberHandle::spawn(messages, journal, true);

    let collector = SnapshotCollector::new(&config);
    let (publisher, publisher_task) = PublisherHandle::spawn(
        collector,
        Arc::clone(&publisher_transport),
        config.topic.clone(),
        config.interval(),
    );

    debug!(
        "pipeline running: publishing to {} every {:?}",
        config.topic,
        config.interval()
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    debug!("shutdown signal received");

    let _ = publisher.shutdown().await;
    let _ = subscriber.shutdown().await;
    let _ = publisher_task.await;
    let _ = subscriber_task.await;

    if let Err(e) = publisher_transport.disconnect(DISCONNECT_GRACE).await {
        error!("publisher disconnect failed: {e}");
    }
    if let Err(e) = subscriber_transport.disconnect(DISCONNECT_GRACE).await {
        error!("subscriber disconnect failed: {e}");
    }

    debug!("clean shutdown complete");
    Ok(())
}

/// Establish both transport connections. A failure here is the one
/// unrecoverable condition in the pipeline: no telemetry cycle is ever
/// attempted without a transport.
async fn connect(
    args: &Args,
    config: &Config,
    hostname: &str,
) -> anyhow::Result<(Arc<dyn Transport>, Arc<dyn Transport>)> {
    if args.loopback {
        let broker = Broker::new();
        let publisher = LoopbackTransport::connect(&format!("{hostname}-pub"), &broker);
        let subscriber = LoopbackTransport::connect(&format!("{hostname}-sub"), &broker);
        return Ok((Arc::new(publisher), Arc::new(subscriber)));
    }

    let host = get_broker_host_override().unwrap_or_else(|| config.broker_host.clone());
    let port = get_broker_port_override().unwrap_or(config.broker_port);

    let publisher = match MqttTransport::connect(&format!("{hostname}-pub"), &host, port).await {
        Ok(transport) => transport,
        Err(e) => {
            error!("fatal: publisher transport connection failed: {e}");
            return Err(e.into());
        }
    };
    let subscriber = match MqttTransport::connect(&format!("{hostname}-sub"), &host, port).await {
        Ok(transport) => transport,
        Err(e) => {
            error!("fatal: subscriber transport connection failed: {e}");
            return Err(e.into());
        }
    };

    Ok((Arc::new(publisher), Arc::new(subscriber)))
}
