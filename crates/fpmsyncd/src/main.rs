//! FPM Synchronization Daemon
//!
//! Main entry point for the fpmsyncd daemon.
//! Accepts the routing stack's FPM session and synchronizes SRv6 Local SIDs
//! to SONiC databases.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - AU-3: Content of Audit Records - Structured logging
//! - AU-12: Audit Record Generation - Log daemon lifecycle
//! - CM-6: Configuration Settings - File and command line configuration
//! - SI-4: System Monitoring - Real-time event processing

use anyhow::Context;
use clap::Parser;
use sonic_fpmsyncd::config::DEFAULT_CONFIG_PATH;
use sonic_fpmsyncd::{
    FpmServer, FpmsyncConfig, FpmsyncError, LocalSidTable, MemoryTable, RedisAdapter, RouteSync,
    start_metrics_server,
};
use std::net::IpAddr;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// SONiC FPM synchronization daemon (SRv6 Local SIDs)
#[derive(Parser, Debug)]
#[command(name = "fpmsyncd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// FPM listen address
    #[arg(long)]
    listen: Option<IpAddr>,

    /// FPM listen port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    /// Redis server host
    #[arg(long)]
    redis_host: Option<String>,

    /// Redis server port
    #[arg(long)]
    redis_port: Option<u16>,

    /// Prometheus metrics port
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Disable the Prometheus metrics endpoint
    #[arg(long)]
    no_metrics: bool,

    /// Keep Local SIDs in memory instead of writing APPL_DB
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    /// Command line values win over the file
    fn apply(&self, config: &mut FpmsyncConfig) {
        if let Some(listen) = self.listen {
            config.fpm.listen_address = listen;
        }
        if let Some(port) = self.port {
            config.fpm.port = port;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(host) = &self.redis_host {
            config.database.redis_host = host.clone();
        }
        if let Some(port) = self.redis_port {
            config.database.redis_port = port;
        }
        if let Some(port) = self.metrics_port {
            config.metrics.port = port;
        }
        if self.no_metrics {
            config.metrics.enabled = false;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = FpmsyncConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    args.apply(&mut config);
    config.validate()?;

    // Initialize logging
    // NIST: AU-3, AU-12 - Audit logging setup
    init_logging(&config.logging.level)?;

    info!(
        listen = %config.listen_addr(),
        redis_host = %config.database.redis_host,
        redis_port = config.database.redis_port,
        appl_db = config.database.appl_db_number,
        dry_run = args.dry_run,
        "fpmsyncd: Starting FPM synchronization daemon"
    );

    let result = if args.dry_run {
        run_daemon(&config, MemoryTable::new()).await
    } else {
        let redis = RedisAdapter::with_db(
            &config.database.redis_host,
            config.database.redis_port,
            config.database.appl_db_number,
        )
        .await?;
        run_daemon(&config, redis).await
    };

    match result {
        Ok(()) => {
            info!("fpmsyncd: Daemon exiting normally");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "fpmsyncd: Daemon exiting with error");
            Err(e.into())
        }
    }
}

/// Initialize structured logging
///
/// `RUST_LOG` overrides the configured level.
///
/// # NIST Controls
/// - AU-3: Content of Audit Records - Structured format
fn init_logging(level: &str) -> sonic_fpmsyncd::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .try_init()
        .map_err(|e| FpmsyncError::Config(format!("Failed to set logger: {}", e)))
}

/// Serve FPM sessions until a shutdown signal arrives
///
/// # NIST Controls
/// - SI-4: System Monitoring - Event loop for monitoring
async fn run_daemon<T: LocalSidTable>(config: &FpmsyncConfig, table: T) -> sonic_fpmsyncd::Result<()> {
    let server = FpmServer::bind(config.listen_addr()).await?;
    let mut sync = RouteSync::new(table)?;

    let metrics_task = config.metrics.enabled.then(|| {
        let addr = config.metrics_addr();
        let metrics = sync.metrics().clone();
        tokio::spawn(async move {
            if let Err(e) = start_metrics_server(addr, metrics).await {
                error!(error = %e, "fpmsyncd: Metrics server failed");
            }
        })
    });

    tokio::select! {
        result = server.serve(&mut sync) => result?,
        _ = shutdown_signal() => info!("fpmsyncd: Received shutdown signal"),
    }

    if let Some(task) = metrics_task {
        task.abort();
    }

    let metrics = sync.metrics();
    info!(
        received = metrics.messages_received_total.get(),
        set = metrics.local_sids_set_total.get(),
        deleted = metrics.local_sids_deleted_total.get(),
        forwarded = metrics.messages_forwarded_total.get(),
        "fpmsyncd: Graceful shutdown complete"
    );
    Ok(())
}

/// Resolves on SIGINT or SIGTERM
///
/// # NIST Controls
/// - AU-12: Audit Record Generation - Log shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "fpmsyncd: Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "fpmsyncd: Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_file() {
        let args = Args::parse_from([
            "fpmsyncd",
            "--listen",
            "0.0.0.0",
            "--port",
            "2700",
            "--log-level",
            "debug",
        ]);
        let mut config = FpmsyncConfig::default();
        args.apply(&mut config);

        assert_eq!(config.listen_addr(), "0.0.0.0:2700".parse().unwrap());
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.database.redis_port, 6379);
    }

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["fpmsyncd"]);
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(!args.dry_run);
        assert!(!args.no_metrics);
    }

    #[test]
    fn test_metrics_flags() {
        let args = Args::parse_from(["fpmsyncd", "--metrics-port", "9300", "--no-metrics"]);
        let mut config = FpmsyncConfig::default();
        args.apply(&mut config);

        assert_eq!(config.metrics.port, 9300);
        assert!(!config.metrics.enabled);
    }
}
