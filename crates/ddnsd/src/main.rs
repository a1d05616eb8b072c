// # ddnsd - Gandi DDNS Daemon
//
// This daemon is a THIN integration layer. All observation, reconciliation
// and write logic lives in ddns-core; nothing here decides what to write.
//
// The ddnsd daemon is responsible for:
// 1. Loading the JSON configuration and applying environment overrides
// 2. Initializing logging and the runtime
// 3. Wiring the HTTP IP source and the Gandi provider into the engine
// 4. Running the engine until SIGTERM/SIGINT
//
// ## Configuration
//
// The configuration file is JSON (see `ddns_core::config::DdnsConfig`).
// These environment variables take precedence over it:
//
// - `DDNS_CONFIG`: Path to the configuration file (default: `config.json`)
// - `DDNS_API_KEY`: Gandi API key, replaces `domain.api_key`
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn or error (default: info)
// - `DDNS_MODE`: `dry-run` logs writes instead of sending them
//
// ## Example
//
// ```bash
// export DDNS_CONFIG=/etc/ddns/config.json
// export DDNS_API_KEY=your_key
// export DDNS_MODE=dry-run
//
// ddnsd
// ```

use anyhow::{Context, Result};
use ddns_core::{DdnsConfig, DdnsEngine, EngineEvent};
use ddns_ip_http::HttpIpSource;
use ddns_provider_gandi::GandiProvider;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::{mpsc, oneshot};
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Settings taken from the environment
#[derive(Debug, Default)]
struct EnvOverrides {
    config_path: Option<PathBuf>,
    api_key: Option<String>,
    log_level: Option<String>,
    mode: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            config_path: env::var_os("DDNS_CONFIG").map(PathBuf::from),
            api_key: env::var("DDNS_API_KEY").ok().filter(|k| !k.is_empty()),
            log_level: env::var("DDNS_LOG_LEVEL").ok(),
            mode: env::var("DDNS_MODE").ok(),
        }
    }

    fn config_path(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    fn log_level(&self) -> Result<Level> {
        let level = self.log_level.as_deref().unwrap_or("info");
        match level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                level
            ),
        }
    }

    /// Overlay the environment onto a loaded configuration
    fn apply(&self, config: &mut DdnsConfig) -> Result<()> {
        if let Some(ref key) = self.api_key {
            config.domain.api_key = key.clone();
        }

        match self.mode.as_deref() {
            None | Some("") | Some("live") => {}
            Some("dry-run") => config.provider.dry_run = true,
            Some(other) => anyhow::bail!(
                "DDNS_MODE '{}' is not supported. Supported modes: dry-run, live",
                other
            ),
        }

        Ok(())
    }
}

/// Load, override and validate the configuration
fn load_config(overrides: &EnvOverrides) -> Result<DdnsConfig> {
    let path = overrides.config_path();
    let mut config = DdnsConfig::from_file(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    overrides.apply(&mut config)?;
    config.validate().context("Configuration validation error")?;
    Ok(config)
}

fn main() -> ExitCode {
    let overrides = EnvOverrides::from_env();

    let log_level = match overrides.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let config = match load_config(&overrides) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd daemon");
    info!(
        "Managing {} ({}) every {:?}",
        config.domain.fqdn(),
        config
            .record_types()
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        config.update_interval()
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: DdnsConfig) -> Result<()> {
    let ip_source = HttpIpSource::from_config(&config.ip).context("Failed to create IP source")?;
    let provider = GandiProvider::from_config(&config).context("Failed to create provider")?;
    info!("Provider: {:?}", provider);

    let (engine, events) = DdnsEngine::new(Box::new(ip_source), Box::new(provider), config)
        .context("Failed to create engine")?;

    tokio::spawn(log_events(events));

    // Handlers are installed before the engine starts; a failure here is a
    // startup error, not a shutdown request.
    let mut signals = ShutdownSignals::install()?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        let signal = signals.recv().await;
        info!("Received shutdown signal: {}", signal);
        let _ = shutdown_tx.send(());
    });

    info!("Starting DDNS engine");
    engine.run_with_shutdown(Some(shutdown_rx)).await?;

    info!("Shutting down daemon");
    Ok(())
}

/// Trace engine events; the engine already logs its own progress
async fn log_events(mut events: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        debug!("Engine event: {:?}", event);
    }
}

/// Shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
struct ShutdownSignals {
    sigterm: tokio::signal::unix::Signal,
    sigint: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        Ok(Self {
            sigterm: signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?,
            sigint: signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?,
        })
    }

    /// Wait for the next signal and return its name
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}

/// Shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> &'static str {
        if let Err(e) = tokio::signal::ctrl_c().await {
            // Without a handler the daemon keeps running until killed
            error!("Failed to wait for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
        "SIGINT"
    }
}
