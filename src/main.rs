//! idle-notifyd - Desktop notifications for idle agent sessions.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use idle_notifyd::config::Config;
use idle_notifyd::desktop::CommandDispatcher;
use idle_notifyd::desktop::DispatchOutcome;
use idle_notifyd::desktop::Dispatcher;
use idle_notifyd::notifier::HandleOutcome;
use idle_notifyd::notifier::IdleNotifier;
use idle_notifyd::notifier::NotifierSettings;
use idle_notifyd::source::EventSource;
use idle_notifyd::source::SocketSource;
use idle_notifyd::source::SourceError;
use idle_notifyd::source::StreamSource;
use tokio::signal::unix::SignalKind;
use tokio::signal::unix::signal;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// How long to wait for pending notifications on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Idle session notification daemon.
///
/// Reads host lifecycle events and shows a desktop notification when the
/// session goes idle.
#[derive(Parser, Debug)]
#[command(name = "idle-notifyd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read events from this Unix socket instead of stdin.
    #[arg(short, long)]
    socket: Option<PathBuf>,

    /// Enable dry-run mode (log commands instead of running them).
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print received events to stdout.
    #[arg(long)]
    print_events: bool,

    /// Show one notification immediately and exit.
    #[arg(long)]
    test_notification: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level)?;

    info!("idle-notifyd v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config =
        Config::load_or_default(args.config.as_deref()).context("Failed to load configuration")?;

    if args.dry_run {
        config.dry_run = true;
    }
    if args.socket.is_some() {
        config.event_socket = args.socket;
    }

    info!(
        "Configuration loaded (cooldown={}ms, delay={}ms, dry_run={})",
        config.cooldown_ms, config.dispatch_delay_ms, config.dry_run
    );

    let dispatcher = CommandDispatcher::from_config(&config);
    if !config.dry_run {
        dispatcher.check_commands();
    }
    let dispatcher: Arc<dyn Dispatcher> = Arc::new(dispatcher);

    let mut notifier =
        IdleNotifier::new(NotifierSettings::from_config(&config), Arc::clone(&dispatcher));

    if args.test_notification {
        let notice = notifier.compose();
        info!("Sending test notification: {:?}", notice.body);
        return report(&dispatcher.dispatch(&notice).await);
    }

    match config.event_socket {
        Some(ref path) => {
            let source = SocketSource::connect(path)
                .await
                .with_context(|| format!("Failed to connect to {}", path.display()))?;
            run_daemon(source, notifier, args.print_events).await
        }
        None => run_daemon(StreamSource::stdin(), notifier, args.print_events).await,
    }
}

/// Initialize logging with the specified level.
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(format!("idle_notifyd={level}"))
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Report the outcome of a test notification.
fn report(outcome: &DispatchOutcome) -> Result<()> {
    outcome.log_failures();
    if outcome.is_success() {
        info!("Test notification sent");
        Ok(())
    } else {
        anyhow::bail!("Test notification failed")
    }
}

/// Run daemon event loop until the source closes or a signal arrives.
async fn run_daemon<S: EventSource>(
    mut source: S,
    mut notifier: IdleNotifier,
    print_events: bool,
) -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to listen for SIGTERM")?;
    let mut pending: Vec<JoinHandle<DispatchOutcome>> = Vec::new();

    info!("Daemon started, waiting for host events...");

    let result: Result<()> = loop {
        tokio::select! {
            event = source.next_event() => {
                match event {
                    Ok(event) => {
                        if print_events {
                            println!("[EVENT] | type={} properties={}", event.kind, event.properties);
                        }
                        pending.retain(|h| !h.is_finished());
                        if let HandleOutcome::Scheduled(handle) = notifier.handle(&event) {
                            pending.push(handle);
                        }
                    }
                    Err(SourceError::Closed) => {
                        info!("Event stream closed");
                        break Ok(());
                    }
                    Err(e) => {
                        error!("Event source error: {}", e);
                        break Err(e).context("Event source failed");
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break Ok(());
            }

            _ = sigterm.recv() => {
                info!("Terminated, shutting down");
                break Ok(());
            }
        }
    };

    drain(pending).await;
    result
}

/// Give scheduled notifications a moment to finish.
async fn drain(mut pending: Vec<JoinHandle<DispatchOutcome>>) {
    pending.retain(|h| !h.is_finished());
    if pending.is_empty() {
        return;
    }

    debug!("Waiting for {} pending notification(s)", pending.len());
    let finished = tokio::time::timeout(SHUTDOWN_GRACE, async {
        for handle in pending {
            if let Err(e) = handle.await {
                warn!("Dispatch task failed: {}", e);
            }
        }
    })
    .await;

    if finished.is_err() {
        warn!("Pending notifications did not finish in {:?}", SHUTDOWN_GRACE);
    }
}
