use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use meeting_continuity::config::{CaptureBackend, StoreBackend};
use meeting_continuity::session::{elapsed_seconds, format_elapsed};
use meeting_continuity::{
    create_router, AppState, CaptureFactory, Clock, Config, HttpMeetingApi, InFlightRegistry,
    KeyValueStore, LogCaptureFactory, MemoryOrigin, NatsCaptureFactory, NatsClient, NatsKvStore,
    NoticeBoard, PersistedSessionStore, SystemClock, ViewDeps,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "meeting-continuity", version, about = "Recording session continuity service")]
struct Cli {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/meeting-continuity")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP control API (default)
    Serve,
    /// Print the persisted session of a meeting
    Inspect { meeting_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Meeting Continuity v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let store = open_store(&cfg).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cfg, store).await,
        Command::Inspect { meeting_id } => inspect(store, &meeting_id).await,
    }
}

async fn open_store(cfg: &Config) -> Result<Arc<dyn KeyValueStore>> {
    match cfg.store.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory session store; sessions will not survive a restart");
            Ok(Arc::new(MemoryOrigin::new().tab()))
        }
        StoreBackend::Nats => Ok(Arc::new(
            NatsKvStore::connect(&cfg.store.nats_url, &cfg.store.bucket).await?,
        )),
    }
}

async fn serve(cfg: Config, store: Arc<dyn KeyValueStore>) -> Result<()> {
    let capture: Arc<dyn CaptureFactory> = match cfg.capture.backend {
        CaptureBackend::Log => Arc::new(LogCaptureFactory),
        CaptureBackend::Nats => {
            let client = NatsClient::connect(
                &cfg.capture.nats_url,
                &cfg.capture.subject_prefix,
                Duration::from_secs(cfg.capture.timeout_secs),
            )
            .await?;
            Arc::new(NatsCaptureFactory::new(client, store.tab_id()))
        }
    };

    let api = Arc::new(HttpMeetingApi::new(&cfg.minutes)?);
    let notices = NoticeBoard::new();

    let deps = ViewDeps {
        store,
        capture,
        generator: api.clone(),
        status: api,
        notifier: Arc::new(notices.clone()),
        clock: Arc::new(SystemClock),
        in_flight: InFlightRegistry::new(),
    };

    let app = create_router(AppState::new(deps, notices, cfg.tick_interval()));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}

async fn inspect(store: Arc<dyn KeyValueStore>, meeting_id: &str) -> Result<()> {
    let store = PersistedSessionStore::new(store);

    match store.read(meeting_id).await {
        Some(record) => {
            let elapsed = elapsed_seconds(&record.to_session(), SystemClock.now_ms());
            println!("{}", serde_json::to_string_pretty(&record)?);
            println!("elapsed: {} ({}s)", format_elapsed(elapsed), elapsed);
        }
        None => println!("No persisted session for meeting {}", meeting_id),
    }

    Ok(())
}
