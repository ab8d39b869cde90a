//! Meeting Assistant
//!
//! HTTP entry point that launches the meeting assistant bot for calls.

use assistant_service::agent::{BotIdentity, LoggingAgent};
use assistant_service::config::Config;
use assistant_service::observability::metrics::init_metrics_recorder;
use assistant_service::registry::CallRegistry;
use assistant_service::routes::{self, AppState};
use assistant_service::runner::AssistantRunner;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!(target: "assistant.main", "Starting Meeting Assistant");

    let config = Config::from_env().inspect_err(|e| {
        error!(target: "assistant.main", error = %e, "Failed to load configuration");
    })?;

    info!(
        target: "assistant.main",
        bind_address = %config.bind_address,
        bot_user_id = %config.bot_user_id,
        trigger_phrase = %config.trigger_phrase,
        drain_seconds = config.drain_seconds,
        "Configuration loaded successfully"
    );

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!(target: "assistant.main", error = %e, "Failed to initialize metrics recorder");
        anyhow::anyhow!(e)
    })?;

    let runner = AssistantRunner {
        agent: Arc::new(LoggingAgent::new()),
        registry: Arc::new(CallRegistry::new()),
        bot: BotIdentity {
            user_id: config.bot_user_id.clone(),
            name: config.bot_name.clone(),
        },
        trigger_phrase: config.trigger_phrase.clone(),
    };

    let app = routes::build_routes(Arc::new(AppState { runner }), metrics_handle);

    let addr: SocketAddr = config.bind_address.parse().inspect_err(|e| {
        error!(target: "assistant.main", error = %e, "Invalid bind address");
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(target: "assistant.main", %addr, "Meeting Assistant listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.drain_seconds))
        .await?;

    info!(target: "assistant.main", "Meeting Assistant shutdown complete");
    Ok(())
}

/// `RUST_LOG` filters; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "assistant_service=info,assistant=info,tower_http=info".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Returns when SIGINT or SIGTERM is received and the drain period is over.
async fn shutdown_signal(drain_seconds: u64) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!(target: "assistant.main", "Received SIGINT, starting graceful shutdown"),
            Err(e) => error!(target: "assistant.main", error = %e, "Failed to listen for SIGINT"),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!(target: "assistant.main", "Received SIGTERM, starting graceful shutdown");
            }
            Err(e) => {
                error!(target: "assistant.main", error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    if drain_seconds > 0 {
        warn!(target: "assistant.main", drain_seconds, "Draining connections");
        tokio::time::sleep(Duration::from_secs(drain_seconds)).await;
        info!(target: "assistant.main", "Drain period complete");
    }
}
