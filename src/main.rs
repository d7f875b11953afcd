use std::sync::Arc;

use anyhow::Context;

use sign_stream::classifier::{ClassList, ClassifierFactory};
use sign_stream::config::{ClassifierBackend, StreamConfig};
use sign_stream::logging;
use sign_stream::perception::no_hand_factory;
use sign_stream::stream::gesture_routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = StreamConfig::from_env().context("invalid SIGN_STREAM_* configuration")?;
    let log_guard = logging::init_tracing(&config)?;

    eprintln!("🤟 Sign Stream v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.backend);
    eprintln!("   Gesture WS: ws://0.0.0.0:{}/ws/gesture", config.port);
    eprintln!("   Health: http://0.0.0.0:{}/health", config.port);
    if let Some(dir) = log_guard.log_dir() {
        eprintln!("   Logs: {}", dir.display());
    }
    match (config.backend, &config.clip.class_list) {
        (ClassifierBackend::Clip, Some(path)) => {
            let classes = ClassList::load(path)
                .with_context(|| format!("failed to load class list {}", path.display()))?;
            eprintln!("   Classes: {} from {}", classes.len(), path.display());
        }
        (ClassifierBackend::Clip, None) => {}
        (ClassifierBackend::Rule, _) => {
            eprintln!("   Hand landmarks: no native engine linked, frames will report no hands");
        }
    }
    eprintln!();

    let config = Arc::new(config);
    let factory = ClassifierFactory::new(Arc::clone(&config), no_hand_factory());
    factory
        .validate()
        .with_context(|| format!("cannot run the {} backend", config.backend))?;

    let app = gesture_routes(Arc::clone(&config), factory);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, backend = %config.backend, "gesture server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
        .context("server error")?;

    Ok(())
}
