use screenplay_service::{ServiceSettings, create_app};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing; `LOG_FORMAT=pretty` for development, JSON otherwise
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "screenplay_service=debug,screenplay_core=debug,tower_http=debug".into()
    });

    match log_format.as_str() {
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let settings = ServiceSettings::from_env();
    let app = create_app(&settings).await?;

    let listener = TcpListener::bind(format!("0.0.0.0:{}", settings.port)).await?;
    let addr = listener.local_addr()?;

    info!("Screenplay service starting on {}", addr);
    info!("  POST http://{}/api/screenplay/generate", addr);
    info!("  GET  http://{}/api/screenplay/format", addr);
    if settings.debug {
        info!("Debug error responses enabled by default");
    }

    axum::serve(listener, app).await?;

    Ok(())
}
