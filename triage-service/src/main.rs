use tokio::net::TcpListener;
use tracing::{Level, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use triage_core::TriageConfig;
use triage_service::create_app;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match TriageConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let app = match create_app(&config).await {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to start triage service: {:#}", e);
            std::process::exit(1);
        }
    };

    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    let addr = listener.local_addr()?;

    info!("Triage service starting on {}", addr);
    info!("Health check endpoint: http://{}/health", addr);
    info!("Prediction endpoint: POST http://{}/api/predictions/create/", addr);
    info!("Report endpoint: POST http://{}/api/reports/analyze/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
