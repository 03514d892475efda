// File: services/calshare_backend/src/main.rs
use calshare_common::{logging, CalshareError, Context};
use calshare_config::load_config;
use calshare_supabase::AppContext;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Calshare backend stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), CalshareError> {
    // Missing SUPABASE_URL / SUPABASE_ANON_KEY stop the process here.
    let config = Arc::new(load_config().context("Failed to load config")?);
    let ctx = AppContext::from_global(config.clone())?;

    let app = calshare_backend::app(ctx);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Starting server at http://{}", addr);
    info!(
        "API endpoints available at http://{}{}",
        addr,
        calshare_backend::API_PREFIX
    );

    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")
}
