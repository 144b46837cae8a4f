use anyhow::Context;
use clap::Parser;
use cvforge_engine::export::EXPORT_ROUTE;
use cvforge_server::{build_router, gotenberg::GotenbergClient, state::AppState};

#[derive(Parser)]
#[command(name = "cvforge-server")]
#[command(about = "PDF export service for cvforge documents")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 4000, env = "PORT")]
    port: u16,

    /// Base URL of the Gotenberg instance doing the conversion
    #[arg(long, default_value = "http://localhost:3000", env = "GOTENBERG_URL")]
    gotenberg_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    let gotenberg = GotenbergClient::new(args.gotenberg_url);
    log::info!("Converting through Gotenberg at {}", gotenberg.base_url());

    let app = build_router(AppState::new(gotenberg));

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    log::info!("Export service listening on {addr}");
    log::info!("  - POST {EXPORT_ROUTE}");
    log::info!("  - GET  /health");

    axum::serve(listener, app).await?;

    Ok(())
}
