use anyhow::Context as _;
use clap::Parser as _;
use log::info;

use self::{config::ServerArgs, routes::AppState, store::DocumentStore};

mod auth;
mod config;
mod error;
mod model;
mod ranking;
mod routes;
mod store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = ServerArgs::parse();
    let store = DocumentStore::open(&args.data_dir)
        .await
        .with_context(|| format!("failed to open data dir {}", args.data_dir.display()))?;
    let base_path = args.base_path();
    let app = routes::router(AppState::new(store, args.token_ttl()), &base_path);

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("failed to bind {}", args.addr))?;
    info!("listening on http://{}{base_path}", listener.local_addr()?);
    axum::serve(listener, app).await.context("server stopped")?;
    Ok(())
}
