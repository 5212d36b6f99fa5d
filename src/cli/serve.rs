use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::net::TcpListener;
use tracing::info;

use super::context::CliContext;
use crate::server::{build_router, ServeHealth, ServeState};

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Bind host (defaults to server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port (defaults to server.port)
    #[arg(long)]
    pub port: Option<u16>,
}

pub async fn cmd_serve(args: ServeArgs, ctx: &CliContext) -> Result<()> {
    let mut server = ctx.config().server.clone();
    if let Some(host) = args.host {
        server.host = host;
    }
    if let Some(port) = args.port {
        server.port = port;
    }
    let addr: SocketAddr = server.addr()?;

    let service = ctx.service().await?;
    let router = build_router(ServeState::with_health(service, Arc::new(ServeHealth::new())));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind API server on {}", addr))?;
    info!(
        %addr,
        config = %ctx.config_path().display(),
        "disposition API listening, waiting for requests..."
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await
        .context("API server exited unexpectedly")?;
    Ok(())
}
