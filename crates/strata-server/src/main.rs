// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Strata resource lifecycle server binary.

use std::path::PathBuf;

use clap::Parser;
use strata_server::{create_app_state, create_router};
use tracing_subscriber::EnvFilter;

/// Strata server - GitOps resource lifecycle job engine.
#[derive(Parser, Debug)]
#[command(name = "strata-server", about = "Strata resource lifecycle server", version)]
struct Args {
	/// Path to the TOML configuration file.
	#[arg(long, env = "STRATA_SERVER_CONFIG")]
	config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	let config = match &args.config {
		Some(path) => strata_server_config::load_config_with_file(path)?,
		None => strata_server_config::load_config()?,
	};

	let filter = EnvFilter::try_new(&config.logging.level)
		.unwrap_or_else(|_| EnvFilter::new("info"));
	if config.logging.json {
		tracing_subscriber::fmt().with_env_filter(filter).json().init();
	} else {
		tracing_subscriber::fmt().with_env_filter(filter).init();
	}

	let state = create_app_state(&config).await?;
	let engine = state.engine.clone();
	let router = create_router(state);

	let addr = config.socket_addr();
	let listener = tokio::net::TcpListener::bind(&addr).await?;
	tracing::info!(addr = %addr, "strata-server listening");

	axum::serve(listener, router)
		.with_graceful_shutdown(async {
			let _ = tokio::signal::ctrl_c().await;
			tracing::info!("shutdown signal received");
		})
		.await?;

	engine.shutdown().await;
	Ok(())
}
