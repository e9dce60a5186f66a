/*
 * oj-api - live judging record feed for an online judge.
 * Copyright (C) 2024  The oj-api developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see https://www.gnu.org/licenses.
 */

#[macro_use]
extern crate derive_more;

use {
	color_eyre::eyre::{self, WrapErr},
	oj_api::{
		ServeConfig,
		database::Database,
		store::{MemoryStore, MySqlStore},
	},
	std::env,
	tokio::net::TcpListener,
};

mod cli;
mod config;
mod panic_hook;
mod runtime;
mod signal;
mod telemetry;

fn main() -> eyre::Result<()>
{
	color_eyre::install()?;

	if let Err(err) = dotenvy::dotenv()
		&& !err.not_found()
	{
		return Err(err).wrap_err("failed to load `.env` file");
	}

	let cli::Args::Serve { config_path, ip_addr, port, in_memory } = cli::args();
	let mut config = config::Config::load_from_file(&config_path)?;

	if let Some(ip_addr) = ip_addr {
		config.http.ip_addr = ip_addr;
	}

	if let Some(port) = port {
		config.http.port = port;
	}

	if let Ok(url) = env::var("DATABASE_URL") {
		config.database.url = url.parse().wrap_err("`DATABASE_URL` is not a valid URL")?;
	}

	let _guard = telemetry::init(&config.tracing).wrap_err("failed to initialize tracing")?;

	panic_hook::install();

	runtime::build(&config.runtime)
		.wrap_err("failed to build tokio runtime")?
		.block_on(run(config, in_memory))
}

#[tracing::instrument(skip(config), err)]
async fn run(config: config::Config, in_memory: bool) -> eyre::Result<()>
{
	let listener = TcpListener::bind(config.http.socket_addr())
		.await
		.wrap_err_with(|| format!("failed to bind to {}", config.http.socket_addr()))?;

	let serve_config = ServeConfig {
		events: config.events,
		sessions: config.sessions,
		include_http_headers: config.tracing.include_http_headers,
		shutdown_timeout: config.http.shutdown_timeout,
	};

	if in_memory {
		tracing::warn!("running with an in-memory store; nothing will be persisted");
		oj_api::serve(MemoryStore::default(), listener, serve_config, signal::shutdown()).await?;
		return Ok(());
	}

	let database = Database::connect(config.database.connect_options())
		.await
		.wrap_err("failed to connect to database")?;

	database.migrate().await.wrap_err("failed to run migrations")?;

	oj_api::serve(MySqlStore::new(database), listener, serve_config, signal::shutdown()).await?;

	Ok(())
}
