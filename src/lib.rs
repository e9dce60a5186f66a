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

#[macro_use]
mod macros;

#[cfg(test)]
mod testing;

pub mod error;
pub mod time;
pub mod task_manager;
pub mod database;

pub mod users;
pub mod problems;
pub mod contests;
pub mod records;

pub mod store;
pub mod visibility;
pub mod events;
pub mod judge;
pub mod render;
pub mod sessions;

mod state;
pub mod http;

use std::{io, time::Duration};

use tokio::net::TcpListener;

pub use self::{
	state::AppState,
	task_manager::TaskManager,
};
use self::{
	events::{EventsConfig, RecordBus},
	render::{RenderError, Renderer},
	sessions::SessionsConfig,
	store::Backend,
};

/// Everything [`serve()`] needs to know besides the store and the listener.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServeConfig
{
	pub events: EventsConfig,
	pub sessions: SessionsConfig,

	/// Record request & response headers in the HTTP trace spans.
	pub include_http_headers: bool,

	/// How long to wait for open sessions to close after a shutdown signal.
	pub shutdown_timeout: Duration,
}

#[derive(Debug, Display, Error, From)]
pub enum ServeError
{
	#[display("failed to initialize templates: {_0}")]
	Render(RenderError),

	#[display("failed to run HTTP server: {_0}")]
	Io(io::Error),
}

/// Runs the HTTP server until `shutdown_signal` resolves.
///
/// Once the signal fires, the listener stops accepting connections, every
/// open session is asked to close, and we wait up to
/// [`ServeConfig::shutdown_timeout`] for them to do so.
#[tracing::instrument(skip(store, listener, shutdown_signal), err)]
pub async fn serve<S>(
	store: S,
	listener: TcpListener,
	config: ServeConfig,
	shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServeError>
where
	S: Backend,
{
	let bus = RecordBus::new(config.events.subscriber_capacity);
	let renderer = Renderer::new()?;
	let task_manager = TaskManager::default();
	let state = AppState::new(store, bus, renderer, task_manager.clone(), config.sessions);
	let router = http::router(state, config.include_http_headers);

	tracing::info!(addr = ?listener.local_addr()?, "listening for HTTP requests");

	axum::serve(listener, router)
		.with_graceful_shutdown(shutdown_signal)
		.await?;

	tracing::info!(
		sessions = task_manager.task_count(),
		"HTTP server stopped; closing open sessions",
	);

	if tokio::time::timeout(config.shutdown_timeout, task_manager.clone().shutdown())
		.await
		.is_err()
	{
		tracing::warn!(
			timeout = ?config.shutdown_timeout,
			remaining = task_manager.task_count(),
			"not all sessions closed in time",
		);
	}

	Ok(())
}
