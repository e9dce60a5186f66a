//! WebSocket sessions for the record list and the record detail page.
//!
//! Every session runs on its own task and owns exactly one [`Subscription`]
//! to [`RECORD_CHANGE`]. The subscription is created before the task is
//! spawned and released when the task exits, no matter how it exits.
//!
//! [`RECORD_CHANGE`]: crate::events::RECORD_CHANGE

use {
	crate::{
		TaskManager,
		events::{Lagged, RECORD_CHANGE, RecordBus, RecordChange, Subscription},
		store::StoreError,
	},
	axum::response::Response,
	axum_tws::{WebSocket, WebSocketError, WebSocketUpgrade},
	bytes::Bytes,
	futures_util::{Sink, SinkExt, Stream, StreamExt, TryStreamExt},
	serde::{Deserialize, Deserializer},
	std::{
		error::Error,
		io,
		pin::{Pin, pin},
		time::Duration,
	},
	tokio::{
		sync::oneshot,
		time::{self, Instant, MissedTickBehavior},
	},
	tokio_util::sync::CancellationToken,
	tokio_websockets::proto::Message as RawMessage,
};

pub use self::{
	detail::DetailSession,
	list::ListSession,
	message::{DecodeMessageError, EncodeMessageError},
};
pub(crate) use self::{detail::authorize as authorize_record, list::authorize_contest};
use self::message::Outgoing;

mod detail;
mod list;
mod message;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct SessionsConfig
{
	/// How often we ping idle clients.
	#[serde(default = "default_heartbeat_interval", deserialize_with = "deserialize_duration")]
	pub heartbeat_interval: Duration,
}

impl Default for SessionsConfig
{
	fn default() -> Self
	{
		Self { heartbeat_interval: default_heartbeat_interval() }
	}
}

fn default_heartbeat_interval() -> Duration
{
	Duration::from_secs(30)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
	D: Deserializer<'de>,
{
	f64::deserialize(deserializer).map(Duration::from_secs_f64)
}

/// Why a session could not be opened.
#[derive(Debug, Display, Error, From)]
pub enum OpenError
{
	#[display("the requested resource does not exist")]
	NotFound,

	#[display("you are not allowed to view this resource")]
	Forbidden,

	#[from]
	Store(StoreError),
}

#[derive(Debug, Display, Error, From)]
pub enum SessionError
{
	#[display("transport error: {_0}")]
	Io(io::Error),

	#[display("{_0}")]
	Encode(EncodeMessageError),
}

/// The part of a session that differs between the list and the detail view.
pub(crate) trait Protocol: Send + 'static
{
	/// Messages to send right after the session has subscribed.
	fn on_subscribed(&mut self) -> impl Future<Output = Vec<Outgoing>> + Send;

	/// Turns a published change into the message for this session, if any.
	fn on_event(&mut self, change: &RecordChange) -> impl Future<Output = Option<Outgoing>> + Send;

	/// Handles a text or binary frame sent by the client.
	fn on_message(&mut self, payload: &[u8]) -> impl Future<Output = Vec<Outgoing>> + Send;

	/// Brings the client back up to date after it missed events.
	///
	/// Returns [`None`] if that is not possible, in which case the session is
	/// closed and the client is asked to reconnect.
	fn on_lagged(&mut self) -> impl Future<Output = Option<Vec<Outgoing>>> + Send;
}

/// Subscribes to record changes and spawns a session task that starts once
/// the HTTP connection has been upgraded.
///
/// Fails only if the server is already shutting down.
#[tracing::instrument(level = "debug", skip_all)]
pub(crate) fn spawn<P>(
	upgrade: WebSocketUpgrade,
	bus: &RecordBus,
	tasks: &TaskManager,
	config: SessionsConfig,
	protocol: P,
	span: tracing::Span,
) -> io::Result<Response>
where
	P: Protocol,
{
	let socket_tx = start(bus, tasks, config, protocol, span)?;

	Ok(upgrade.on_upgrade(async move |socket| {
		tracing::trace!("upgraded HTTP connection to WebSocket");
		let _ = socket_tx.send(socket);
	}))
}

/// Subscribes to record changes and spawns a session task that runs once a
/// socket is sent on the returned channel.
///
/// If the sender is dropped instead, the task exits and releases the
/// subscription. If the task cannot be spawned, the subscription is released
/// right away.
fn start<P>(
	bus: &RecordBus,
	tasks: &TaskManager,
	config: SessionsConfig,
	protocol: P,
	span: tracing::Span,
) -> io::Result<oneshot::Sender<WebSocket>>
where
	P: Protocol,
{
	let subscription = bus.subscribe(&[RECORD_CHANGE]);
	let (socket_tx, socket_rx) = oneshot::channel::<WebSocket>();

	tasks.spawn(span, move |cancellation_token| async move {
		let Ok(socket) = socket_rx.await else {
			tracing::debug!("connection was never upgraded");
			return;
		};

		let map_err = |err| {
			if let WebSocketError::Internal(axum_tws::Error::Io(error)) = err {
				error
			} else {
				io::Error::other(err)
			}
		};

		let mut socket = pin!(socket.sink_map_err(map_err).map_err(map_err));
		let _ = run(socket.as_mut(), subscription, protocol, cancellation_token, config).await;
	})?;

	Ok(socket_tx)
}

/// Drives a session until the client leaves, the transport fails, or the
/// server shuts down.
///
/// `subscription` is released before this function returns.
#[tracing::instrument(
	level = "debug",
	skip_all,
	fields(subscriber.id = %subscription.id()),
	err(level = "debug")
)]
pub(crate) async fn run<S, P>(
	mut socket: Pin<&mut S>,
	mut subscription: Subscription<RecordChange>,
	mut protocol: P,
	cancellation_token: CancellationToken,
	config: SessionsConfig,
) -> Result<(), SessionError>
where
	S: Stream<Item = io::Result<RawMessage>>,
	S: Sink<RawMessage, Error = io::Error>,
	P: Protocol,
{
	let result = main_loop(
		socket.as_mut(),
		&mut subscription,
		&mut protocol,
		&cancellation_token,
		config,
	)
	.await;

	subscription.unsubscribe();

	if let Err(ref err) = result {
		tracing::error!(error = err as &dyn Error, "session encountered an error");

		if let Err(err) = socket.send(message::internal_server_error()).await {
			tracing::debug!(error = &err as &dyn Error, "failed to send close frame");
		}
	}

	tracing::debug!("session closed");

	result
}

async fn main_loop<S, P>(
	mut socket: Pin<&mut S>,
	subscription: &mut Subscription<RecordChange>,
	protocol: &mut P,
	cancellation_token: &CancellationToken,
	config: SessionsConfig,
) -> Result<(), SessionError>
where
	S: Stream<Item = io::Result<RawMessage>>,
	S: Sink<RawMessage, Error = io::Error>,
	P: Protocol,
{
	for message in protocol.on_subscribed().await {
		socket.as_mut().feed(message.encode()?).await?;
	}

	socket.as_mut().flush().await?;

	let mut heartbeat = time::interval_at(
		Instant::now() + config.heartbeat_interval,
		config.heartbeat_interval,
	);

	heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

	loop {
		tokio::select! {
			() = cancellation_token.cancelled() => {
				tracing::debug!("closing session due to server shutdown");
				socket.as_mut().send(message::shutdown_message()).await?;
				break Ok(());
			},

			_ = heartbeat.tick() => {
				tracing::trace!("sending heartbeat");
				socket.as_mut().feed(RawMessage::ping(Bytes::new())).await?;
			},

			recv_result = socket.next() => {
				let Some(recv_result) = recv_result else {
					tracing::debug!("client went away");
					break Ok(());
				};

				let message = recv_result?;

				if let Some((code, reason)) = message.as_close() {
					tracing::debug!(code = u16::from(code), reason, "client closed the session");
					break Ok(());
				}

				if message.is_ping() || message.is_pong() {
					tracing::trace!(payload.size = message.as_payload().len(), "control frame");
					continue;
				}

				for outgoing in protocol.on_message(&message.as_payload()[..]).await {
					socket.as_mut().feed(outgoing.encode()?).await?;
				}
			},

			Some(received) = subscription.recv() => match received {
				Ok(envelope) => {
					if let Some(outgoing) = protocol.on_event(&envelope.payload).await {
						socket.as_mut().feed(outgoing.encode()?).await?;
					}
				},
				Err(Lagged { skipped }) => {
					let Some(messages) = protocol.on_lagged().await else {
						tracing::warn!(skipped, "session cannot catch up; closing");
						socket.as_mut().send(message::overloaded_message()).await?;
						break Ok(());
					};

					tracing::debug!(skipped, "caught up after lagging behind");

					for outgoing in messages {
						socket.as_mut().feed(outgoing.encode()?).await?;
					}
				},
			},
		};

		socket.as_mut().flush().await?;
	}
}

