//! Test helpers.

use {
	futures_util::{Sink, Stream},
	std::{
		io,
		pin::Pin,
		task::{Context, Poll},
		time::Duration,
	},
	tokio::sync::mpsc,
	tokio_websockets::proto::{CloseCode, Message as RawMessage},
};

pub(crate) mod fixtures;

/// How long [`TestClient`] waits for a message before giving up.
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// The server half of an in-memory WebSocket connection.
#[derive(Debug)]
pub(crate) struct TestSocket
{
	incoming: mpsc::UnboundedReceiver<io::Result<RawMessage>>,
	outgoing: mpsc::UnboundedSender<RawMessage>,
}

/// The client half of an in-memory WebSocket connection.
#[derive(Debug)]
pub(crate) struct TestClient
{
	tx: mpsc::UnboundedSender<io::Result<RawMessage>>,
	rx: mpsc::UnboundedReceiver<RawMessage>,
}

pub(crate) fn socket_pair() -> (TestSocket, TestClient)
{
	let (client_tx, server_rx) = mpsc::unbounded_channel();
	let (server_tx, client_rx) = mpsc::unbounded_channel();

	(
		TestSocket { incoming: server_rx, outgoing: server_tx },
		TestClient { tx: client_tx, rx: client_rx },
	)
}

impl Stream for TestSocket
{
	type Item = io::Result<RawMessage>;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>>
	{
		self.get_mut().incoming.poll_recv(cx)
	}
}

impl Sink<RawMessage> for TestSocket
{
	type Error = io::Error;

	fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>>
	{
		Poll::Ready(Ok(()))
	}

	fn start_send(self: Pin<&mut Self>, message: RawMessage) -> io::Result<()>
	{
		self.outgoing
			.send(message)
			.map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))
	}

	fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>>
	{
		Poll::Ready(Ok(()))
	}

	fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>>
	{
		Poll::Ready(Ok(()))
	}
}

impl TestClient
{
	pub(crate) fn send_text(&self, text: impl Into<String>)
	{
		let _ = self.tx.send(Ok(RawMessage::text(text.into())));
	}

	/// Makes the server's next read fail.
	pub(crate) fn send_error(&self)
	{
		let _ = self.tx.send(Err(io::Error::from(io::ErrorKind::ConnectionReset)));
	}

	pub(crate) fn close(&self)
	{
		let _ = self.tx.send(Ok(RawMessage::close(Some(CloseCode::NORMAL_CLOSURE), "")));
	}

	/// Waits for the next frame the server sends, including control frames.
	pub(crate) async fn recv(&mut self) -> Option<RawMessage>
	{
		tokio::time::timeout(RECV_TIMEOUT, self.rx.recv())
			.await
			.ok()
			.flatten()
	}

	/// Waits for the next text frame and parses it as JSON.
	///
	/// Panics if the server closes the connection or sends nothing in time.
	pub(crate) async fn recv_json(&mut self) -> serde_json::Value
	{
		loop {
			let message = self.recv().await.expect("server did not send a message");

			if message.is_ping() || message.is_pong() {
				continue;
			}

			let text = message
				.as_text()
				.unwrap_or_else(|| panic!("expected a text frame, got {message:?}"));

			return serde_json::from_str(text).expect("server sent invalid JSON");
		}
	}

	/// Waits for the server to close the connection and returns the close
	/// code it sent.
	pub(crate) async fn recv_close(&mut self) -> Option<CloseCode>
	{
		while let Some(message) = self.recv().await {
			if let Some((code, _)) = message.as_close() {
				return Some(code);
			}
		}

		None
	}
}
