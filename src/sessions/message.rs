use {
	crate::records::{FieldDelta, RecordId},
	serde::{Deserialize, Serialize},
	tokio_websockets::proto::{CloseCode, Message as RawMessage},
};

/// Messages we send to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub(crate) enum Outgoing
{
	/// A freshly rendered row of the record list.
	Row
	{
		html: String
	},

	/// A full render of the record detail page.
	Snapshot
	{
		status_html: String,
		summary_html: String,
	},

	/// The fields of the viewed record that changed.
	Patch(FieldDelta),
}

/// A list client asking for the current state of some records.
#[derive(Debug, Deserialize)]
pub(crate) struct ResyncRequest
{
	pub rids: Vec<RecordId>,
}

#[derive(Debug, Display, Error, From)]
#[display("failed to encode message: {_0}")]
pub struct EncodeMessageError(serde_json::Error);

#[derive(Debug, Display, Error, From)]
#[display("failed to decode message: {_0}")]
pub struct DecodeMessageError(serde_json::Error);

impl Outgoing
{
	#[tracing::instrument(level = "trace", ret(level = "trace"), err)]
	pub(crate) fn encode(&self) -> Result<RawMessage, EncodeMessageError>
	{
		serde_json::to_string(self)
			.map(RawMessage::text)
			.map_err(EncodeMessageError::from)
	}
}

impl ResyncRequest
{
	#[tracing::instrument(level = "trace", ret(level = "trace"), err(level = "debug"))]
	pub(crate) fn decode(payload: &[u8]) -> Result<Self, DecodeMessageError>
	{
		serde_json::from_slice(payload).map_err(DecodeMessageError::from)
	}
}

pub(crate) fn internal_server_error() -> RawMessage
{
	RawMessage::close(Some(CloseCode::INTERNAL_SERVER_ERROR), "server encountered an error")
}

pub(crate) fn shutdown_message() -> RawMessage
{
	RawMessage::close(Some(CloseCode::GOING_AWAY), "server shutting down")
}

pub(crate) fn overloaded_message() -> RawMessage
{
	RawMessage::close(Some(CloseCode::SERVICE_OVERLOAD), "missed updates; try again")
}
