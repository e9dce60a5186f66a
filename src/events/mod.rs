//! Change notifications for records.
//!
//! The judging pipeline publishes a [`RecordChange`] on [`RECORD_CHANGE`]
//! whenever it mutates a record; every open record session is subscribed to
//! that topic and decides on its own what to do with the event.

use {
	crate::records::{FieldDelta, Record},
	serde::{Deserialize, Serialize},
};

pub use self::bus::{Envelope, EventBus, Lagged, SubscriberId, Subscription};

mod bus;

/// The topic every record mutation is published on.
pub const RECORD_CHANGE: &str = "record_change";

/// A single record mutation.
///
/// Every event carries the full updated document, so it can be handled
/// without knowing about any earlier event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordChange
{
	pub record: Record,

	/// Which fields changed, for incremental updates.
	///
	/// [`None`] means "re-render everything".
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub field_delta: Option<FieldDelta>,
}

pub type RecordBus = EventBus<RecordChange>;

impl EventBus<RecordChange>
{
	/// Publishes a [`RecordChange`] on [`RECORD_CHANGE`].
	///
	/// Returns the number of sessions the event was queued for.
	#[tracing::instrument(level = "debug", skip_all, fields(record.id = %record.id))]
	pub fn publish_record_change(&self, record: Record, field_delta: Option<FieldDelta>) -> usize
	{
		let delivered = self.publish(RECORD_CHANGE, RecordChange { record, field_delta });
		tracing::debug!(delivered, "published record change");
		delivered
	}
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct EventsConfig
{
	/// How many events may be queued for a single session before it is
	/// considered to be lagging behind.
	pub subscriber_capacity: usize,
}

impl Default for EventsConfig
{
	fn default() -> Self
	{
		Self { subscriber_capacity: 64 }
	}
}
