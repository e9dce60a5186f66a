//! The two ways records change: a rejudge request, and progress reported by
//! the judge.

use crate::{
	events::RecordBus,
	records::{ApplyDeltaError, FieldDelta, Record, RecordId},
	store::{Backend, RecordStore, StoreError, StoreResult},
};

#[derive(Debug, Display, Error)]
pub enum ReportError
{
	#[display("record does not exist")]
	UnknownRecord,

	#[display("{_0}")]
	InvalidDelta(ApplyDeltaError),

	#[display("{_0}")]
	Store(StoreError),
}

/// Resets a record's judging state and hands it back to the judge.
///
/// Returns `false` if the record does not exist, in which case nothing
/// happens at all. Nothing is published here; the judge reports its progress
/// through [`report()`] like for any other record.
#[tracing::instrument(level = "debug", skip(store), ret(level = "debug"), err)]
pub async fn rejudge<S>(store: &S, record_id: RecordId) -> StoreResult<bool>
where
	S: Backend,
{
	if store.requeue(record_id).await?.is_none() {
		tracing::debug!("record does not exist; nothing to rejudge");
		return Ok(false);
	}

	tracing::info!("queued record for rejudging");

	Ok(true)
}

/// Applies `delta` to a stored record and publishes the result.
///
/// Unless `is_final` is set the delta is published alongside the record so
/// detail sessions can patch instead of re-rendering. Invalid deltas are
/// neither stored nor published.
#[tracing::instrument(level = "debug", skip(store, bus, delta), err(level = "debug"))]
pub async fn report<S>(
	store: &S,
	bus: &RecordBus,
	record_id: RecordId,
	delta: FieldDelta,
	is_final: bool,
) -> Result<Record, ReportError>
where
	S: RecordStore,
{
	let record = match store.apply_delta(record_id, &delta).await {
		Ok(Some(record)) => record,
		Ok(None) => return Err(ReportError::UnknownRecord),
		Err(StoreError::InvalidDelta(error)) => return Err(ReportError::InvalidDelta(error)),
		Err(error) => return Err(ReportError::Store(error)),
	};

	let field_delta = (!is_final).then_some(delta);
	bus.publish_record_change(record.clone(), field_delta);

	Ok(record)
}
