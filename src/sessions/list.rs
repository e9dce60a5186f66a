use {
	super::{
		OpenError,
		Protocol,
		detail::problem_visible,
		message::{Outgoing, ResyncRequest},
	},
	crate::{
		contests::{Contest, ContestId},
		error::ResultExt,
		events::RecordChange,
		records::{Record, RecordId},
		render::{RecordView, Renderer},
		store::RecordStore,
		time::Timestamp,
		visibility::VisibilityPolicy,
	},
	std::{collections::HashMap, sync::Arc},
};

/// The most records a single resync request may ask for.
pub(crate) const MAX_RESYNC_RECORDS: usize = 200;

/// A session on the record list.
///
/// Pushes a freshly rendered row whenever a record in the list changes.
#[derive(Debug)]
pub struct ListSession<S>
{
	#[debug(skip)]
	store: Arc<S>,

	#[debug(skip)]
	renderer: Arc<Renderer>,

	policy: VisibilityPolicy,

	/// Only records of this contest are shown. [`None`] means "only records
	/// that do not belong to any contest".
	contest_filter: Option<ContestId>,
}

impl<S> ListSession<S>
where
	S: RecordStore,
{
	/// Authorizes a new list session.
	///
	/// Fails if `contest_filter` refers to a contest that does not exist or
	/// whose records the viewer may not see at `now`.
	#[tracing::instrument(level = "debug", skip(store, renderer), err(level = "debug"))]
	pub async fn open(
		store: Arc<S>,
		renderer: Arc<Renderer>,
		policy: VisibilityPolicy,
		contest_filter: Option<ContestId>,
		now: Timestamp,
	) -> Result<Self, OpenError>
	{
		if let Some(contest_id) = contest_filter {
			authorize_contest(&*store, &policy, contest_id, now).await?;
		}

		Ok(Self { store, renderer, policy, contest_filter })
	}

	/// Renders the row for `record`, or [`None`] if this session should not
	/// hear about it.
	#[tracing::instrument(level = "trace", skip_all, fields(record.id = %record.id))]
	async fn render_row(&self, record: &Record) -> Option<Outgoing>
	{
		if record.contest_id() != self.contest_filter || record.hidden {
			tracing::trace!("record is not part of this list");
			return None;
		}

		let (owner, problem) = tokio::join!(
			self.store.get_user(record.owner_id),
			self.store.get_problem(record.problem_id),
		);

		let owner = owner.ok_or_warn("failed to fetch record owner")?;
		let problem = problem.ok_or_warn("failed to fetch record problem")?;

		if !problem_visible(&self.policy, problem.as_ref()) {
			tracing::trace!("record belongs to a hidden problem");
			return None;
		}

		let record = self.policy.redact_record(record.clone());
		let html = self
			.renderer
			.record_row(RecordView {
				record: &record,
				owner: owner.as_ref(),
				problem: problem.as_ref(),
			})
			.ok_or_warn("failed to render record row")?;

		Some(Outgoing::Row { html })
	}

	/// Looks up the current state of `ids`, in request order.
	///
	/// Unknown IDs are skipped.
	async fn resync(&self, ids: &[RecordId]) -> Vec<Outgoing>
	{
		let Some(records) =
			self.store.get_records(ids).await.ok_or_warn("failed to fetch records for resync")
		else {
			return Vec::new();
		};

		let mut records = records
			.into_iter()
			.map(|record| (record.id, record))
			.collect::<HashMap<_, _>>();

		let mut messages = Vec::with_capacity(records.len());

		for id in ids {
			let Some(record) = records.remove(id) else {
				continue;
			};

			if let Some(message) = self.render_row(&record).await {
				messages.push(message);
			}
		}

		messages
	}
}

/// Checks whether the viewer may see the records of `contest_id` at `now`.
pub(crate) async fn authorize_contest<S>(
	store: &S,
	policy: &VisibilityPolicy,
	contest_id: ContestId,
	now: Timestamp,
) -> Result<Contest, OpenError>
where
	S: RecordStore,
{
	let contest = store.get_contest(contest_id).await?.ok_or(OpenError::NotFound)?;

	if !policy.can_show_record(&contest, now, true) {
		return Err(OpenError::Forbidden);
	}

	Ok(contest)
}

impl<S> Protocol for ListSession<S>
where
	S: RecordStore,
{
	async fn on_subscribed(&mut self) -> Vec<Outgoing>
	{
		Vec::new()
	}

	async fn on_event(&mut self, change: &RecordChange) -> Option<Outgoing>
	{
		self.render_row(&change.record).await
	}

	#[tracing::instrument(level = "debug", skip_all)]
	async fn on_message(&mut self, payload: &[u8]) -> Vec<Outgoing>
	{
		let Ok(ResyncRequest { mut rids }) = ResyncRequest::decode(payload) else {
			tracing::debug!("ignoring malformed message");
			return Vec::new();
		};

		if rids.len() > MAX_RESYNC_RECORDS {
			tracing::debug!(requested = rids.len(), "truncating resync request");
			rids.truncate(MAX_RESYNC_RECORDS);
		}

		self.resync(&rids).await
	}

	/// We do not know which rows the client is showing, so it has to reload.
	async fn on_lagged(&mut self) -> Option<Vec<Outgoing>>
	{
		None
	}
}
