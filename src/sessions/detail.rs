use {
	super::{OpenError, Protocol, message::Outgoing},
	crate::{
		error::ResultExt,
		events::RecordChange,
		problems::Problem,
		records::{Record, RecordId},
		render::{RecordView, Renderer},
		store::RecordStore,
		time::Timestamp,
		visibility::VisibilityPolicy,
	},
	std::sync::Arc,
};

/// A session on a single record's detail page.
///
/// The client first receives a full snapshot of the record, followed by
/// either patches or fresh snapshots as the judge makes progress.
#[derive(Debug)]
pub struct DetailSession<S>
{
	#[debug(skip)]
	store: Arc<S>,

	#[debug(skip)]
	renderer: Arc<Renderer>,

	policy: VisibilityPolicy,

	/// The record as it was when the session was opened.
	#[debug("{}", record.id)]
	record: Record,
}

impl<S> DetailSession<S>
where
	S: RecordStore,
{
	/// Authorizes a new detail session for `record_id`.
	#[tracing::instrument(level = "debug", skip(store, renderer), err(level = "debug"))]
	pub async fn open(
		store: Arc<S>,
		renderer: Arc<Renderer>,
		policy: VisibilityPolicy,
		record_id: RecordId,
		now: Timestamp,
	) -> Result<Self, OpenError>
	{
		let (record, _) = authorize(&*store, &policy, record_id, now).await?;

		Ok(Self { store, renderer, policy, record })
	}

	pub fn record_id(&self) -> RecordId
	{
		self.record.id
	}

	/// Re-fetches the record and renders a full snapshot of it.
	///
	/// Returns [`None`] if the record could not be fetched.
	async fn snapshot(&mut self) -> Option<Vec<Outgoing>>
	{
		if let Some(record) = self
			.store
			.get_record(self.record.id)
			.await
			.ok_or_warn("failed to refresh record")?
		{
			self.record = record;
		}

		let change = RecordChange { record: self.record.clone(), field_delta: None };

		Some(self.handle(&change).await.into_iter().collect())
	}

	#[tracing::instrument(level = "trace", skip_all, fields(record.id = %change.record.id))]
	async fn handle(&self, change: &RecordChange) -> Option<Outgoing>
	{
		let record = &change.record;

		if record.id != self.record.id {
			return None;
		}

		let problem = self
			.store
			.get_problem(record.problem_id)
			.await
			.ok_or_warn("failed to fetch record problem")?;

		if !problem_visible(&self.policy, problem.as_ref()) {
			tracing::trace!("record belongs to a hidden problem");
			return None;
		}

		if let Some(ref delta) = change.field_delta {
			let delta = self.policy.redact_delta(record.owner_id, delta);

			if delta.is_empty() {
				tracing::trace!("nothing left to patch");
				return None;
			}

			return Some(Outgoing::Patch(delta));
		}

		let owner = self
			.store
			.get_user(record.owner_id)
			.await
			.ok_or_warn("failed to fetch record owner")?;

		let record = self.policy.redact_record(record.clone());
		let view = RecordView { record: &record, owner: owner.as_ref(), problem: problem.as_ref() };
		let status_html = self
			.renderer
			.record_status(view)
			.ok_or_warn("failed to render record status")?;
		let summary_html = self
			.renderer
			.record_summary(view)
			.ok_or_warn("failed to render record summary")?;

		Some(Outgoing::Snapshot { status_html, summary_html })
	}
}

/// Looks up `record_id` and checks whether the viewer may see it at `now`.
///
/// Owners may always see their own records. Everybody else needs to be
/// allowed to see the record's contest, and its problem. Records of problems
/// the viewer may not see are reported as missing.
pub(crate) async fn authorize<S>(
	store: &S,
	policy: &VisibilityPolicy,
	record_id: RecordId,
	now: Timestamp,
) -> Result<(Record, Option<Problem>), OpenError>
where
	S: RecordStore,
{
	let record = store.get_record(record_id).await?.ok_or(OpenError::NotFound)?;
	let problem = store.get_problem(record.problem_id).await?;

	if !problem_visible(policy, problem.as_ref()) {
		return Err(OpenError::NotFound);
	}

	if let Some(contest_id) = record.contest_id()
		&& policy.viewer().user_id != Some(record.owner_id)
	{
		let contest = store.get_contest(contest_id).await?.ok_or(OpenError::NotFound)?;

		if !policy.can_show_record(&contest, now, true) {
			return Err(OpenError::Forbidden);
		}
	}

	Ok((record, problem))
}

/// Problems without a document are treated as hidden.
pub(crate) fn problem_visible(policy: &VisibilityPolicy, problem: Option<&Problem>) -> bool
{
	match problem {
		Some(problem) => policy.can_show_problem(problem),
		None => policy.can_show_hidden_problem(),
	}
}

impl<S> Protocol for DetailSession<S>
where
	S: RecordStore,
{
	/// Sends the initial snapshot.
	///
	/// The record is fetched again because it may have changed between
	/// opening the session and subscribing. If that fails, the record as it
	/// was at opening time is rendered instead.
	async fn on_subscribed(&mut self) -> Vec<Outgoing>
	{
		if let Some(messages) = self.snapshot().await {
			return messages;
		}

		let change = RecordChange { record: self.record.clone(), field_delta: None };

		self.handle(&change).await.into_iter().collect()
	}

	async fn on_event(&mut self, change: &RecordChange) -> Option<Outgoing>
	{
		self.handle(change).await
	}

	async fn on_message(&mut self, _payload: &[u8]) -> Vec<Outgoing>
	{
		tracing::trace!("ignoring message from detail client");
		Vec::new()
	}

	/// Missed patches cannot be replayed, so the client gets a fresh snapshot.
	async fn on_lagged(&mut self) -> Option<Vec<Outgoing>>
	{
		self.snapshot().await
	}
}
