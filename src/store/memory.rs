use {
	super::{JudgeQueue, RecordPage, RecordQuery, RecordStore, StoreResult},
	crate::{
		contests::{Contest, ContestId},
		problems::{Problem, ProblemId},
		records::{FieldDelta, Record, RecordId},
		users::{User, UserId},
		visibility::Viewer,
	},
	std::{
		collections::{BTreeMap, HashMap},
		sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
	},
};

/// A [`RecordStore`] that keeps everything in memory.
///
/// Used by tests and by `--in-memory` development runs.
#[derive(Debug, Default)]
pub struct MemoryStore
{
	state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State
{
	records: BTreeMap<RecordId, Record>,
	users: BTreeMap<UserId, User>,
	problems: BTreeMap<ProblemId, Problem>,
	contests: BTreeMap<ContestId, Contest>,
	sessions: HashMap<Box<str>, Viewer>,
	judge_queue: Vec<RecordId>,
}

impl MemoryStore
{
	fn read(&self) -> RwLockReadGuard<'_, State>
	{
		self.state.read().unwrap_or_else(PoisonError::into_inner)
	}

	fn write(&self) -> RwLockWriteGuard<'_, State>
	{
		self.state.write().unwrap_or_else(PoisonError::into_inner)
	}

	pub fn insert_record(&self, record: Record)
	{
		self.write().records.insert(record.id, record);
	}

	pub fn insert_user(&self, user: User)
	{
		self.write().users.insert(user.id, user);
	}

	pub fn insert_problem(&self, problem: Problem)
	{
		self.write().problems.insert(problem.id, problem);
	}

	pub fn insert_contest(&self, contest: Contest)
	{
		self.write().contests.insert(contest.id, contest);
	}

	pub fn insert_session(&self, token: impl Into<Box<str>>, viewer: Viewer)
	{
		self.write().sessions.insert(token.into(), viewer);
	}

	/// Returns every record ID that has been enqueued so far, oldest first.
	pub fn judge_queue(&self) -> Vec<RecordId>
	{
		self.read().judge_queue.clone()
	}

	fn matches(state: &State, query: &RecordQuery, record: &Record) -> bool
	{
		if record.hidden {
			return false;
		}

		if query.problem.is_some_and(|problem_id| problem_id != record.problem_id) {
			return false;
		}

		if query.owner.is_some_and(|owner_id| owner_id != record.owner_id) {
			return false;
		}

		if query.contest != record.contest_id() {
			return false;
		}

		query.include_hidden_problems
			|| state
				.problems
				.get(&record.problem_id)
				.is_some_and(|problem| !problem.hidden)
	}
}

impl RecordStore for MemoryStore
{
	#[tracing::instrument(level = "trace", skip(self), ret(level = "trace"))]
	async fn get_record(&self, id: RecordId) -> StoreResult<Option<Record>>
	{
		Ok(self.read().records.get(&id).cloned())
	}

	#[tracing::instrument(level = "trace", skip(self))]
	async fn get_records(&self, ids: &[RecordId]) -> StoreResult<Vec<Record>>
	{
		let state = self.read();

		Ok(ids.iter().filter_map(|id| state.records.get(id)).cloned().collect())
	}

	#[tracing::instrument(level = "trace", skip(self))]
	async fn list_records(&self, query: &RecordQuery) -> StoreResult<RecordPage>
	{
		let state = self.read();
		let matching = state
			.records
			.values()
			.rev()
			.filter(|record| Self::matches(&state, query, record))
			.collect::<Vec<_>>();

		let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
		let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);

		Ok(RecordPage {
			total: matching.len() as u64,
			records: matching.into_iter().skip(offset).take(limit).cloned().collect(),
		})
	}

	async fn get_user(&self, id: UserId) -> StoreResult<Option<User>>
	{
		Ok(self.read().users.get(&id).cloned())
	}

	async fn get_users(&self, ids: &[UserId]) -> StoreResult<Vec<User>>
	{
		let state = self.read();

		Ok(ids.iter().filter_map(|id| state.users.get(id)).cloned().collect())
	}

	async fn find_user_by_name(&self, name: &str) -> StoreResult<Option<User>>
	{
		Ok(self
			.read()
			.users
			.values()
			.find(|user| user.name.eq_ignore_ascii_case(name))
			.cloned())
	}

	async fn get_problem(&self, id: ProblemId) -> StoreResult<Option<Problem>>
	{
		Ok(self.read().problems.get(&id).cloned())
	}

	async fn get_problems(&self, ids: &[ProblemId]) -> StoreResult<Vec<Problem>>
	{
		let state = self.read();

		Ok(ids.iter().filter_map(|id| state.problems.get(id)).cloned().collect())
	}

	async fn get_contest(&self, id: ContestId) -> StoreResult<Option<Contest>>
	{
		Ok(self.read().contests.get(&id).cloned())
	}

	async fn get_viewer(&self, token: &str) -> StoreResult<Option<Viewer>>
	{
		Ok(self.read().sessions.get(token).copied())
	}

	#[tracing::instrument(level = "debug", skip(self))]
	async fn apply_delta(&self, id: RecordId, delta: &FieldDelta) -> StoreResult<Option<Record>>
	{
		let mut state = self.write();
		let Some(record) = state.records.get_mut(&id) else {
			return Ok(None);
		};

		*record = delta.apply(record)?;

		Ok(Some(record.clone()))
	}
}

impl JudgeQueue for MemoryStore
{
	#[tracing::instrument(level = "debug", skip(self))]
	async fn requeue(&self, id: RecordId) -> StoreResult<Option<Record>>
	{
		let mut state = self.write();
		let Some(record) = state.records.get_mut(&id) else {
			return Ok(None);
		};

		record.reset_for_rejudge();
		let record = record.clone();
		state.judge_queue.push(id);

		Ok(Some(record))
	}
}
