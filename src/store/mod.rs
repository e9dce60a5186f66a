//! Access to the documents the record feed is built from.
//!
//! Almost everything here is read-only. The only writes are resetting a
//! record for a rejudge and applying progress reported by the judge.

use crate::{
	contests::{Contest, ContestId},
	database::DatabaseError,
	problems::{Problem, ProblemId},
	records::{ApplyDeltaError, FieldDelta, Record, RecordId},
	users::{User, UserId},
	visibility::Viewer,
};

pub use self::{memory::MemoryStore, mysql::MySqlStore};

mod memory;
mod mysql;

/// Default number of records per page.
pub const PAGE_SIZE: u32 = 50;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Display, Error, From)]
pub enum StoreError
{
	#[from(DatabaseError, sqlx::Error)]
	Database(DatabaseError),

	#[display("failed to decode stored document: {_0}")]
	#[from]
	Decode(serde_json::Error),

	#[from]
	InvalidDelta(ApplyDeltaError),
}

/// Filters for [`RecordStore::list_records()`].
///
/// Hidden records are never listed.
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
pub struct RecordQuery
{
	pub problem: Option<ProblemId>,

	/// Only records of this contest. [`None`] means "only records that do
	/// not belong to any contest".
	pub contest: Option<ContestId>,

	pub owner: Option<UserId>,

	/// Whether records of hidden problems should be included.
	#[builder(default)]
	pub include_hidden_problems: bool,

	/// 1-based page number.
	#[builder(default = 1)]
	pub page: u32,

	#[builder(default = PAGE_SIZE)]
	pub limit: u32,
}

impl RecordQuery
{
	pub(crate) fn offset(&self) -> u64
	{
		u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
	}
}

/// A single page of records, newest first.
#[derive(Debug, Clone, Default)]
pub struct RecordPage
{
	#[debug("{}", records.len())]
	pub records: Vec<Record>,

	/// Number of records matching the query across all pages.
	pub total: u64,
}

/// Query surface over records and the documents they reference.
pub trait RecordStore: Send + Sync + 'static
{
	fn get_record(&self, id: RecordId) -> impl Future<Output = StoreResult<Option<Record>>> + Send;

	/// Fetches every record in `ids` that exists, in no particular order.
	fn get_records(&self, ids: &[RecordId]) -> impl Future<Output = StoreResult<Vec<Record>>> + Send;

	fn list_records(
		&self,
		query: &RecordQuery,
	) -> impl Future<Output = StoreResult<RecordPage>> + Send;

	fn get_user(&self, id: UserId) -> impl Future<Output = StoreResult<Option<User>>> + Send;

	fn get_users(&self, ids: &[UserId]) -> impl Future<Output = StoreResult<Vec<User>>> + Send;

	fn find_user_by_name(
		&self,
		name: &str,
	) -> impl Future<Output = StoreResult<Option<User>>> + Send;

	fn get_problem(
		&self,
		id: ProblemId,
	) -> impl Future<Output = StoreResult<Option<Problem>>> + Send;

	fn get_problems(
		&self,
		ids: &[ProblemId],
	) -> impl Future<Output = StoreResult<Vec<Problem>>> + Send;

	fn get_contest(
		&self,
		id: ContestId,
	) -> impl Future<Output = StoreResult<Option<Contest>>> + Send;

	/// Resolves a session token to the viewer it belongs to.
	fn get_viewer(&self, token: &str) -> impl Future<Output = StoreResult<Option<Viewer>>> + Send;

	/// Applies `delta` to a stored record.
	///
	/// Returns the updated record, or [`None`] if it does not exist. Nothing
	/// is stored if the delta is invalid.
	fn apply_delta(
		&self,
		id: RecordId,
		delta: &FieldDelta,
	) -> impl Future<Output = StoreResult<Option<Record>>> + Send;
}

/// Hands records over to the judging pipeline.
pub trait JudgeQueue: Send + Sync + 'static
{
	/// Clears the judging results of a record and queues it for judging.
	///
	/// Both happen or neither does. Returns the reset record, or [`None`] if
	/// it does not exist.
	fn requeue(&self, id: RecordId) -> impl Future<Output = StoreResult<Option<Record>>> + Send;
}

/// Everything the HTTP layer needs from storage.
pub trait Backend: RecordStore + JudgeQueue
{
}

impl<T> Backend for T where T: RecordStore + JudgeQueue
{
}
