//! Judging records.
//!
//! A [`Record`] is a single submission and everything the judge has found out
//! about it so far. The judging pipeline is the only thing that ever mutates
//! one; everything else in this crate just reads and forwards them.

use {
	crate::{
		contests::{ContestId, ContestRule},
		problems::ProblemId,
		time::Timestamp,
		users::UserId,
	},
	serde::{Deserialize, Serialize},
};

pub use self::{
	delta::{ApplyDeltaError, FieldDelta},
	id::{ParseRecordIdError, RecordId},
	status::RecordStatus,
};

mod delta;
mod id;
mod status;

/// Fields that are only visible to the owner of a record and to users with
/// [`Permission::ViewCode`].
///
/// [`Permission::ViewCode`]: crate::users::Permission::ViewCode
pub const CODE_FIELDS: &[&str] = &["code", "compiler_texts"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record
{
	pub id: RecordId,
	pub owner_id: UserId,
	pub problem_id: ProblemId,
	pub contest: Option<RecordContest>,

	/// Hidden records never show up in record lists.
	pub hidden: bool,

	pub status: RecordStatus,
	pub score: u32,
	pub time_ms: u32,
	pub memory_kb: u32,
	pub lang: Box<str>,

	/// [`None`] if it has been redacted.
	pub code: Option<Box<str>>,

	pub cases: Vec<CaseResult>,
	pub judge_texts: Vec<Box<str>>,
	pub compiler_texts: Vec<Box<str>>,
	pub judge_id: Option<UserId>,
	pub judged_at: Option<Timestamp>,
	pub rejudged: bool,
	pub submitted_at: Timestamp,
}

/// The contest a record was submitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordContest
{
	pub contest_id: ContestId,
	pub contest_rule: ContestRule,
}

/// The result of running a record against a single test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseResult
{
	pub status: RecordStatus,
	pub score: u32,
	pub time_ms: u32,
	pub memory_kb: u32,

	#[serde(default)]
	pub message: Box<str>,
}

impl Record
{
	pub fn contest_id(&self) -> Option<ContestId>
	{
		self.contest.map(|contest| contest.contest_id)
	}

	/// Removes the submitted code and the compiler output.
	pub fn redact_code(&mut self)
	{
		self.code = None;
		self.compiler_texts.clear();
	}

	/// Clears every judging result so the record can be judged again.
	pub fn reset_for_rejudge(&mut self)
	{
		self.status = RecordStatus::Waiting;
		self.score = 0;
		self.time_ms = 0;
		self.memory_kb = 0;
		self.cases.clear();
		self.judge_texts.clear();
		self.compiler_texts.clear();
		self.judge_id = None;
		self.judged_at = None;
		self.rejudged = true;
	}
}
