//! Builders for the documents tests work with.

use {
	crate::{
		contests::{Contest, ContestId, ContestRule},
		problems::{Problem, ProblemId},
		records::{Record, RecordContest, RecordId, RecordStatus},
		time::Timestamp,
		users::{Permissions, User, UserId},
		visibility::Viewer,
	},
	std::time::Duration,
};

#[derive(Debug)]
pub(crate) struct RecordFixture
{
	record: Record,
}

/// A record by user 1 on problem 1 that does not belong to any contest.
pub(crate) fn record(id: u32) -> RecordFixture
{
	RecordFixture {
		record: Record {
			id: RecordId::new(id).unwrap(),
			owner_id: UserId::new(1).unwrap(),
			problem_id: ProblemId::new(1).unwrap(),
			contest: None,
			hidden: false,
			status: RecordStatus::Waiting,
			score: 0,
			time_ms: 0,
			memory_kb: 0,
			lang: "cpp".into(),
			code: Some("int main() {}".into()),
			cases: Vec::new(),
			judge_texts: Vec::new(),
			compiler_texts: vec!["main.cpp: compiled".into()],
			judge_id: None,
			judged_at: None,
			rejudged: false,
			submitted_at: Timestamp::from_unix(1_700_000_000 + i64::from(id)),
		},
	}
}

impl RecordFixture
{
	pub(crate) fn owner(mut self, owner_id: u32) -> Self
	{
		self.record.owner_id = UserId::new(owner_id).unwrap();
		self
	}

	pub(crate) fn problem(mut self, problem_id: u32) -> Self
	{
		self.record.problem_id = ProblemId::new(problem_id).unwrap();
		self
	}

	pub(crate) fn contest(mut self, contest_id: u32, contest_rule: ContestRule) -> Self
	{
		self.record.contest =
			Some(RecordContest { contest_id: ContestId::new(contest_id).unwrap(), contest_rule });
		self
	}

	pub(crate) fn hidden(mut self) -> Self
	{
		self.record.hidden = true;
		self
	}

	pub(crate) fn code(mut self, code: &str) -> Self
	{
		self.record.code = Some(code.into());
		self
	}

	pub(crate) fn status(mut self, status: RecordStatus) -> Self
	{
		self.record.status = status;
		self
	}

	pub(crate) fn build(self) -> Record
	{
		self.record
	}
}

pub(crate) fn problem(id: u32, hidden: bool) -> Problem
{
	Problem { id: ProblemId::new(id).unwrap(), title: format!("Problem {id}").into(), hidden }
}

/// A contest that started an hour ago and ends in an hour.
pub(crate) fn contest(id: u32, rule: ContestRule) -> Contest
{
	let now = Timestamp::now();

	Contest {
		id: ContestId::new(id).unwrap(),
		title: format!("Contest {id}").into(),
		rule,
		begins_at: now - Duration::from_secs(3600),
		ends_at: now + Duration::from_secs(3600),
	}
}

pub(crate) fn user(id: u32, name: &str) -> User
{
	User { id: UserId::new(id).unwrap(), name: name.into() }
}

pub(crate) fn viewer(id: u32, permissions: impl Into<Permissions>) -> Viewer
{
	Viewer::user(UserId::new(id).unwrap(), permissions)
}
