use {
	crate::time::Timestamp,
	serde::{Deserialize, Serialize},
};

pub use self::rule::{ContestRule, UnknownContestRule};

mod rule;

make_id! {
	/// A contest's ID.
	ContestId
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contest
{
	pub id: ContestId,
	pub title: Box<str>,
	pub rule: ContestRule,
	pub begins_at: Timestamp,
	pub ends_at: Timestamp,
}

impl Contest
{
	/// Returns whether the contest's rule allows everyone to see its
	/// submissions at `now`.
	pub fn submissions_visible(&self, now: Timestamp) -> bool
	{
		self.rule.submissions_visible(self.begins_at, self.ends_at, now)
	}
}
