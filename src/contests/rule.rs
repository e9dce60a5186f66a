use {
	crate::time::Timestamp,
	serde::{Deserialize, Serialize},
	std::str::FromStr,
};

/// Decides when the submissions of a contest become public.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContestRule
{
	/// Submissions are sealed until the contest is over.
	#[display("oi")]
	Oi,

	/// Submissions are public as soon as the contest begins.
	#[display("acm")]
	Acm,

	/// Same as [`ContestRule::Acm`].
	#[display("homework")]
	Homework,
}

#[derive(Debug, Display, Error)]
#[display("unknown contest rule: {reason}")]
pub struct UnknownContestRule
{
	reason: Box<str>,
}

impl ContestRule
{
	/// Returns whether other users' submissions may be shown at `now`.
	pub fn submissions_visible(
		&self,
		begins_at: Timestamp,
		ends_at: Timestamp,
		now: Timestamp,
	) -> bool
	{
		match *self {
			ContestRule::Oi => now >= ends_at,
			ContestRule::Acm | ContestRule::Homework => now >= begins_at,
		}
	}
}

impl FromStr for ContestRule
{
	type Err = UnknownContestRule;

	fn from_str(value: &str) -> Result<Self, Self::Err>
	{
		Self::deserialize(serde::de::value::StrDeserializer::new(value))
	}
}

impl serde::de::Error for UnknownContestRule
{
	fn custom<T>(msg: T) -> Self
	where
		T: std::fmt::Display,
	{
		Self { reason: msg.to_string().into_boxed_str() }
	}
}
