use std::{cmp, ops, time::SystemTime};

use serde::{Deserialize, Serialize};

/// A UTC point in time, serialized as RFC 3339.
#[derive(
	Debug,
	Display,
	Clone,
	Copy,
	PartialEq,
	Eq,
	PartialOrd,
	Ord,
	Hash,
	From,
	Into,
	Serialize,
	Deserialize,
)]
pub struct Timestamp(#[serde(with = "time::serde::rfc3339")] time::OffsetDateTime);

impl Timestamp
{
	pub fn now() -> Self
	{
		Self(time::OffsetDateTime::now_utc())
	}

	/// Creates a timestamp from seconds since the Unix epoch.
	///
	/// Out-of-range values saturate to the epoch.
	pub fn from_unix(seconds: i64) -> Self
	{
		Self(
			time::OffsetDateTime::from_unix_timestamp(seconds)
				.unwrap_or(time::OffsetDateTime::UNIX_EPOCH),
		)
	}

	pub fn as_offset_date_time(&self) -> time::OffsetDateTime
	{
		self.0
	}
}

impl From<SystemTime> for Timestamp
{
	fn from(system_time: SystemTime) -> Self
	{
		Self(system_time.into())
	}
}

impl PartialEq<time::OffsetDateTime> for Timestamp
{
	fn eq(&self, other: &time::OffsetDateTime) -> bool
	{
		self.0.eq(other)
	}
}

impl PartialOrd<time::OffsetDateTime> for Timestamp
{
	fn partial_cmp(&self, other: &time::OffsetDateTime) -> Option<cmp::Ordering>
	{
		self.0.partial_cmp(other)
	}
}

impl ops::Add<std::time::Duration> for Timestamp
{
	type Output = Timestamp;

	fn add(self, rhs: std::time::Duration) -> Self::Output
	{
		Timestamp(self.0 + rhs)
	}
}

impl ops::Sub<std::time::Duration> for Timestamp
{
	type Output = Timestamp;

	fn sub(self, rhs: std::time::Duration) -> Self::Output
	{
		Timestamp(self.0 - rhs)
	}
}
