use {
	serde::{Deserialize, Serialize},
	std::{
		num::{NonZero, ParseIntError},
		str::FromStr,
	},
};

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
#[serde(transparent)]
pub struct RecordId(NonZero<u32>);

#[derive(Debug, Display, From, Error)]
#[display("invalid record ID: {_0}")]
pub struct ParseRecordIdError(ParseIntError);

impl RecordId
{
	pub const fn new(value: u32) -> Option<Self>
	{
		match NonZero::new(value) {
			Some(value) => Some(Self(value)),
			None => None,
		}
	}

	pub const fn get(self) -> u32
	{
		self.0.get()
	}
}

impl FromStr for RecordId
{
	type Err = ParseRecordIdError;

	fn from_str(value: &str) -> Result<Self, Self::Err>
	{
		value.parse::<NonZero<u32>>().map(Self).map_err(ParseRecordIdError)
	}
}
