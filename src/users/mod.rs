use {
	serde::{Deserialize, Deserializer, Serialize},
	std::{convert::Infallible, str::FromStr},
};

pub use self::permissions::{Permission, Permissions};

mod permissions;

make_id! {
	/// A user's ID.
	UserId
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User
{
	pub id: UserId,
	pub name: Box<str>,
}

/// Something that identifies a user: either their ID or their name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdentifier
{
	Id(UserId),
	Name(Box<str>),
}

impl FromStr for UserIdentifier
{
	type Err = Infallible;

	fn from_str(value: &str) -> Result<Self, Self::Err>
	{
		Ok(value
			.parse::<UserId>()
			.map_or_else(|_| Self::Name(value.into()), Self::Id))
	}
}

impl<'de> Deserialize<'de> for UserIdentifier
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let value = <Box<str> as Deserialize<'de>>::deserialize(deserializer)?;
		let Ok(identifier) = value.parse::<Self>();

		Ok(identifier)
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn numeric_identifiers_are_ids()
	{
		assert_eq!("7".parse::<UserIdentifier>(), Ok(UserIdentifier::Id(UserId::new(7).unwrap())));
		assert_eq!("0".parse::<UserIdentifier>(), Ok(UserIdentifier::Name("0".into())));
		assert_eq!("alice".parse::<UserIdentifier>(), Ok(UserIdentifier::Name("alice".into())));
	}
}
