//! Helper macro for creating "ID" types.

/// Creates a new "ID" type backed by a non-zero `u32`.
macro_rules! make_id {
	($(#[$meta:meta])* $name:ident) => {
		$(#[$meta])*
		#[repr(transparent)]
		#[derive(
			Debug,
			Clone,
			Copy,
			PartialEq,
			Eq,
			PartialOrd,
			Ord,
			Hash,
			serde::Serialize,
			serde::Deserialize,
		)]
		#[serde(transparent)]
		pub struct $name(std::num::NonZero<u32>);

		impl $name
		{
			pub const fn new(value: u32) -> Option<Self>
			{
				match std::num::NonZero::new(value) {
					Some(value) => Some(Self(value)),
					None => None,
				}
			}

			pub const fn get(self) -> u32
			{
				self.0.get()
			}
		}

		impl std::fmt::Display for $name
		{
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
			{
				std::fmt::Display::fmt(&self.0, f)
			}
		}

		impl From<std::num::NonZero<u32>> for $name
		{
			fn from(value: std::num::NonZero<u32>) -> Self
			{
				Self(value)
			}
		}

		impl From<$name> for u32
		{
			fn from(value: $name) -> Self
			{
				value.0.get()
			}
		}

		impl std::str::FromStr for $name
		{
			type Err = std::num::ParseIntError;

			fn from_str(s: &str) -> std::result::Result<Self, Self::Err>
			{
				s.parse::<std::num::NonZero<u32>>().map(Self)
			}
		}
	};
}
