use {
	std::{fmt, ops},
	zerocopy::{Immutable, IntoBytes, KnownLayout, TryFromBytes, try_transmute_ref},
};

const VIEW_CODE: u64 = 1_u64 << 0;
const VIEW_HIDDEN_PROBLEMS: u64 = 1_u64 << 1;
const VIEW_CONTEST_RECORDS: u64 = 1_u64 << 2;

const REJUDGE: u64 = 1_u64 << 8;

const JUDGE: u64 = 1_u64 << 16;

const ALL: u64 = VIEW_CODE | VIEW_HIDDEN_PROBLEMS | VIEW_CONTEST_RECORDS | REJUDGE | JUDGE;

#[repr(u64)]
#[non_exhaustive]
#[derive(
	Debug,
	Display,
	Clone,
	Copy,
	PartialEq,
	Eq,
	Hash,
	TryFromBytes,
	IntoBytes,
	Immutable,
	KnownLayout,
)]
pub enum Permission
{
	/// The user may read the source code and compiler output of records they
	/// do not own.
	ViewCode = VIEW_CODE,

	/// The user may see records that belong to hidden problems.
	ViewHiddenProblems = VIEW_HIDDEN_PROBLEMS,

	/// The user may see contest records regardless of the contest's rule.
	ViewContestRecords = VIEW_CONTEST_RECORDS,

	/// The user may reset records and send them back to the judge.
	Rejudge = REJUDGE,

	/// The user is a judge and may report judging progress.
	Judge = JUDGE,
}

/// A set of [`Permission`]s
#[repr(transparent)]
#[derive(
	Default,
	Clone,
	Copy,
	PartialEq,
	Eq,
	Hash,
	TryFromBytes,
	IntoBytes,
	Immutable,
	KnownLayout,
)]
pub struct Permissions(u64);

/// An [`Iterator`] over [`Permission`]s
#[derive(Debug, Clone)]
pub struct Iter
{
	bits: u64,
}

impl Permissions
{
	pub const fn none() -> Self
	{
		Self(0)
	}

	/// Creates a set from raw bits, ignoring any bit that does not belong to
	/// a known [`Permission`].
	pub const fn from_bits_truncate(bits: u64) -> Self
	{
		Self(bits & ALL)
	}

	/// Checks if `other` is a subset of `self`.
	pub fn contains<P>(&self, other: &P) -> bool
	where
		P: ?Sized + AsRef<Permissions>,
	{
		let other = other.as_ref();
		(self.0 & other.0) == other.0
	}

	/// Returns an [`Iterator`] over the [`Permission`]s stored in `self`.
	pub fn iter(&self) -> Iter
	{
		Iter { bits: self.0 }
	}
}

impl AsRef<Permissions> for Permission
{
	fn as_ref(&self) -> &Permissions
	{
		try_transmute_ref!(self).unwrap_or_else(|err| {
			panic!("conversions from `Permission` to `Permissions` should always succeed\n{err}");
		})
	}
}

impl AsRef<Permissions> for Permissions
{
	fn as_ref(&self) -> &Permissions
	{
		self
	}
}

impl ops::BitOr for Permission
{
	type Output = Permissions;

	fn bitor(self, rhs: Permission) -> Self::Output
	{
		Permissions((self as u64) | (rhs as u64))
	}
}

impl ops::BitOr<Permission> for Permissions
{
	type Output = Permissions;

	fn bitor(self, rhs: Permission) -> Self::Output
	{
		Permissions((self.0) | (rhs as u64))
	}
}

impl fmt::Debug for Permissions
{
	fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result
	{
		fmt.debug_set().entries(self).finish()
	}
}

impl From<Permission> for Permissions
{
	fn from(permission: Permission) -> Self
	{
		Self(permission as u64)
	}
}

impl IntoIterator for &Permissions
{
	type Item = Permission;
	type IntoIter = Iter;

	fn into_iter(self) -> Self::IntoIter
	{
		self.iter()
	}
}

impl Iterator for Iter
{
	type Item = Permission;

	fn next(&mut self) -> Option<Self::Item>
	{
		if self.bits == 0 {
			return None;
		}

		let next_bit = 1_u64 << self.bits.trailing_zeros();
		self.bits &= !next_bit;

		Permission::try_read_from_bytes(next_bit.as_bytes())
			.map_or_else(|err| panic!("invalid permission bit in `Permissions`\n{err}"), Some)
	}

	fn size_hint(&self) -> (usize, Option<usize>)
	{
		let count = self.bits.count_ones() as usize;
		(count, Some(count))
	}
}

impl ExactSizeIterator for Iter
{
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn contains_checks_every_bit()
	{
		let permissions = Permission::ViewCode | Permission::Rejudge;

		assert!(permissions.contains(&Permission::ViewCode));
		assert!(permissions.contains(&Permission::Rejudge));
		assert!(!permissions.contains(&Permission::Judge));
		assert!(!permissions.contains(&(Permission::Rejudge | Permission::Judge)));
	}

	#[test]
	fn unknown_bits_are_dropped()
	{
		let permissions = Permissions::from_bits_truncate(u64::MAX);

		assert_eq!(permissions.iter().len(), 5);
		assert!(permissions.contains(&(Permission::ViewCode | Permission::Judge)));
		assert_eq!(Permissions::from_bits_truncate(1 << 40), Permissions::none());
	}

	#[test]
	fn debug_lists_each_permission()
	{
		let permissions = Permission::ViewHiddenProblems | Permission::Judge;

		assert_eq!(format!("{permissions:?}"), "{ViewHiddenProblems, Judge}");
		assert_eq!(format!("{:?}", Permissions::none()), "{}");
	}
}
