use serde::{Deserialize, Serialize};

make_id! {
	/// A problem's ID.
	ProblemId
}

/// A problem records are submitted against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem
{
	pub id: ProblemId,
	pub title: Box<str>,

	/// Hidden problems (and every record that references them) are only
	/// visible to users with [`Permission::ViewHiddenProblems`].
	///
	/// [`Permission::ViewHiddenProblems`]: crate::users::Permission::ViewHiddenProblems
	pub hidden: bool,
}
