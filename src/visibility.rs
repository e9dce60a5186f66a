//! Who gets to see what.
//!
//! Every decision is a pure function of the [`Viewer`], the documents
//! involved and the current time, so the same [`VisibilityPolicy`] can be
//! consulted for every event a session handles.

use crate::{
	contests::Contest,
	problems::Problem,
	records::{FieldDelta, Record},
	time::Timestamp,
	users::{Permission, Permissions, UserId},
};

/// The identity behind a request or session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewer
{
	/// [`None`] for guests.
	pub user_id: Option<UserId>,
	pub permissions: Permissions,
}

impl Viewer
{
	pub const fn guest() -> Self
	{
		Self { user_id: None, permissions: Permissions::none() }
	}

	pub fn user(user_id: UserId, permissions: impl Into<Permissions>) -> Self
	{
		Self { user_id: Some(user_id), permissions: permissions.into() }
	}

	pub fn is_guest(&self) -> bool
	{
		self.user_id.is_none()
	}

	pub fn has_permission(&self, permission: Permission) -> bool
	{
		self.permissions.contains(&permission)
	}
}

#[derive(Debug, Clone, Copy)]
pub struct VisibilityPolicy
{
	viewer: Viewer,
}

impl VisibilityPolicy
{
	pub fn new(viewer: Viewer) -> Self
	{
		Self { viewer }
	}

	pub fn viewer(&self) -> &Viewer
	{
		&self.viewer
	}

	/// Whether records of `contest` may be shown at `now`.
	///
	/// If `allow_override` is set, [`Permission::ViewContestRecords`] lifts
	/// the contest rule's restriction.
	pub fn can_show_record(&self, contest: &Contest, now: Timestamp, allow_override: bool) -> bool
	{
		contest.submissions_visible(now)
			|| (allow_override && self.viewer.has_permission(Permission::ViewContestRecords))
	}

	/// Whether the code of a record owned by `owner_id` may be shown.
	pub fn can_show_code(&self, owner_id: UserId) -> bool
	{
		self.viewer.user_id == Some(owner_id) || self.viewer.has_permission(Permission::ViewCode)
	}

	pub fn can_show_hidden_problem(&self) -> bool
	{
		self.viewer.has_permission(Permission::ViewHiddenProblems)
	}

	pub fn can_show_problem(&self, problem: &Problem) -> bool
	{
		!problem.hidden || self.can_show_hidden_problem()
	}

	/// Returns `record` with everything the viewer may not see removed.
	pub fn redact_record(&self, mut record: Record) -> Record
	{
		if !self.can_show_code(record.owner_id) {
			record.redact_code();
		}

		record
	}

	/// Returns the part of `delta` the viewer may see.
	///
	/// `owner_id` is the owner of the record the delta belongs to.
	pub fn redact_delta(&self, owner_id: UserId, delta: &FieldDelta) -> FieldDelta
	{
		if self.can_show_code(owner_id) { delta.clone() } else { delta.without_code() }
	}
}
