use std::error::Error;

/// Extension trait for <code>[Result]\<T, E></code>
pub trait ResultExt: Sized
{
	type Ok;
	type Err;

	/// [`Result::inspect_err()`] but with the error cast to
	/// <code>[&][]dyn [Error]</code>
	fn inspect_err_dyn(self, inspect: impl FnOnce(&(dyn Error + 'static))) -> Self
	where
		Self::Err: Error + 'static;

	/// Logs the error at `WARN` level and turns it into [`None`].
	///
	/// Used wherever a failure only affects a single update and should not
	/// tear down the surrounding task.
	fn ok_or_warn(self, message: &'static str) -> Option<Self::Ok>
	where
		Self::Err: Error + 'static;
}

impl<T, E> ResultExt for Result<T, E>
{
	type Ok = T;
	type Err = E;

	fn inspect_err_dyn(self, inspect: impl FnOnce(&(dyn Error + 'static))) -> Self
	where
		<Self as ResultExt>::Err: Error + 'static,
	{
		self.inspect_err(move |err| inspect(err as &(dyn Error + 'static)))
	}

	#[track_caller]
	fn ok_or_warn(self, message: &'static str) -> Option<T>
	where
		<Self as ResultExt>::Err: Error + 'static,
	{
		let location = std::panic::Location::caller();

		self.inspect_err_dyn(|error| tracing::warn!(loc = %location, error, "{message}"))
			.ok()
	}
}
