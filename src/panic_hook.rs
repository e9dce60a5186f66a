use std::{
	backtrace::{Backtrace, BacktraceStatus},
	panic,
};

/// Logs every panic before handing it to the previous hook.
pub(crate) fn install()
{
	let old_hook = panic::take_hook();

	panic::set_hook(Box::new(move |panic_info| {
		let location = panic_info.location();
		let payload = panic_info
			.payload()
			.downcast_ref::<&str>()
			.copied()
			.or_else(|| panic_info.payload().downcast_ref::<String>().map(String::as_str))
			.unwrap_or("<unknown>");

		let backtrace = Backtrace::capture();

		if backtrace.status() == BacktraceStatus::Captured {
			tracing::error!(
				target: "oj_api::panics",
				location = location.map(tracing::field::display),
				%backtrace,
				"thread panicked: {payload}",
			);
		} else {
			tracing::error!(
				target: "oj_api::panics",
				location = location.map(tracing::field::display),
				"thread panicked: {payload}",
			);
		}

		old_hook(panic_info);
	}));
}
