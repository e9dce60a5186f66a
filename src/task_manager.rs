//! Tracking for long-lived session tasks.
//!
//! Every WebSocket session runs on its own task. They are all spawned through
//! a [`TaskManager`] so that shutdown can cancel them together and wait for
//! each of them to release its subscription.

use {
	std::io,
	tokio::task,
	tokio_util::{sync::CancellationToken, task::TaskTracker},
	tracing::Instrument,
};

#[derive(Debug, Default, Clone)]
pub struct TaskManager
{
	#[debug("{}", tasks.len())]
	tasks: TaskTracker,

	#[debug(skip)]
	cancellation_token: CancellationToken,
}

impl TaskManager
{
	pub fn cancellation_token(&self) -> CancellationToken
	{
		self.cancellation_token.child_token()
	}

	/// Returns the number of tasks that are still running.
	pub fn task_count(&self) -> usize
	{
		self.tasks.len()
	}

	/// Spawns a new task.
	///
	/// `make_task` receives a token that is cancelled once [`shutdown()`] is
	/// called.
	///
	/// [`shutdown()`]: TaskManager::shutdown
	pub fn spawn<F>(
		&self,
		span: tracing::Span,
		make_task: impl FnOnce(CancellationToken) -> F,
	) -> io::Result<task::JoinHandle<F::Output>>
	where
		F: IntoFuture,
		F::Output: Send + 'static,
		F::IntoFuture: Send + 'static,
	{
		if self.tasks.is_closed() {
			return Err(io::Error::other("task tracker has been closed"));
		}

		let current_span = tracing::Span::current();

		if !current_span.is_disabled() {
			span.follows_from(current_span);
		}

		let future = make_task(self.cancellation_token.child_token())
			.into_future()
			.instrument(span);

		Ok(self.tasks.spawn(future))
	}

	#[tracing::instrument(level = "debug")]
	pub async fn shutdown(self)
	{
		self.tasks.close();
		tracing::trace!("closed task tracker");

		self.cancellation_token.cancel();
		tracing::trace!("cancelled tasks");

		self.tasks.wait().await;
		tracing::trace!("all tasks have exited");
	}
}
