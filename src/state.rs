use {
	crate::{TaskManager, events::RecordBus, render::Renderer, sessions::SessionsConfig},
	std::sync::Arc,
};

/// Everything HTTP handlers and sessions share.
#[derive(Debug)]
pub struct AppState<S>
{
	#[debug(skip)]
	pub(crate) store: Arc<S>,
	pub(crate) bus: RecordBus,

	#[debug(skip)]
	pub(crate) renderer: Arc<Renderer>,
	pub(crate) tasks: TaskManager,
	pub(crate) sessions: SessionsConfig,
}

impl<S> AppState<S>
{
	pub fn new(
		store: S,
		bus: RecordBus,
		renderer: Renderer,
		tasks: TaskManager,
		sessions: SessionsConfig,
	) -> Self
	{
		Self {
			store: Arc::new(store),
			bus,
			renderer: Arc::new(renderer),
			tasks,
			sessions,
		}
	}
}

impl<S> Clone for AppState<S>
{
	fn clone(&self) -> Self
	{
		Self {
			store: Arc::clone(&self.store),
			bus: self.bus.clone(),
			renderer: Arc::clone(&self.renderer),
			tasks: self.tasks.clone(),
			sessions: self.sessions,
		}
	}
}
