//! Topic-scoped publish/subscribe.
//!
//! Every [`Subscription`] owns a bounded queue. Publishing never waits for a
//! subscriber: if a queue is full the event is dropped for that subscriber
//! only, and queues whose receiving end is gone are pruned on the spot.
//!
//! A subscriber that had events dropped is told so by its next
//! [`Subscription::recv()`] call, which yields [`Lagged`] instead of an event.

use {
	std::{
		collections::HashMap,
		fmt,
		sync::{
			Arc,
			Mutex,
			MutexGuard,
			PoisonError,
			Weak,
			atomic::{self, AtomicU64},
		},
	},
	tokio::sync::mpsc,
};

/// Identifies a single [`Subscription`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// An event as seen by a subscriber.
#[derive(Debug)]
pub struct Envelope<T>
{
	pub topic: Arc<str>,
	pub payload: Arc<T>,
}

/// The subscriber missed events because its queue was full.
///
/// Events that were still queued when this was reported have been discarded
/// as well.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("subscriber fell behind and missed {skipped} events")]
pub struct Lagged
{
	pub skipped: u64,
}

struct Subscriber<T>
{
	tx: mpsc::Sender<Envelope<T>>,
	dropped: Arc<AtomicU64>,
}

type Subscribers<T> = HashMap<SubscriberId, Subscriber<T>>;

/// A process-wide registry of subscriptions.
///
/// Cloning is cheap; all clones share the same registry.
pub struct EventBus<T>
{
	inner: Arc<Inner<T>>,
}

struct Inner<T>
{
	topics: Mutex<HashMap<Arc<str>, Subscribers<T>>>,
	next_id: AtomicU64,
	capacity: usize,
}

/// A live subscription to one or more topics.
///
/// Dropping it unsubscribes from every topic.
#[must_use = "events are only delivered while the subscription is alive"]
pub struct Subscription<T>
{
	id: SubscriberId,
	topics: Box<[Arc<str>]>,
	rx: mpsc::Receiver<Envelope<T>>,
	dropped: Arc<AtomicU64>,
	bus: Weak<Inner<T>>,
}

impl<T> EventBus<T>
{
	/// Creates a new bus whose subscriber queues hold up to `capacity` events.
	pub fn new(capacity: usize) -> Self
	{
		Self {
			inner: Arc::new(Inner {
				topics: Mutex::default(),
				next_id: AtomicU64::new(1),
				capacity: capacity.max(1),
			}),
		}
	}

	/// Registers a new subscriber for every topic in `topics`.
	#[tracing::instrument(level = "debug", skip(self), fields(subscriber.id = tracing::field::Empty))]
	pub fn subscribe(&self, topics: &[&str]) -> Subscription<T>
	{
		let id = SubscriberId(self.inner.next_id.fetch_add(1, atomic::Ordering::Relaxed));
		let (tx, rx) = mpsc::channel(self.inner.capacity);
		let dropped = Arc::new(AtomicU64::new(0));
		let mut table = self.inner.lock();
		let topics = topics
			.iter()
			.map(|&topic| {
				let topic = match table.get_key_value(topic) {
					Some((topic, _)) => Arc::clone(topic),
					None => Arc::<str>::from(topic),
				};

				table
					.entry(Arc::clone(&topic))
					.or_default()
					.insert(id, Subscriber { tx: tx.clone(), dropped: Arc::clone(&dropped) });

				topic
			})
			.collect::<Box<[_]>>();

		tracing::Span::current().record("subscriber.id", id.0);
		tracing::debug!("subscribed");

		Subscription { id, topics, rx, dropped, bus: Arc::downgrade(&self.inner) }
	}

	/// Removes `subscriber_id` from every topic in `topics`.
	///
	/// Returns whether anything was removed. Calling this more than once is
	/// harmless.
	#[tracing::instrument(level = "debug", skip(self, topics))]
	pub fn unsubscribe<S>(&self, topics: &[S], subscriber_id: SubscriberId) -> bool
	where
		S: AsRef<str>,
	{
		self.inner.unsubscribe(topics, subscriber_id)
	}

	/// Hands `payload` to every current subscriber of `topic`.
	///
	/// Returns the number of subscribers the event was queued for.
	#[tracing::instrument(level = "trace", skip(self, payload), ret(level = "trace"))]
	pub fn publish(&self, topic: &str, payload: T) -> usize
	{
		let payload = Arc::new(payload);
		let mut table = self.inner.lock();
		let Some(topic) = table.get_key_value(topic).map(|(topic, _)| Arc::clone(topic)) else {
			tracing::trace!("no subscribers");
			return 0;
		};

		let Some(subscribers) = table.get_mut(&*topic) else {
			return 0;
		};

		let mut delivered = 0_usize;

		subscribers.retain(|&subscriber_id, subscriber| {
			let envelope = Envelope { topic: Arc::clone(&topic), payload: Arc::clone(&payload) };

			match subscriber.tx.try_send(envelope) {
				Ok(()) => {
					delivered += 1;
					true
				},
				Err(mpsc::error::TrySendError::Full(_)) => {
					subscriber.dropped.fetch_add(1, atomic::Ordering::AcqRel);
					tracing::warn!(
						subscriber.id = %subscriber_id,
						"subscriber is lagging behind; dropping event",
					);
					true
				},
				Err(mpsc::error::TrySendError::Closed(_)) => {
					tracing::debug!(subscriber.id = %subscriber_id, "pruning closed subscriber");
					false
				},
			}
		});

		if subscribers.is_empty() {
			table.remove(&*topic);
		}

		delivered
	}

	/// Returns the number of subscribers currently registered for `topic`.
	pub fn subscriber_count(&self, topic: &str) -> usize
	{
		self.inner.lock().get(topic).map_or(0, HashMap::len)
	}

	/// Returns whether `subscriber_id` is registered for any topic.
	pub fn is_subscribed(&self, subscriber_id: SubscriberId) -> bool
	{
		self.inner
			.lock()
			.values()
			.any(|subscribers| subscribers.contains_key(&subscriber_id))
	}
}

impl<T> Inner<T>
{
	fn lock(&self) -> MutexGuard<'_, HashMap<Arc<str>, Subscribers<T>>>
	{
		self.topics.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn unsubscribe<S>(&self, topics: &[S], subscriber_id: SubscriberId) -> bool
	where
		S: AsRef<str>,
	{
		let mut table = self.lock();
		let mut removed = false;

		for topic in topics {
			let topic = topic.as_ref();
			let Some(subscribers) = table.get_mut(topic) else {
				continue;
			};

			removed |= subscribers.remove(&subscriber_id).is_some();

			if subscribers.is_empty() {
				table.remove(topic);
			}
		}

		if removed {
			tracing::debug!(subscriber.id = %subscriber_id, "unsubscribed");
		}

		removed
	}
}

impl<T> Subscription<T>
{
	pub fn id(&self) -> SubscriberId
	{
		self.id
	}

	pub fn topics(&self) -> &[Arc<str>]
	{
		&self.topics
	}

	/// Returns the number of events waiting to be received.
	pub fn pending(&self) -> usize
	{
		self.rx.len()
	}

	/// Waits for the next event.
	///
	/// If events were dropped since the last call, every event still queued
	/// is discarded and [`Lagged`] is returned instead; the caller has to
	/// catch up some other way. Returns [`None`] once the subscription has
	/// been removed from the bus and its queue is drained.
	pub async fn recv(&mut self) -> Option<Result<Envelope<T>, Lagged>>
	{
		if let Some(lagged) = self.take_lag() {
			return Some(Err(lagged));
		}

		self.rx.recv().await.map(Ok)
	}

	fn take_lag(&mut self) -> Option<Lagged>
	{
		let mut skipped = self.dropped.swap(0, atomic::Ordering::AcqRel);

		if skipped == 0 {
			return None;
		}

		while self.rx.try_recv().is_ok() {
			skipped += 1;
		}

		tracing::debug!(subscriber.id = %self.id, skipped, "subscriber lagged");

		Some(Lagged { skipped })
	}

	/// Removes this subscription from the bus.
	///
	/// Already queued events can still be drained with [`recv()`]; no new
	/// ones will arrive. Returns whether the bus still knew about us.
	///
	/// [`recv()`]: Subscription::recv
	pub fn unsubscribe(&mut self) -> bool
	{
		self.bus
			.upgrade()
			.is_some_and(|bus| bus.unsubscribe(&self.topics, self.id))
	}
}

impl<T> Drop for Subscription<T>
{
	fn drop(&mut self)
	{
		self.unsubscribe();
	}
}

impl<T> Clone for EventBus<T>
{
	fn clone(&self) -> Self
	{
		Self { inner: Arc::clone(&self.inner) }
	}
}

impl<T> fmt::Debug for EventBus<T>
{
	fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result
	{
		let table = self.inner.lock();

		fmt.debug_struct("EventBus")
			.field("topics", &table.len())
			.field("capacity", &self.inner.capacity)
			.finish_non_exhaustive()
	}
}

impl<T> fmt::Debug for Subscription<T>
{
	fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result
	{
		fmt.debug_struct("Subscription")
			.field("id", &self.id)
			.field("topics", &self.topics)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[tokio::test]
	async fn delivers_to_every_subscriber_of_a_topic()
	{
		let bus = EventBus::<u32>::new(8);
		let mut a = bus.subscribe(&["scores"]);
		let mut b = bus.subscribe(&["scores", "names"]);
		let mut c = bus.subscribe(&["names"]);

		assert_eq!(bus.publish("scores", 7), 2);
		assert_eq!(bus.publish("nobody-listens", 1), 0);

		assert_eq!(a.recv().await.unwrap().map(|envelope| *envelope.payload), Ok(7));
		assert_eq!(b.recv().await.unwrap().map(|envelope| *envelope.payload), Ok(7));

		assert_eq!(bus.publish("names", 3), 2);
		let envelope = c.recv().await.unwrap().unwrap();
		assert_eq!(&*envelope.topic, "names");
		assert_eq!(*envelope.payload, 3);
	}

	#[tokio::test]
	async fn late_subscribers_miss_earlier_events()
	{
		let bus = EventBus::<u32>::new(8);
		let _early = bus.subscribe(&["scores"]);

		bus.publish("scores", 1);

		let mut late = bus.subscribe(&["scores"]);
		bus.publish("scores", 2);

		assert_eq!(late.recv().await.unwrap().map(|envelope| *envelope.payload), Ok(2));
	}

	#[test]
	fn full_queues_only_affect_their_subscriber()
	{
		let bus = EventBus::<u32>::new(1);
		let slow = bus.subscribe(&["scores"]);
		let mut fast = bus.subscribe(&["scores"]);

		assert_eq!(bus.publish("scores", 1), 2);
		assert_eq!(fast.rx.try_recv().map(|envelope| *envelope.payload).ok(), Some(1));

		assert_eq!(bus.publish("scores", 2), 1);
		assert_eq!(fast.rx.try_recv().map(|envelope| *envelope.payload).ok(), Some(2));

		assert!(bus.is_subscribed(slow.id()));
	}

	#[tokio::test]
	async fn lagging_subscribers_are_told_what_they_missed()
	{
		let bus = EventBus::<u32>::new(1);
		let mut slow = bus.subscribe(&["scores"]);

		assert_eq!(bus.publish("scores", 1), 1);
		assert_eq!(bus.publish("scores", 2), 0);
		assert_eq!(bus.publish("scores", 3), 0);

		assert_eq!(slow.recv().await.unwrap().err(), Some(Lagged { skipped: 3 }));
		assert_eq!(slow.pending(), 0);

		assert_eq!(bus.publish("scores", 4), 1);
		assert_eq!(slow.recv().await.unwrap().map(|envelope| *envelope.payload), Ok(4));
	}

	#[test]
	fn dropping_a_subscription_unsubscribes()
	{
		let bus = EventBus::<u32>::new(4);
		let subscription = bus.subscribe(&["scores", "names"]);
		let id = subscription.id();

		assert!(bus.is_subscribed(id));
		drop(subscription);

		assert!(!bus.is_subscribed(id));
		assert_eq!(bus.subscriber_count("scores"), 0);
		assert_eq!(bus.subscriber_count("names"), 0);
	}

	#[test]
	fn unsubscribe_is_idempotent()
	{
		let bus = EventBus::<u32>::new(4);
		let mut subscription = bus.subscribe(&["scores"]);

		assert!(subscription.unsubscribe());
		assert!(!subscription.unsubscribe());
		assert!(!bus.unsubscribe(&["scores"], subscription.id()));
		assert_eq!(bus.publish("scores", 1), 0);
	}

	#[test]
	fn closed_receivers_are_pruned()
	{
		let bus = EventBus::<u32>::new(4);
		let mut subscription = bus.subscribe(&["scores"]);

		subscription.rx.close();

		assert_eq!(bus.publish("scores", 1), 0);
		assert_eq!(bus.subscriber_count("scores"), 0);
	}
}
