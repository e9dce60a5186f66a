use {
	super::*,
	crate::{
		contests::{ContestId, ContestRule},
		records::{FieldDelta, Record, RecordId},
		render::Renderer,
		store::{MemoryStore, RecordStore},
		testing::{self, TestClient, fixtures},
		time::Timestamp,
		users::{Permission, Permissions},
		visibility::{Viewer, VisibilityPolicy},
	},
	serde_json::{Value as JsonValue, json},
	std::sync::Arc,
	tokio::task::JoinHandle,
};

const CONFIG: SessionsConfig = SessionsConfig { heartbeat_interval: Duration::from_secs(3600) };

struct World
{
	store: Arc<MemoryStore>,
	bus: RecordBus,
	renderer: Arc<Renderer>,
}

struct Running
{
	client: TestClient,
	handle: JoinHandle<Result<(), SessionError>>,
	cancellation_token: CancellationToken,
}

/// Problem 2 is hidden, contest 10 (ACM) is running and visible, contest
/// 11 (OI) is running and not visible to regular users.
///
/// Records 1 and 2 are plain submissions by users 1 and 2, record 3 belongs
/// to contest 10, record 4 to the hidden problem and record 5 to contest 11.
fn world() -> World
{
	let store = MemoryStore::default();

	store.insert_user(fixtures::user(1, "alice"));
	store.insert_user(fixtures::user(2, "bob"));
	store.insert_problem(fixtures::problem(1, false));
	store.insert_problem(fixtures::problem(2, true));
	store.insert_contest(fixtures::contest(10, ContestRule::Acm));
	store.insert_contest(fixtures::contest(11, ContestRule::Oi));

	store.insert_record(fixtures::record(1).owner(1).build());
	store.insert_record(fixtures::record(2).owner(2).code("int secret() {}").build());
	store.insert_record(fixtures::record(3).contest(10, ContestRule::Acm).build());
	store.insert_record(fixtures::record(4).problem(2).build());
	store.insert_record(fixtures::record(5).contest(11, ContestRule::Oi).build());

	World {
		store: Arc::new(store),
		bus: RecordBus::new(16),
		renderer: Arc::new(Renderer::new().unwrap()),
	}
}

impl World
{
	async fn record(&self, id: u32) -> Record
	{
		self.store
			.get_record(RecordId::new(id).unwrap())
			.await
			.unwrap()
			.unwrap()
	}

	async fn list(&self, viewer: Viewer, contest: Option<u32>) -> ListSession<MemoryStore>
	{
		ListSession::open(
			Arc::clone(&self.store),
			Arc::clone(&self.renderer),
			VisibilityPolicy::new(viewer),
			contest.map(|id| ContestId::new(id).unwrap()),
			Timestamp::now(),
		)
		.await
		.unwrap()
	}

	async fn detail(&self, viewer: Viewer, record_id: u32) -> DetailSession<MemoryStore>
	{
		DetailSession::open(
			Arc::clone(&self.store),
			Arc::clone(&self.renderer),
			VisibilityPolicy::new(viewer),
			RecordId::new(record_id).unwrap(),
			Timestamp::now(),
		)
		.await
		.unwrap()
	}

	fn start<P>(&self, protocol: P) -> Running
	where
		P: Protocol,
	{
		let subscription = self.bus.subscribe(&[RECORD_CHANGE]);
		let (socket, client) = testing::socket_pair();
		let cancellation_token = CancellationToken::new();
		let handle = tokio::spawn({
			let cancellation_token = cancellation_token.clone();

			async move {
				let mut socket = pin!(socket);
				run(socket.as_mut(), subscription, protocol, cancellation_token, CONFIG).await
			}
		});

		Running { client, handle, cancellation_token }
	}

	async fn publish(&self, id: u32, field_delta: Option<FieldDelta>)
	{
		let record = self.record(id).await;
		self.bus.publish_record_change(record, field_delta);
	}
}

/// Extracts the record ID from a rendered list row.
fn row_id(message: &JsonValue) -> u32
{
	let html = message["html"].as_str().expect("not a list row");
	let (_, rest) = html.split_once(r#"data-rid=""#).expect("row without record id");
	let (id, _) = rest.split_once('"').unwrap();

	id.parse().unwrap()
}

#[tokio::test]
async fn closing_a_session_releases_its_subscription()
{
	let world = world();
	let session = world.list(Viewer::guest(), None).await;
	let running = world.start(session);

	assert_eq!(world.bus.subscriber_count(RECORD_CHANGE), 1);

	running.client.close();

	assert!(running.handle.await.unwrap().is_ok());
	assert_eq!(world.bus.subscriber_count(RECORD_CHANGE), 0);
}

#[tokio::test]
async fn failing_sessions_release_their_subscription()
{
	let world = world();
	let session = world.detail(Viewer::guest(), 1).await;
	let mut running = world.start(session);

	running.client.recv_json().await;
	running.client.send_error();

	let code = running.client.recv_close().await.unwrap();
	assert_eq!(u16::from(code), 1011);

	assert!(matches!(running.handle.await.unwrap(), Err(SessionError::Io(_))));
	assert_eq!(world.bus.subscriber_count(RECORD_CHANGE), 0);
}

#[tokio::test]
async fn shutdown_closes_every_session()
{
	let world = world();
	let list = world.list(Viewer::guest(), None).await;
	let detail = world.detail(Viewer::guest(), 1).await;
	let mut sessions = [world.start(list), world.start(detail)];

	assert_eq!(world.bus.subscriber_count(RECORD_CHANGE), 2);

	for running in &sessions {
		running.cancellation_token.cancel();
	}

	for running in &mut sessions {
		let code = running.client.recv_close().await.unwrap();
		assert_eq!(u16::from(code), 1001);
	}

	for running in sessions {
		assert!(running.handle.await.unwrap().is_ok());
	}

	assert_eq!(world.bus.subscriber_count(RECORD_CHANGE), 0);
}

#[tokio::test]
async fn detail_sessions_start_with_a_snapshot()
{
	let world = world();
	let session = world.detail(Viewer::guest(), 1).await;
	let mut running = world.start(session);

	world
		.publish(1, Some(FieldDelta::default().set("status", "JUDGING")))
		.await;

	let first = running.client.recv_json().await;
	assert!(first["status_html"].is_string());
	assert!(first["summary_html"].is_string());

	let second = running.client.recv_json().await;
	assert_eq!(second, json!({ "$set": { "status": "JUDGING" }, "$push": {} }));
}

#[tokio::test]
async fn detail_deltas_arrive_as_a_single_patch()
{
	let world = world();
	let session = world.detail(Viewer::guest(), 2).await;
	let mut running = world.start(session);

	running.client.recv_json().await;

	world.publish(1, None).await;
	world.publish(2, Some(FieldDelta::default().set("status", "AC"))).await;

	let patch = running.client.recv_json().await;
	assert_eq!(patch, json!({ "$set": { "status": "AC" }, "$push": {} }));

	running.client.close();
	assert!(running.handle.await.unwrap().is_ok());

	while let Some(message) = running.client.recv().await {
		assert!(!message.is_text(), "unexpected message after patch: {message:?}");
	}
}

#[tokio::test]
async fn detail_sessions_rerender_without_a_delta()
{
	let world = world();
	let session = world.detail(Viewer::guest(), 1).await;
	let mut running = world.start(session);

	running.client.recv_json().await;

	let mut record = world.record(1).await;
	record.status = crate::records::RecordStatus::Accepted;
	world.bus.publish_record_change(record, None);

	let snapshot = running.client.recv_json().await;
	assert!(snapshot["status_html"].as_str().unwrap().contains("Accepted"));
}

#[tokio::test]
async fn list_sessions_only_see_their_contest()
{
	let world = world();
	let filtered = world.list(Viewer::guest(), Some(10)).await;
	let unfiltered = world.list(Viewer::guest(), None).await;
	let mut filtered = world.start(filtered);
	let mut unfiltered = world.start(unfiltered);

	world.publish(1, None).await;
	world.publish(3, None).await;
	world.publish(2, None).await;

	assert_eq!(row_id(&unfiltered.client.recv_json().await), 1);
	assert_eq!(row_id(&unfiltered.client.recv_json().await), 2);
	assert_eq!(row_id(&filtered.client.recv_json().await), 3);
}

#[tokio::test]
async fn hidden_problems_stay_hidden()
{
	let world = world();
	let guest = world.list(Viewer::guest(), None).await;
	let staff = world
		.list(fixtures::viewer(9, Permission::ViewHiddenProblems), None)
		.await;
	let mut guest = world.start(guest);
	let mut staff = world.start(staff);

	world.publish(4, None).await;
	world.publish(1, None).await;

	assert_eq!(row_id(&guest.client.recv_json().await), 1);
	assert_eq!(row_id(&staff.client.recv_json().await), 4);
	assert_eq!(row_id(&staff.client.recv_json().await), 1);

	guest.client.send_text(r#"{"rids":[4,1]}"#);
	assert_eq!(row_id(&guest.client.recv_json().await), 1);

	let result = DetailSession::open(
		Arc::clone(&world.store),
		Arc::clone(&world.renderer),
		VisibilityPolicy::new(Viewer::guest()),
		RecordId::new(4).unwrap(),
		Timestamp::now(),
	)
	.await;

	assert!(matches!(result, Err(OpenError::NotFound)));
}

#[tokio::test]
async fn code_is_only_shown_to_owners_and_code_readers()
{
	let world = world();
	let stranger = world.detail(fixtures::viewer(3, Permissions::none()), 2).await;
	let owner = world.detail(fixtures::viewer(2, Permissions::none()), 2).await;
	let reader = world.detail(fixtures::viewer(4, Permission::ViewCode), 2).await;
	let mut stranger = world.start(stranger);
	let mut owner = world.start(owner);
	let mut reader = world.start(reader);

	let snapshot = stranger.client.recv_json().await;
	assert!(!snapshot["summary_html"].as_str().unwrap().contains("int secret"));
	assert!(!snapshot["status_html"].as_str().unwrap().contains("main.cpp"));

	for running in [&mut owner, &mut reader] {
		let snapshot = running.client.recv_json().await;
		assert!(snapshot["summary_html"].as_str().unwrap().contains("int secret"));
	}

	world
		.publish(
			2,
			Some(
				FieldDelta::default()
					.set("code", "int leaked() {}")
					.push("compiler_texts", "warning: unused")
					.set("score", 100),
			),
		)
		.await;

	let patch = stranger.client.recv_json().await;
	assert_eq!(patch, json!({ "$set": { "score": 100 }, "$push": {} }));

	let patch = owner.client.recv_json().await;
	assert_eq!(patch["$set"]["code"], "int leaked() {}");
	assert_eq!(patch["$push"]["compiler_texts"], "warning: unused");
}

#[tokio::test]
async fn resync_follows_request_order()
{
	let world = world();
	let session = world.list(Viewer::guest(), None).await;
	let mut running = world.start(session);

	running.client.send_text(r#"{"rids":5}"#);
	running.client.send_text("not even json");
	running.client.send_text(r#"{"rids":[2,999,3,1]}"#);

	assert_eq!(row_id(&running.client.recv_json().await), 2);
	assert_eq!(row_id(&running.client.recv_json().await), 1);
}

#[tokio::test]
async fn opening_checks_contests()
{
	let world = world();
	let open_list = |viewer, contest_id| {
		ListSession::open(
			Arc::clone(&world.store),
			Arc::clone(&world.renderer),
			VisibilityPolicy::new(viewer),
			ContestId::new(contest_id),
			Timestamp::now(),
		)
	};

	assert!(matches!(open_list(Viewer::guest(), 99).await, Err(OpenError::NotFound)));
	assert!(matches!(open_list(Viewer::guest(), 11).await, Err(OpenError::Forbidden)));
	assert!(open_list(Viewer::guest(), 10).await.is_ok());
	assert!(
		open_list(fixtures::viewer(9, Permission::ViewContestRecords), 11)
			.await
			.is_ok()
	);

	let open_detail = |viewer, record_id| {
		DetailSession::open(
			Arc::clone(&world.store),
			Arc::clone(&world.renderer),
			VisibilityPolicy::new(viewer),
			RecordId::new(record_id).unwrap(),
			Timestamp::now(),
		)
	};

	assert!(matches!(open_detail(Viewer::guest(), 404).await, Err(OpenError::NotFound)));
	assert!(matches!(open_detail(Viewer::guest(), 5).await, Err(OpenError::Forbidden)));
	assert!(
		open_detail(fixtures::viewer(1, Permissions::none()), 5)
			.await
			.is_ok()
	);

	assert_eq!(world.bus.subscriber_count(RECORD_CHANGE), 0);
}

#[tokio::test]
async fn lagging_detail_sessions_get_a_fresh_snapshot()
{
	let world = World { bus: RecordBus::new(1), ..world() };
	let session = world.detail(Viewer::guest(), 1).await;
	let mut running = world.start(session);

	running.client.recv_json().await;

	for text in ["case #1", "case #2"] {
		let delta = FieldDelta::default().push("judge_texts", text);

		crate::judge::report(&*world.store, &world.bus, RecordId::new(1).unwrap(), delta, false)
			.await
			.unwrap();
	}

	let snapshot = loop {
		let message = running.client.recv_json().await;

		if message.get("status_html").is_some() {
			break message;
		}

		assert_eq!(message, json!({ "$set": {}, "$push": { "judge_texts": "case #1" } }));
	};

	let status_html = snapshot["status_html"].as_str().unwrap();
	assert!(status_html.contains("case #1"));
	assert!(status_html.contains("case #2"));

	running.client.close();
	assert!(running.handle.await.unwrap().is_ok());
	assert_eq!(world.bus.subscriber_count(RECORD_CHANGE), 0);
}

#[tokio::test]
async fn lagging_list_sessions_are_asked_to_reconnect()
{
	let world = World { bus: RecordBus::new(1), ..world() };
	let session = world.list(Viewer::guest(), None).await;
	let mut running = world.start(session);

	world.publish(1, None).await;
	world.publish(2, None).await;

	let code = running.client.recv_close().await.unwrap();
	assert_eq!(u16::from(code), 1013);

	assert!(running.handle.await.unwrap().is_ok());
	assert_eq!(world.bus.subscriber_count(RECORD_CHANGE), 0);
}

#[tokio::test]
async fn sessions_without_a_socket_release_their_subscription()
{
	let world = world();
	let tasks = TaskManager::default();
	let session = world.detail(Viewer::guest(), 1).await;
	let socket_tx = start(&world.bus, &tasks, CONFIG, session, tracing::Span::none()).unwrap();

	assert_eq!(world.bus.subscriber_count(RECORD_CHANGE), 1);
	assert_eq!(tasks.task_count(), 1);

	drop(socket_tx);
	tasks.clone().shutdown().await;

	assert_eq!(world.bus.subscriber_count(RECORD_CHANGE), 0);
	assert_eq!(tasks.task_count(), 0);

	let session = world.list(Viewer::guest(), None).await;
	assert!(start(&world.bus, &tasks, CONFIG, session, tracing::Span::none()).is_err());
	assert_eq!(world.bus.subscriber_count(RECORD_CHANGE), 0);
}
