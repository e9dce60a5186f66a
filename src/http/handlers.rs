use {
	crate::{
		AppState,
		contests::ContestId,
		http::{
			auth,
			pagination::{Page, PaginationResponse},
			response::{HandlerError, HandlerResult},
		},
		judge,
		problems::{Problem, ProblemId},
		records::{FieldDelta, Record, RecordId, RecordStatus},
		sessions::{self, DetailSession, ListSession},
		store::{Backend, RecordQuery},
		time::Timestamp,
		users::{Permission, User, UserId, UserIdentifier},
		visibility::{Viewer, VisibilityPolicy},
	},
	axum::{
		Json,
		extract::{Path, Query, State},
		response::{IntoResponse, NoContent, Response},
	},
	axum_tws::{WebSocketError, WebSocketUpgrade},
	serde::{Deserialize, Serialize},
	std::{
		collections::{BTreeSet, HashMap},
		sync::Arc,
	},
};

//=================================================================================================
// `/records`

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GetRecordsQuery
{
	#[serde(default)]
	page: Page,
	problem: Option<ProblemId>,
	contest: Option<ContestId>,
	user: Option<UserIdentifier>,
}

/// A row of the record list.
#[derive(Debug, Serialize)]
pub(crate) struct RecordSummary
{
	id: RecordId,
	status: RecordStatus,
	score: u32,
	time_ms: u32,
	memory_kb: u32,
	lang: Box<str>,
	contest_id: Option<ContestId>,
	owner: Option<User>,
	problem: Option<Problem>,
	submitted_at: Timestamp,
}

impl RecordSummary
{
	fn new(
		record: Record,
		users: &HashMap<UserId, User>,
		problems: &HashMap<ProblemId, Problem>,
	) -> Self
	{
		Self {
			id: record.id,
			status: record.status,
			score: record.score,
			time_ms: record.time_ms,
			memory_kb: record.memory_kb,
			contest_id: record.contest_id(),
			owner: users.get(&record.owner_id).cloned(),
			problem: problems.get(&record.problem_id).cloned(),
			lang: record.lang,
			submitted_at: record.submitted_at,
		}
	}
}

#[tracing::instrument(skip(state), ret(level = "debug"))]
pub(crate) async fn get_records<S>(
	State(state): State<AppState<S>>,
	viewer: Viewer,
	Query(query): Query<GetRecordsQuery>,
) -> HandlerResult<Json<PaginationResponse<RecordSummary>>>
where
	S: Backend,
{
	let policy = VisibilityPolicy::new(viewer);

	if let Some(contest_id) = query.contest {
		sessions::authorize_contest(&*state.store, &policy, contest_id, Timestamp::now()).await?;
	}

	let owner_id = match query.user {
		None => None,
		Some(UserIdentifier::Id(user_id)) => Some(user_id),
		Some(UserIdentifier::Name(ref name)) => match state.store.find_user_by_name(name).await? {
			Some(user) => Some(user.id),
			None => {
				tracing::debug!(%name, "no user with that name");
				return Ok(Json(PaginationResponse::new(0)));
			},
		},
	};

	let record_query = RecordQuery::builder()
		.maybe_problem(query.problem)
		.maybe_contest(query.contest)
		.maybe_owner(owner_id)
		.include_hidden_problems(policy.can_show_hidden_problem())
		.page(query.page.value())
		.build();

	let page = state.store.list_records(&record_query).await?;

	let owner_ids = page
		.records
		.iter()
		.map(|record| record.owner_id)
		.collect::<BTreeSet<_>>()
		.into_iter()
		.collect::<Vec<_>>();

	let problem_ids = page
		.records
		.iter()
		.map(|record| record.problem_id)
		.collect::<BTreeSet<_>>()
		.into_iter()
		.collect::<Vec<_>>();

	let (users, problems) =
		tokio::try_join!(state.store.get_users(&owner_ids), state.store.get_problems(&problem_ids))?;

	let users = users.into_iter().map(|user| (user.id, user)).collect::<HashMap<_, _>>();
	let problems = problems
		.into_iter()
		.map(|problem| (problem.id, problem))
		.collect::<HashMap<_, _>>();

	let mut response = PaginationResponse::new(page.total);
	response.extend(
		page.records
			.into_iter()
			.map(|record| RecordSummary::new(record, &users, &problems)),
	);

	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RecordsWsQuery
{
	contest: Option<ContestId>,
}

/// Upgrades to a record list session.
///
/// Authorization errors take precedence over a malformed upgrade request.
#[tracing::instrument(skip(state, upgrade))]
pub(crate) async fn records_ws<S>(
	State(state): State<AppState<S>>,
	viewer: Viewer,
	Query(RecordsWsQuery { contest }): Query<RecordsWsQuery>,
	upgrade: Result<WebSocketUpgrade, WebSocketError>,
) -> HandlerResult<Response>
where
	S: Backend,
{
	let session = ListSession::open(
		Arc::clone(&state.store),
		Arc::clone(&state.renderer),
		VisibilityPolicy::new(viewer),
		contest,
		Timestamp::now(),
	)
	.await?;

	let upgrade = match upgrade {
		Ok(upgrade) => upgrade,
		Err(rejection) => return Ok(rejection.into_response()),
	};

	let span = tracing::info_span!("list_session", contest.id = contest.map(ContestId::get));

	sessions::spawn(upgrade, &state.bus, &state.tasks, state.sessions, session, span)
		.map_err(|_| HandlerError::ShuttingDown)
}

//=================================================================================================
// `/records/{record_id}`

#[derive(Debug, Serialize)]
pub(crate) struct RecordDetail
{
	record: Record,
	owner: Option<User>,
	problem: Option<Problem>,
}

#[tracing::instrument(skip(state), ret(level = "debug"))]
pub(crate) async fn get_record<S>(
	State(state): State<AppState<S>>,
	viewer: Viewer,
	Path(record_id): Path<RecordId>,
) -> HandlerResult<Json<RecordDetail>>
where
	S: Backend,
{
	let policy = VisibilityPolicy::new(viewer);
	let (record, problem) =
		sessions::authorize_record(&*state.store, &policy, record_id, Timestamp::now()).await?;

	let owner = state.store.get_user(record.owner_id).await?;

	Ok(Json(RecordDetail { record: policy.redact_record(record), owner, problem }))
}

/// Upgrades to a record detail session.
#[tracing::instrument(skip(state, upgrade))]
pub(crate) async fn record_ws<S>(
	State(state): State<AppState<S>>,
	viewer: Viewer,
	Path(record_id): Path<RecordId>,
	upgrade: Result<WebSocketUpgrade, WebSocketError>,
) -> HandlerResult<Response>
where
	S: Backend,
{
	let session = DetailSession::open(
		Arc::clone(&state.store),
		Arc::clone(&state.renderer),
		VisibilityPolicy::new(viewer),
		record_id,
		Timestamp::now(),
	)
	.await?;

	let upgrade = match upgrade {
		Ok(upgrade) => upgrade,
		Err(rejection) => return Ok(rejection.into_response()),
	};

	let span = tracing::info_span!("detail_session", record.id = %record_id);

	sessions::spawn(upgrade, &state.bus, &state.tasks, state.sessions, session, span)
		.map_err(|_| HandlerError::ShuttingDown)
}

/// Resets a record and queues it for judging.
///
/// Rejudging a record that does not exist succeeds without doing anything.
#[tracing::instrument(skip(state), ret(level = "debug"))]
pub(crate) async fn rejudge<S>(
	State(state): State<AppState<S>>,
	viewer: Viewer,
	Path(record_id): Path<RecordId>,
) -> HandlerResult<NoContent>
where
	S: Backend,
{
	auth::require_permission(&viewer, Permission::Rejudge)?;
	judge::rejudge(&*state.store, record_id).await?;

	Ok(NoContent)
}

//=================================================================================================
// `/judge`

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ReportQuery
{
	/// Judging has finished; viewers should re-render instead of patching.
	#[serde(rename = "final")]
	is_final: bool,
}

/// Applies judging progress to a record and publishes the change.
#[tracing::instrument(skip(state, delta), ret(level = "debug"))]
pub(crate) async fn report<S>(
	State(state): State<AppState<S>>,
	viewer: Viewer,
	Path(record_id): Path<RecordId>,
	Query(ReportQuery { is_final }): Query<ReportQuery>,
	Json(delta): Json<FieldDelta>,
) -> HandlerResult<Json<Record>>
where
	S: Backend,
{
	auth::require_permission(&viewer, Permission::Judge)?;

	let record = judge::report(&*state.store, &state.bus, record_id, delta, is_final).await?;

	Ok(Json(record))
}
