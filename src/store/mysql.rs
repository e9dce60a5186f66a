use {
	super::{JudgeQueue, RecordPage, RecordQuery, RecordStore, StoreResult},
	crate::{
		contests::{Contest, ContestId, ContestRule},
		database::{Database, DatabaseError},
		problems::{Problem, ProblemId},
		records::{FieldDelta, Record, RecordId},
		time::Timestamp,
		users::{Permissions, User, UserId},
		visibility::Viewer,
	},
	sqlx::{MySql, MySqlConnection, QueryBuilder, types::Json},
};

/// A [`RecordStore`] backed by MySQL.
///
/// Records are stored as JSON documents next to the columns we filter on.
#[derive(Debug, Clone)]
pub struct MySqlStore
{
	database: Database,
}

type UserRow = (u32, String);
type ProblemRow = (u32, String, bool);
type ContestRow = (u32, String, String, time::OffsetDateTime, time::OffsetDateTime);

impl MySqlStore
{
	pub fn new(database: Database) -> Self
	{
		Self { database }
	}

	fn decode_id<T>(column: &str, value: u32, make_id: fn(u32) -> Option<T>) -> StoreResult<T>
	{
		make_id(value).ok_or_else(|| {
			DatabaseError::decode_column(column, format!("`{column}` must not be 0")).into()
		})
	}

	fn decode_user((id, name): UserRow) -> StoreResult<User>
	{
		Ok(User { id: Self::decode_id("id", id, UserId::new)?, name: name.into() })
	}

	fn decode_problem((id, title, hidden): ProblemRow) -> StoreResult<Problem>
	{
		Ok(Problem { id: Self::decode_id("id", id, ProblemId::new)?, title: title.into(), hidden })
	}

	fn decode_contest((id, title, rule, begins_at, ends_at): ContestRow) -> StoreResult<Contest>
	{
		Ok(Contest {
			id: Self::decode_id("id", id, ContestId::new)?,
			title: title.into(),
			rule: rule
				.parse::<ContestRule>()
				.map_err(|err| DatabaseError::decode_column("rule", err))?,
			begins_at: Timestamp::from(begins_at),
			ends_at: Timestamp::from(ends_at),
		})
	}

	/// Appends the `WHERE` clause shared by the count and the page query.
	fn push_filters(query: &mut QueryBuilder<'_, MySql>, filters: &RecordQuery)
	{
		query.push(" FROM Records r JOIN Problems p ON p.id = r.problem_id WHERE r.hidden = FALSE");

		if let Some(problem_id) = filters.problem {
			query.push(" AND r.problem_id = ").push_bind(problem_id.get());
		}

		if let Some(owner_id) = filters.owner {
			query.push(" AND r.owner_id = ").push_bind(owner_id.get());
		}

		match filters.contest {
			Some(contest_id) => {
				query.push(" AND r.contest_id = ").push_bind(contest_id.get());
			},
			None => {
				query.push(" AND r.contest_id IS NULL");
			},
		}

		if !filters.include_hidden_problems {
			query.push(" AND p.hidden = FALSE");
		}
	}

	/// Loads a record for modification and locks its row until the
	/// surrounding transaction ends.
	async fn lock_record(conn: &mut MySqlConnection, id: RecordId) -> StoreResult<Option<Record>>
	{
		sqlx::query_scalar::<_, Json<Record>>(
			"SELECT document FROM Records WHERE id = ? FOR UPDATE",
		)
		.bind(id.get())
		.fetch_optional(conn)
		.await
		.map(|record| record.map(|Json(record)| record))
		.map_err(|err| DatabaseError::from(err).into())
	}

	/// Writes `record` back, together with the columns derived from it.
	async fn write_record(conn: &mut MySqlConnection, record: &Record) -> StoreResult<()>
	{
		sqlx::query(
			"UPDATE Records
			 SET document = ?,
			     owner_id = ?,
			     problem_id = ?,
			     contest_id = ?,
			     hidden = ?
			 WHERE id = ?",
		)
		.bind(Json(record))
		.bind(record.owner_id.get())
		.bind(record.problem_id.get())
		.bind(record.contest_id().map(ContestId::get))
		.bind(record.hidden)
		.bind(record.id.get())
		.execute(conn)
		.await
		.map_err(DatabaseError::from)?;

		Ok(())
	}
}

impl RecordStore for MySqlStore
{
	#[tracing::instrument(level = "debug", skip(self), err)]
	async fn get_record(&self, id: RecordId) -> StoreResult<Option<Record>>
	{
		let mut conn = self.database.get_connection().await?;

		sqlx::query_scalar::<_, Json<Record>>("SELECT document FROM Records WHERE id = ?")
			.bind(id.get())
			.fetch_optional(&mut *conn)
			.await
			.map(|record| record.map(|Json(record)| record))
			.map_err(|err| DatabaseError::from(err).into())
	}

	#[tracing::instrument(level = "debug", skip(self), err)]
	async fn get_records(&self, ids: &[RecordId]) -> StoreResult<Vec<Record>>
	{
		if ids.is_empty() {
			return Ok(Vec::new());
		}

		let mut conn = self.database.get_connection().await?;
		let mut query = QueryBuilder::<MySql>::new("SELECT document FROM Records WHERE id IN (");
		let mut separated = query.separated(", ");

		for id in ids {
			separated.push_bind(id.get());
		}

		query.push(")");

		let records = query
			.build_query_scalar::<Json<Record>>()
			.fetch_all(&mut *conn)
			.await
			.map_err(DatabaseError::from)?;

		Ok(records.into_iter().map(|Json(record)| record).collect())
	}

	#[tracing::instrument(level = "debug", skip(self), err)]
	async fn list_records(&self, filters: &RecordQuery) -> StoreResult<RecordPage>
	{
		let mut conn = self.database.get_connection().await?;

		let mut query = QueryBuilder::<MySql>::new("SELECT COUNT(*)");
		Self::push_filters(&mut query, filters);

		let total = query
			.build_query_scalar::<i64>()
			.fetch_one(&mut *conn)
			.await
			.map_err(DatabaseError::from)?;

		let total =
			u64::try_from(total).map_err(|err| DatabaseError::decode_column("count", err))?;

		let mut query = QueryBuilder::<MySql>::new("SELECT r.document");
		Self::push_filters(&mut query, filters);
		query.push(" ORDER BY r.id DESC LIMIT ").push_bind(filters.limit);
		query.push(" OFFSET ").push_bind(filters.offset());

		let records = query
			.build_query_scalar::<Json<Record>>()
			.fetch_all(&mut *conn)
			.await
			.map_err(DatabaseError::from)?
			.into_iter()
			.map(|Json(record)| record)
			.collect();

		Ok(RecordPage { records, total })
	}

	#[tracing::instrument(level = "debug", skip(self), err)]
	async fn get_user(&self, id: UserId) -> StoreResult<Option<User>>
	{
		let mut conn = self.database.get_connection().await?;

		sqlx::query_as::<_, UserRow>("SELECT id, name FROM Users WHERE id = ?")
			.bind(id.get())
			.fetch_optional(&mut *conn)
			.await
			.map_err(DatabaseError::from)?
			.map(Self::decode_user)
			.transpose()
	}

	#[tracing::instrument(level = "debug", skip(self), err)]
	async fn get_users(&self, ids: &[UserId]) -> StoreResult<Vec<User>>
	{
		if ids.is_empty() {
			return Ok(Vec::new());
		}

		let mut conn = self.database.get_connection().await?;
		let mut query = QueryBuilder::<MySql>::new("SELECT id, name FROM Users WHERE id IN (");
		let mut separated = query.separated(", ");

		for id in ids {
			separated.push_bind(id.get());
		}

		query.push(")");

		query
			.build_query_as::<UserRow>()
			.fetch_all(&mut *conn)
			.await
			.map_err(DatabaseError::from)?
			.into_iter()
			.map(Self::decode_user)
			.collect()
	}

	#[tracing::instrument(level = "debug", skip(self), err)]
	async fn find_user_by_name(&self, name: &str) -> StoreResult<Option<User>>
	{
		let mut conn = self.database.get_connection().await?;

		sqlx::query_as::<_, UserRow>("SELECT id, name FROM Users WHERE name = ? LIMIT 1")
			.bind(name)
			.fetch_optional(&mut *conn)
			.await
			.map_err(DatabaseError::from)?
			.map(Self::decode_user)
			.transpose()
	}

	#[tracing::instrument(level = "debug", skip(self), err)]
	async fn get_problem(&self, id: ProblemId) -> StoreResult<Option<Problem>>
	{
		let mut conn = self.database.get_connection().await?;

		sqlx::query_as::<_, ProblemRow>("SELECT id, title, hidden FROM Problems WHERE id = ?")
			.bind(id.get())
			.fetch_optional(&mut *conn)
			.await
			.map_err(DatabaseError::from)?
			.map(Self::decode_problem)
			.transpose()
	}

	#[tracing::instrument(level = "debug", skip(self), err)]
	async fn get_problems(&self, ids: &[ProblemId]) -> StoreResult<Vec<Problem>>
	{
		if ids.is_empty() {
			return Ok(Vec::new());
		}

		let mut conn = self.database.get_connection().await?;
		let mut query =
			QueryBuilder::<MySql>::new("SELECT id, title, hidden FROM Problems WHERE id IN (");
		let mut separated = query.separated(", ");

		for id in ids {
			separated.push_bind(id.get());
		}

		query.push(")");

		query
			.build_query_as::<ProblemRow>()
			.fetch_all(&mut *conn)
			.await
			.map_err(DatabaseError::from)?
			.into_iter()
			.map(Self::decode_problem)
			.collect()
	}

	#[tracing::instrument(level = "debug", skip(self), err)]
	async fn get_contest(&self, id: ContestId) -> StoreResult<Option<Contest>>
	{
		let mut conn = self.database.get_connection().await?;

		sqlx::query_as::<_, ContestRow>(
			"SELECT id, title, rule, begins_at, ends_at FROM Contests WHERE id = ?",
		)
		.bind(id.get())
		.fetch_optional(&mut *conn)
		.await
		.map_err(DatabaseError::from)?
		.map(Self::decode_contest)
		.transpose()
	}

	#[tracing::instrument(level = "debug", skip_all, err)]
	async fn get_viewer(&self, token: &str) -> StoreResult<Option<Viewer>>
	{
		let mut conn = self.database.get_connection().await?;

		let Some((user_id, permissions)) = sqlx::query_as::<_, (u32, u64)>(
			"SELECT u.id, u.permissions
			 FROM UserSessions s
			 JOIN Users u ON u.id = s.user_id
			 WHERE s.token = ?
			 AND s.expires_at > NOW()",
		)
		.bind(token)
		.fetch_optional(&mut *conn)
		.await
		.map_err(DatabaseError::from)?
		else {
			return Ok(None);
		};

		Ok(Some(Viewer::user(
			Self::decode_id("user_id", user_id, UserId::new)?,
			Permissions::from_bits_truncate(permissions),
		)))
	}

	#[tracing::instrument(level = "debug", skip(self), err)]
	async fn apply_delta(&self, id: RecordId, delta: &FieldDelta) -> StoreResult<Option<Record>>
	{
		let mut txn = self.database.begin_transaction().await?;

		let Some(record) = Self::lock_record(&mut txn, id).await? else {
			return Ok(None);
		};

		let updated = delta.apply(&record)?;

		Self::write_record(&mut txn, &updated).await?;
		txn.commit().await.map_err(DatabaseError::from)?;

		Ok(Some(updated))
	}
}

impl JudgeQueue for MySqlStore
{
	#[tracing::instrument(level = "debug", skip(self), err)]
	async fn requeue(&self, id: RecordId) -> StoreResult<Option<Record>>
	{
		let mut txn = self.database.begin_transaction().await?;

		let Some(mut record) = Self::lock_record(&mut txn, id).await? else {
			return Ok(None);
		};

		record.reset_for_rejudge();
		Self::write_record(&mut txn, &record).await?;

		sqlx::query("INSERT INTO JudgeQueue (record_id) VALUES (?)")
			.bind(id.get())
			.execute(&mut *txn)
			.await
			.map_err(DatabaseError::from)?;

		txn.commit().await.map_err(DatabaseError::from)?;

		Ok(Some(record))
	}
}
