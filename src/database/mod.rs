//! MySQL connection pool.

use {
	sqlx::{
		MySql,
		pool::{PoolConnection, PoolOptions},
	},
	std::num::NonZero,
	url::Url,
};

pub use self::error::{DatabaseError, DatabaseResult};

mod error;

pub type Transaction<'c> = sqlx::Transaction<'c, MySql>;

#[derive(Debug, bon::Builder)]
pub struct ConnectOptions<'a>
{
	url: &'a Url,
	min_connections: Option<NonZero<u32>>,
	max_connections: Option<NonZero<u32>>,
}

/// A pool of database connections.
#[derive(Debug, Clone)]
#[debug("Database")]
pub struct Database(sqlx::Pool<MySql>);

impl Database
{
	/// Connects to the database at the configured URL.
	///
	/// If `max_connections` is not specified, the amount of available CPUs is
	/// used instead.
	#[tracing::instrument(skip_all, fields(max_connections = ?options.max_connections), err)]
	pub async fn connect(options: ConnectOptions<'_>) -> DatabaseResult<Self>
	{
		let max_connections = options.max_connections.map_or_else(
			|| {
				std::thread::available_parallelism()
					.map_or(8, NonZero::get)
					.try_into()
					.unwrap_or(u32::MAX)
			},
			NonZero::get,
		);

		let pool = PoolOptions::new()
			.min_connections(options.min_connections.map_or(1, NonZero::get))
			.max_connections(max_connections)
			.connect(options.url.as_str())
			.await?;

		Ok(Self(pool))
	}

	/// Runs all pending migrations.
	#[tracing::instrument(skip(self), err)]
	pub async fn migrate(&self) -> DatabaseResult<()>
	{
		sqlx::migrate!("./migrations")
			.run(&self.0)
			.await
			.map_err(sqlx::Error::from)?;

		Ok(())
	}

	/// Gets a connection from the pool.
	///
	/// The returned [`PoolConnection`] will be returned to the pool
	/// automatically on drop.
	#[tracing::instrument(level = "trace", skip_all, err)]
	pub async fn get_connection(&self) -> DatabaseResult<PoolConnection<MySql>>
	{
		self.0.acquire().await.map_err(Into::into)
	}

	/// Begins a transaction.
	///
	/// The returned [`Transaction`] will be rolled back automatically on drop
	/// unless [`Transaction::commit()`] is called explicitly beforehand.
	#[tracing::instrument(level = "trace", skip_all, err)]
	pub async fn begin_transaction(&self) -> DatabaseResult<Transaction<'static>>
	{
		self.0.begin().await.map_err(Into::into)
	}
}
