use std::error::Error;

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// An error returned by the database
#[derive(Debug, Display, Error, From)]
#[display("database error: {_0}")]
pub struct DatabaseError(sqlx::Error);

impl DatabaseError
{
	/// Wraps a failure to turn a column value into one of our types.
	pub(crate) fn decode_column(
		column: impl Into<String>,
		error: impl Into<Box<dyn Error + Send + Sync>>,
	) -> Self
	{
		Self(sqlx::Error::ColumnDecode { index: column.into(), source: error.into() })
	}
}
