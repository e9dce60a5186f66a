use {
	crate::{
		database::DatabaseError,
		judge::ReportError,
		sessions::OpenError,
		store::StoreError,
	},
	axum::response::{IntoResponse, Response},
	std::{error::Error, panic::Location},
};

pub(crate) type HandlerResult<T> = Result<T, HandlerError>;

/// Errors returned by HTTP handlers and extractors.
#[derive(Debug)]
pub enum HandlerError
{
	Unauthorized,
	Forbidden,
	NotFound,

	/// The request was well-formed but cannot be applied.
	Unprocessable(Box<str>),

	Internal,
	ShuttingDown,
}

impl IntoResponse for HandlerError
{
	fn into_response(self) -> Response
	{
		match self {
			HandlerError::Unauthorized => http::StatusCode::UNAUTHORIZED.into_response(),
			HandlerError::Forbidden => http::StatusCode::FORBIDDEN.into_response(),
			HandlerError::NotFound => http::StatusCode::NOT_FOUND.into_response(),
			HandlerError::Unprocessable(detail) => {
				(http::StatusCode::UNPROCESSABLE_ENTITY, String::from(detail)).into_response()
			},
			HandlerError::Internal => http::StatusCode::INTERNAL_SERVER_ERROR.into_response(),
			HandlerError::ShuttingDown => http::StatusCode::SERVICE_UNAVAILABLE.into_response(),
		}
	}
}

impl From<DatabaseError> for HandlerError
{
	#[track_caller]
	fn from(error: DatabaseError) -> Self
	{
		tracing::error!(loc = %Location::caller(), error = &error as &dyn Error);
		Self::Internal
	}
}

impl From<StoreError> for HandlerError
{
	#[track_caller]
	fn from(error: StoreError) -> Self
	{
		match error {
			StoreError::Database(error) => HandlerError::from(error),
			StoreError::Decode(ref error) => {
				tracing::error!(
					loc = %Location::caller(),
					error = error as &dyn Error,
					"stored document is malformed",
				);

				Self::Internal
			},
			StoreError::InvalidDelta(error) => Self::Unprocessable(error.to_string().into()),
		}
	}
}

impl From<OpenError> for HandlerError
{
	#[track_caller]
	fn from(error: OpenError) -> Self
	{
		match error {
			OpenError::NotFound => Self::NotFound,
			OpenError::Forbidden => Self::Forbidden,
			OpenError::Store(error) => HandlerError::from(error),
		}
	}
}

impl From<ReportError> for HandlerError
{
	#[track_caller]
	fn from(error: ReportError) -> Self
	{
		match error {
			ReportError::UnknownRecord => Self::NotFound,
			ReportError::InvalidDelta(error) => Self::Unprocessable(error.to_string().into()),
			ReportError::Store(error) => HandlerError::from(error),
		}
	}
}
