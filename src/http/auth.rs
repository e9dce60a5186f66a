//! Figuring out who is looking.
//!
//! Logging in happens elsewhere. We only resolve the session token a request
//! carries, either in the [`SESSION_COOKIE_NAME`] cookie or as a bearer token.
//! Requests without a known token are treated as guests.

use {
	crate::{
		AppState,
		http::response::HandlerError,
		store::RecordStore,
		users::Permission,
		visibility::Viewer,
	},
	axum::extract::FromRequestParts,
	cookie::Cookie,
	headers::{Authorization, HeaderMapExt, authorization::Bearer},
	http::request,
};

pub(crate) const SESSION_COOKIE_NAME: &str = "oj-session";

impl<S> FromRequestParts<AppState<S>> for Viewer
where
	S: RecordStore,
{
	type Rejection = HandlerError;

	#[tracing::instrument(level = "debug", skip_all, ret(level = "debug"))]
	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &AppState<S>,
	) -> Result<Self, Self::Rejection>
	{
		let Some(token) = session_token(&parts.headers) else {
			tracing::trace!("no session token");
			return Ok(Viewer::guest());
		};

		let viewer = state.store.get_viewer(&token).await?.unwrap_or_else(|| {
			tracing::debug!("unknown session token");
			Viewer::guest()
		});

		Ok(viewer)
	}
}

/// Bearer tokens take precedence over the session cookie.
fn session_token(headers: &http::HeaderMap) -> Option<Box<str>>
{
	if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
		return Some(bearer.token().into());
	}

	headers
		.get_all(http::header::COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(Cookie::split_parse)
		.filter_map(Result::ok)
		.find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
		.map(|cookie| cookie.value().into())
}

/// Guests are told to log in, everyone else is told they are not allowed.
pub(crate) fn require_permission(viewer: &Viewer, permission: Permission)
-> Result<(), HandlerError>
{
	if viewer.is_guest() {
		return Err(HandlerError::Unauthorized);
	}

	if !viewer.has_permission(permission) {
		tracing::debug!(%permission, "viewer is missing permission");
		return Err(HandlerError::Forbidden);
	}

	Ok(())
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn headers(pairs: &[(http::HeaderName, &'static str)]) -> http::HeaderMap
	{
		pairs
			.iter()
			.map(|(name, value)| (name.clone(), http::HeaderValue::from_static(value)))
			.collect()
	}

	#[test]
	fn session_token_is_read_from_cookies()
	{
		let headers = headers(&[(http::header::COOKIE, "theme=dark; oj-session=abc123")]);

		assert_eq!(session_token(&headers).as_deref(), Some("abc123"));
	}

	#[test]
	fn bearer_tokens_win_over_cookies()
	{
		let headers = headers(&[
			(http::header::COOKIE, "oj-session=from-cookie"),
			(http::header::AUTHORIZATION, "Bearer from-header"),
		]);

		assert_eq!(session_token(&headers).as_deref(), Some("from-header"));
	}

	#[test]
	fn missing_tokens_are_none()
	{
		let headers = headers(&[(http::header::COOKIE, "theme=dark")]);

		assert_eq!(session_token(&headers), None);
		assert_eq!(session_token(&http::HeaderMap::new()), None);
	}
}
