//! The HTTP surface.
//!
//! JSON endpoints for the record list and detail pages, the two WebSocket
//! upgrade endpoints, and the write endpoints used by staff and the judge.

use {
	crate::{AppState, store::Backend},
	axum::{Router, body::Body, routing},
};

mod auth;
mod handlers;
mod middleware;
mod pagination;
mod response;

pub use self::response::HandlerError;


/// Returns the top-level router.
///
/// This is what we pass to [`axum::serve()`].
pub fn router<S>(state: AppState<S>, include_http_headers: bool) -> Router
where
	S: Backend,
{
	Router::new()
		.route("/records", routing::get(handlers::get_records::<S>))
		.route("/records/ws", routing::get(handlers::records_ws::<S>))
		.route("/records/{record_id}", routing::get(handlers::get_record::<S>))
		.route("/records/{record_id}/ws", routing::get(handlers::record_ws::<S>))
		.route("/records/{record_id}/rejudge", routing::post(handlers::rejudge::<S>))
		.route("/judge/records/{record_id}", routing::post(handlers::report::<S>))
		.with_state(state)
		.layer(middleware::trace::layer::<Body>(include_http_headers))
		.layer(middleware::request_id::propagate_layer())
		.layer(middleware::request_id::set_layer())
}
