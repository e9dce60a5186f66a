use {
	crate::error::ResultExt,
	tower_http::request_id::{
		MakeRequestId,
		PropagateRequestIdLayer,
		RequestId,
		SetRequestIdLayer,
	},
	ulid::Ulid,
};

/// Generates an `x-request-id` for every request and stores it in both the
/// request's headers and its extensions.
pub(crate) fn set_layer() -> SetRequestIdLayer<impl MakeRequestId + Clone>
{
	SetRequestIdLayer::x_request_id(MakeUlidRequestId)
}

/// Copies the `x-request-id` header from the request to the response.
pub(crate) fn propagate_layer() -> PropagateRequestIdLayer
{
	PropagateRequestIdLayer::x_request_id()
}

#[derive(Debug, Clone, Copy)]
struct MakeUlidRequestId;

impl MakeRequestId for MakeUlidRequestId
{
	fn make_request_id<B>(&mut self, _: &http::Request<B>) -> Option<RequestId>
	{
		Ulid::new()
			.to_string()
			.parse::<http::HeaderValue>()
			.inspect_err_dyn(|error| tracing::warn!(error, "failed to generate request ID"))
			.map(RequestId::new)
			.ok()
	}
}
