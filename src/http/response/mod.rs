//! Custom [response] types
//!
//! [response]: axum::response::IntoResponse

pub use self::error::HandlerError;
pub(crate) use self::error::HandlerResult;

mod error;
