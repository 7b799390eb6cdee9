//! Response construction.
//!
//! # Responsibilities
//! - Turn a built redirect URL into a redirect response
//! - Map routing outcomes to status codes
//!
//! # Design Decisions
//! - The Location header carries the serialized URL verbatim, escapes included
//! - A Location that is not a valid header value results in 500

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::url::Url;

/// Redirect response with status `code` and `Location: location`.
pub fn redirect(code: u16, location: &Url) -> Response {
    let status = match StatusCode::from_u16(code) {
        Ok(status) if status.is_redirection() => status,
        _ => {
            tracing::error!(code, "Invalid redirect status code");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match HeaderValue::try_from(location.to_string()) {
        Ok(value) => (status, [(header::LOCATION, value)]).into_response(),
        Err(e) => {
            tracing::error!(location = %location, error = %e, "Redirect URL is not a valid header value");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
