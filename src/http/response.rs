//! Envelope rendering.
//!
//! Both feeds answer `200 text/plain` with the envelope as the whole body.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::envelope::Envelope;

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.into_body(),
        )
            .into_response()
    }
}
