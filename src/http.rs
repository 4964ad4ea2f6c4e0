//! Thin axum glue: writes an [`ErrorResponse`] as a JSON response with its
//! resolved status as the transport status.

use crate::response::ErrorResponse;
use axum::{
    Json,
    response::{IntoResponse, Response},
};

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.http_status, Json(self)).into_response()
    }
}
