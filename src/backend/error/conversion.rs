/**
 * Error Conversion
 *
 * This module converts `AuthError` values into HTTP responses so handlers
 * can return them directly with `?`.
 *
 * # Response Format
 *
 * Error responses are JSON with the following structure:
 * ```json
 * {
 *   "error": "missing required field `experience_level`",
 *   "code": "missing_role_fields",
 *   "status": 422
 * }
 * ```
 */

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::backend::error::types::AuthError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
            "status": status.as_u16(),
        });

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap_or_else(|_| {
                Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Body::from("Internal Server Error"))
                    .unwrap()
            })
    }
}
