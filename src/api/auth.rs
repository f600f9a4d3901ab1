// src/api/auth.rs

use crate::api::{types::ErrorResponse, ApiState};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

/// Verify the bearer token if one is configured. Guards the admin routes.
pub fn check_auth(
    state: &ApiState,
    headers: &HeaderMap,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    let Some(ref expected) = state.token else {
        return Ok(());
    };

    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    if constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        tracing::debug!("Rejected admin request with bad token");
        Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Invalid or missing bearer token".into(),
            }),
        ))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}
