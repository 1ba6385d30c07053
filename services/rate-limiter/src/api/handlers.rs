use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::limiter::{ceil_secs, AdmissionError, Decision};

use super::types::{
    CheckRateLimitRequest, CheckRateLimitResponse, ErrorResponse, IdQuery, QuotaConfig,
    UsageReport, ADMITTED_MESSAGE,
};
use super::ApiState;

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn create_rate_limit(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<QuotaConfig>, JsonRejection>,
) -> Result<(StatusCode, Json<QuotaConfig>), ApiError> {
    let Json(config) = payload.map_err(invalid_payload)?;
    let created = state.engine.create(config).map_err(admission_error)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_rate_limit(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<IdQuery>,
) -> ApiResult<QuotaConfig> {
    let id = require_id(query)?;
    let config = state.engine.get(&id).map_err(admission_error)?;
    Ok(Json(config))
}

pub async fn update_rate_limit(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<IdQuery>,
    payload: Result<Json<QuotaConfig>, JsonRejection>,
) -> ApiResult<QuotaConfig> {
    let id = require_id(query)?;
    // Unknown ids are reported before the body is looked at.
    state.engine.get(&id).map_err(admission_error)?;

    let Json(config) = payload.map_err(invalid_payload)?;
    let updated = state.engine.update(&id, config).map_err(admission_error)?;
    Ok(Json(updated))
}

pub async fn delete_rate_limit(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<IdQuery>,
) -> Result<StatusCode, ApiError> {
    let id = require_id(query)?;
    state.engine.delete(&id).map_err(admission_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_rate_limits(State(state): State<Arc<ApiState>>) -> ApiResult<Vec<QuotaConfig>> {
    let configs = state.engine.list().map_err(admission_error)?;
    Ok(Json(configs))
}

pub async fn get_usage(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<IdQuery>,
) -> ApiResult<UsageReport> {
    let id = require_id(query)?;
    let usage = state.engine.usage(&id).map_err(admission_error)?;
    Ok(Json(usage))
}

pub async fn check_rate_limit(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<CheckRateLimitRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return invalid_payload(rejection).into_response(),
    };

    match state.engine.check(&request.id) {
        Ok(Decision::Admitted { .. }) => Json(CheckRateLimitResponse {
            message: ADMITTED_MESSAGE.to_string(),
        })
        .into_response(),
        Ok(Decision::Denied {
            count,
            limit,
            retry_after,
        }) => {
            let retry_after_secs = ceil_secs(retry_after);
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after_secs.to_string())],
                Json(ErrorResponse {
                    error: "rate limit exceeded".to_string(),
                    code: "rate_limit_exceeded".to_string(),
                    details: Some(serde_json::json!({
                        "limit": limit,
                        "current": count,
                        "retry_after_secs": retry_after_secs,
                    })),
                }),
            )
                .into_response()
        }
        Err(err) => admission_error(err).into_response(),
    }
}

pub async fn health_check() -> ApiResult<serde_json::Value> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": "rate-limiter"
    })))
}

fn require_id(query: IdQuery) -> Result<String, ApiError> {
    match query.id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(bad_request("missing_id", "id query parameter is required")),
    }
}

fn admission_error(err: AdmissionError) -> ApiError {
    match err {
        AdmissionError::InvalidInput(message) => bad_request("invalid_input", &message),
        AdmissionError::NotFound(_) => not_found("rate_limiter_not_found", "rate limiter not found"),
        err => internal_error(err),
    }
}

fn invalid_payload(rejection: JsonRejection) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "invalid request payload".to_string(),
            code: "invalid_payload".to_string(),
            details: Some(serde_json::json!({ "message": rejection.body_text() })),
        }),
    )
}

fn bad_request(code: &str, message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            details: None,
        }),
    )
}

fn not_found(code: &str, message: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            details: None,
        }),
    )
}

fn internal_error<E: std::fmt::Display>(err: E) -> ApiError {
    error!(error = %err, "rate limiter API internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "internal server error".to_string(),
            code: "internal_error".to_string(),
            details: Some(serde_json::json!({ "message": err.to_string() })),
        }),
    )
}
