//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server needed.

use atelier_api::error::AppError;
use atelier_core::error::CoreError;
use assert_matches::assert_matches;
use atelier_db::automation::AutomationError;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use uuid::Uuid;
use validator::Validate;

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let id = Uuid::nil();
    let (status, json) = error_to_response(AppError::Core(CoreError::NotFound {
        entity: "project",
        id,
    }))
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "not_found");
    assert_eq!(json["error"], format!("project with id {id} not found"));
}

#[tokio::test]
async fn invalid_transition_returns_409_with_allowed_targets() {
    let (status, json) = error_to_response(AppError::Core(CoreError::InvalidTransition {
        from: "pret".into(),
        to: "pret".into(),
        allowed: vec!["livre".into()],
    }))
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "invalid_transition");
    assert_eq!(json["allowed"], serde_json::json!(["livre"]));
}

#[tokio::test]
async fn already_signed_returns_409() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::AlreadySigned(Uuid::nil()))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "already_signed");
    assert!(json.get("allowed").is_none());
}

#[tokio::test]
async fn forbidden_returns_403() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::Forbidden("owners only".into()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "forbidden");
    assert_eq!(json["error"], "owners only");
}

#[tokio::test]
async fn forbidden_transition_returns_403_with_allowed_targets() {
    let (status, json) = error_to_response(AppError::Core(CoreError::TransitionForbidden {
        from: "en_preparation".into(),
        to: "annule".into(),
        allowed: vec!["en_traitement".into()],
    }))
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "forbidden");
    assert_eq!(json["allowed"], serde_json::json!(["en_traitement"]));
}

#[tokio::test]
async fn validation_returns_400() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::Validation("amount".into()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "validation_error");
}

#[tokio::test]
async fn internal_error_sanitizes_message() {
    let (status, json) =
        error_to_response(AppError::InternalError("secret database credentials".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "internal_error");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn row_not_found_maps_to_404() {
    let (status, json) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "not_found");
}

#[tokio::test]
async fn automation_errors_keep_their_kind() {
    let err: AppError = AutomationError::Core(CoreError::AlreadySigned(Uuid::nil())).into();
    let (status, _) = error_to_response(err).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let err: AppError = AutomationError::Database(sqlx::Error::PoolTimedOut).into();
    let (status, json) = error_to_response(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An internal error occurred");
}

#[derive(Debug, Validate)]
struct Payment {
    #[validate(range(min = 1))]
    amount_cents: i64,
}

#[tokio::test]
async fn validator_errors_become_validation_errors() {
    let errors = Payment { amount_cents: 0 }.validate().unwrap_err();
    let err: AppError = errors.into();
    assert_matches!(err, AppError::Core(CoreError::Validation(_)));

    let (status, json) = error_to_response(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "validation_error");
}
