//! Handlers for quote signatures and public signing links.

use atelier_core::types::DbId;
use atelier_db::automation::{self, Signer};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /quotes/{id}/sign`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignQuoteRequest {
    #[validate(length(min = 1, max = 200))]
    pub signer_name: String,
}

/// Request body for `POST /public/quotes/sign`.
#[derive(Debug, Deserialize, Validate)]
pub struct PublicSignRequest {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 1, max = 200))]
    pub signer_name: String,
}

/// POST /quotes/{id}/sign
///
/// A member records the client's signature. Creates the project.
pub async fn sign_quote(
    State(state): State<AppState>,
    user: AuthUser,
    Path(quote_id): Path<DbId>,
    Json(body): Json<SignQuoteRequest>,
) -> AppResult<impl IntoResponse> {
    body.validate()?;

    let signer = Signer::Member {
        user_id: user.user_id,
        name: body.signer_name,
    };
    let executed = automation::on_quote_signed(&state.pool, user.tenant_id, quote_id, &signer).await?;
    state.publish(executed.events);

    Ok(Json(DataResponse {
        data: executed.outcome,
    }))
}

/// POST /quotes/{id}/signing-link
///
/// The plaintext token appears in this response only.
pub async fn create_signing_link(
    State(state): State<AppState>,
    user: AuthUser,
    Path(quote_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let created = automation::create_signing_link(
        &state.pool,
        user.tenant_id,
        quote_id,
        state.config.signing_link_ttl_hours,
        &user.actor(),
    )
    .await?;

    tracing::info!(
        tenant_id = %user.tenant_id,
        quote_id = %quote_id,
        link_id = %created.link.id,
        "Signing link created",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// POST /public/quotes/sign
///
/// Unauthenticated. Unknown, expired and used tokens all answer 404.
pub async fn sign_with_token(
    State(state): State<AppState>,
    Json(body): Json<PublicSignRequest>,
) -> AppResult<impl IntoResponse> {
    body.validate()?;

    let executed =
        automation::sign_with_public_token(&state.pool, &body.token, &body.signer_name).await?;
    state.publish(executed.events);

    Ok(Json(DataResponse {
        data: executed.outcome,
    }))
}
