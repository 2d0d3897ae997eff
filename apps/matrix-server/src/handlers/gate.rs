//! Access gate endpoints.

use actix_web::{HttpRequest, HttpResponse, web};

use folio_core::GateView;
use folio_core::ports::SessionTokens;
use folio_shared::ApiResponse;
use folio_shared::dto::{SessionRequest, SignInResponse};

use crate::middleware::auth::{SessionHolder, bearer_token};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// The gate as seen by the caller's Bearer token.
///
/// GET /api/matrix/gate
pub async fn view(req: HttpRequest, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let token = bearer_token(&req)?;
    let view = state.gate.view_for(token.as_deref()).await;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(view)))
}

/// Starts the redirect sign-in flow.
///
/// POST /api/matrix/sign-in
pub async fn sign_in(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let redirect = state.gate.sign_in().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(SignInResponse { url: redirect.url })))
}

/// Adopts the tokens the provider handed back and loads the console when the
/// account is allowed in.
///
/// POST /api/matrix/session
pub async fn adopt_session(
    state: web::Data<AppState>,
    body: web::Json<SessionRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let view = state
        .gate
        .adopt_session(SessionTokens {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            expires_in: body.expires_in,
        })
        .await?;

    if matches!(view, GateView::Authorized { .. }) {
        let (posts, projects) = state.console.load_all().await;
        tracing::debug!(?posts, ?projects, "Console lists loaded after sign-in");
    }

    Ok(HttpResponse::Ok().json(ApiResponse::ok(view)))
}

/// POST /api/matrix/sign-out
pub async fn sign_out(
    holder: SessionHolder,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    state.gate.sign_out().await?;
    state.console.teardown().await;
    tracing::info!(
        email = %folio_core::gate::mask_email(holder.email.as_deref().unwrap_or_default()),
        "Console session closed"
    );
    Ok(HttpResponse::Ok().json(ApiResponse::ok(state.gate.view_for(None).await)))
}
