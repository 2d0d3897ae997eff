//! Console access extractors.
//!
//! Every console request carries the session's access token as a Bearer
//! token. The token, not the server's own session, decides who is asking.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures::future::LocalBoxFuture;

use folio_core::GateView;

use super::error::AppError;
use crate::state::AppState;

/// The allowlisted account, present only while the access gate is open.
///
/// Use this in handlers to require console access:
/// ```ignore
/// async fn protected_route(editor: Editor) -> impl Responder {
///     format!("Hello, {}!", editor.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Editor {
    pub email: String,
}

impl Editor {
    fn from_view(view: GateView) -> Result<Self, AppError> {
        match view {
            GateView::Authorized { email } => Ok(Editor { email }),
            GateView::SignInRequired => {
                Err(AppError::Unauthorized("Sign in to use the console.".into()))
            }
            GateView::Denied { email } => Err(AppError::Forbidden(format!(
                "{} is not allowed to use the console.",
                email.as_deref().unwrap_or("This account")
            ))),
            GateView::Misconfigured { .. } => Err(AppError::Unavailable(
                "MATRIX_ALLOWED_EMAIL is not configured.".into(),
            )),
            GateView::Loading => Err(AppError::Unavailable(
                "Checking authentication status...".into(),
            )),
            GateView::Unavailable { message } => Err(AppError::Unavailable(message)),
        }
    }
}

/// Any holder of a valid session, allowed in or not.
///
/// Denied accounts still get to sign out.
#[derive(Debug, Clone)]
pub struct SessionHolder {
    pub email: Option<String>,
}

impl SessionHolder {
    fn from_view(view: GateView) -> Result<Self, AppError> {
        match view {
            GateView::Authorized { email } => Ok(Self { email: Some(email) }),
            GateView::Denied { email } => Ok(Self { email }),
            GateView::Misconfigured {
                signed_in_as: Some(email),
            } => Ok(Self { email: Some(email) }),
            GateView::Misconfigured { signed_in_as: None } => {
                Err(AppError::Unauthorized("Sign in first.".into()))
            }
            other => Editor::from_view(other).map(|editor| Self {
                email: Some(editor.email),
            }),
        }
    }
}

/// The Bearer token of the request, if it sent one.
pub fn bearer_token(req: &HttpRequest) -> Result<Option<String>, AppError> {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid authorization header".into()))?;
    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
        _ => Err(AppError::Unauthorized("Expected Bearer token".into())),
    }
}

/// Resolves the gate view for the credential carried by `req`.
fn request_view(req: &HttpRequest) -> LocalBoxFuture<'static, Result<GateView, AppError>> {
    let gate = req
        .app_data::<web::Data<AppState>>()
        .map(|state| state.gate.clone());
    let token = bearer_token(req);

    Box::pin(async move {
        let Some(gate) = gate else {
            tracing::error!("AppState not found in app data");
            return Err(AppError::Internal("Server configuration error".into()));
        };
        let token = token?;
        Ok(gate.view_for(token.as_deref()).await)
    })
}

impl FromRequest for Editor {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let view = request_view(req);
        Box::pin(async move { Editor::from_view(view.await?) })
    }
}

impl FromRequest for SessionHolder {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let view = request_view(req);
        Box::pin(async move { SessionHolder::from_view(view.await?) })
    }
}
