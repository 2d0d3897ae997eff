//! Console endpoints, one set per content type.
//!
//! Commands answer 200 with their outcome and the resulting session snapshot,
//! even when rejected or failed; the snapshot's error slots say why. Only
//! requests the session cannot interpret (unknown id, edits to a locked
//! entity) become HTTP errors.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use folio_core::domain::{ContentId, FieldOf, Post, Project};
use folio_core::gate::mask_email;
use folio_core::{ActionOutcome, ConsoleEntry, ConsoleTab, DraftSession, SessionSnapshot};
use folio_shared::ApiResponse;
use folio_shared::dto::{CommandResponse, FieldEditRequest};

use crate::middleware::auth::Editor;
use crate::middleware::error::AppResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ConsoleOverview {
    pub editor: String,
    pub tab: ConsoleTab,
    pub posts: SessionSnapshot<Post>,
    pub projects: SessionSnapshot<Project>,
}

async fn respond<C: ConsoleEntry, O: Serialize>(
    outcome: O,
    session: &DraftSession<C>,
) -> AppResult<HttpResponse> {
    let body = CommandResponse {
        outcome,
        session: session.snapshot().await,
    };
    Ok(HttpResponse::Ok().json(ApiResponse::ok(body)))
}

/// GET /api/matrix
pub async fn overview(editor: Editor, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let console = &state.console;
    let overview = ConsoleOverview {
        editor: editor.email,
        tab: console.tab().await,
        posts: console.posts().snapshot().await,
        projects: console.projects().snapshot().await,
    };
    Ok(HttpResponse::Ok().json(ApiResponse::ok(overview)))
}

/// POST /api/matrix/tab/{tab}
pub async fn open_tab(
    _editor: Editor,
    state: web::Data<AppState>,
    tab: web::Path<ConsoleTab>,
) -> AppResult<HttpResponse> {
    state.console.open_tab(tab.into_inner()).await;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(state.console.tab().await)))
}

/// GET /api/matrix/{kind}
pub async fn snapshot<C: ConsoleEntry>(
    _editor: Editor,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let session = state.console.session::<C>();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(session.snapshot().await)))
}

/// POST /api/matrix/{kind}/load
pub async fn load<C: ConsoleEntry>(
    _editor: Editor,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let session = state.console.session::<C>();
    let outcome = session.load().await;
    respond(outcome, session).await
}

/// POST /api/matrix/{kind}/select/{id}
pub async fn select<C: ConsoleEntry>(
    _editor: Editor,
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> AppResult<HttpResponse> {
    state.console.open_tab(C::TAB).await;
    let session = state.console.session::<C>();
    session.select(&ContentId::new(id.into_inner())).await?;
    respond(ActionOutcome::Completed, session).await
}

/// POST /api/matrix/{kind}/new
pub async fn start_new<C: ConsoleEntry>(
    _editor: Editor,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    state.console.open_tab(C::TAB).await;
    let session = state.console.session::<C>();
    session.start_new().await;
    respond(ActionOutcome::Completed, session).await
}

/// PATCH /api/matrix/{kind}/fields
pub async fn edit_field<C: ConsoleEntry>(
    _editor: Editor,
    state: web::Data<AppState>,
    body: web::Json<FieldEditRequest<FieldOf<C>>>,
) -> AppResult<HttpResponse> {
    let FieldEditRequest { field, value } = body.into_inner();
    let session = state.console.session::<C>();
    session.edit_field(field, value).await?;
    respond(ActionOutcome::Completed, session).await
}

/// POST /api/matrix/{kind}/save
pub async fn save<C: ConsoleEntry>(
    editor: Editor,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let session = state.console.session::<C>();
    let outcome = session.save().await;
    tracing::debug!(
        kind = %C::KIND,
        outcome = ?outcome,
        editor = %mask_email(&editor.email),
        "Save requested"
    );
    respond(outcome, session).await
}

/// POST /api/matrix/{kind}/publish/request
pub async fn request_publish<C: ConsoleEntry>(
    _editor: Editor,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let session = state.console.session::<C>();
    let outcome = session.request_publish().await;
    respond(outcome, session).await
}

/// POST /api/matrix/{kind}/publish/confirm
pub async fn confirm_publish<C: ConsoleEntry>(
    editor: Editor,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let session = state.console.session::<C>();
    let outcome = session.confirm_publish().await;
    tracing::debug!(
        kind = %C::KIND,
        outcome = ?outcome,
        editor = %mask_email(&editor.email),
        "Publish confirmed"
    );
    respond(outcome, session).await
}

/// POST /api/matrix/{kind}/publish/cancel
pub async fn cancel_publish<C: ConsoleEntry>(
    _editor: Editor,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let session = state.console.session::<C>();
    let outcome = session.cancel_publish().await;
    respond(outcome, session).await
}
