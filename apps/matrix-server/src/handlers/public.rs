//! Public blog and portfolio reads. Published content only, no session.

use actix_web::{HttpResponse, web};

use folio_core::domain::ContentId;
use folio_shared::ApiResponse;

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/blog/posts
pub async fn list_posts(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.posts.list_published().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(posts)))
}

/// GET /api/blog/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .find_published(&ContentId::new(id.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post)))
}

/// GET /api/portfolio/projects
pub async fn list_projects(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let projects = state.projects.list_published().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(projects)))
}

/// GET /api/portfolio/projects/{id}
pub async fn get_project(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let project = state
        .projects
        .find_published(&ContentId::new(id.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(project)))
}
