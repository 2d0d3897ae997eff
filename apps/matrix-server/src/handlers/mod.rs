//! HTTP handlers and route configuration.

mod console;
mod gate;
mod health;
mod public;


use actix_web::{Scope, web};

use folio_core::ConsoleEntry;
use folio_core::domain::{Post, Project};

/// Routes of one content type's draft session.
fn session_scope<C: ConsoleEntry>(path: &str) -> Scope {
    web::scope(path)
        .route("", web::get().to(console::snapshot::<C>))
        .route("/load", web::post().to(console::load::<C>))
        .route("/select/{id}", web::post().to(console::select::<C>))
        .route("/new", web::post().to(console::start_new::<C>))
        .route("/fields", web::patch().to(console::edit_field::<C>))
        .route("/save", web::post().to(console::save::<C>))
        .service(
            web::scope("/publish")
                .route("/request", web::post().to(console::request_publish::<C>))
                .route("/confirm", web::post().to(console::confirm_publish::<C>))
                .route("/cancel", web::post().to(console::cancel_publish::<C>)),
        )
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/blog")
                    .route("/posts", web::get().to(public::list_posts))
                    .route("/posts/{id}", web::get().to(public::get_post)),
            )
            .service(
                web::scope("/portfolio")
                    .route("/projects", web::get().to(public::list_projects))
                    .route("/projects/{id}", web::get().to(public::get_project)),
            )
            // Console routes
            .service(
                web::scope("/matrix")
                    .route("", web::get().to(console::overview))
                    .route("/gate", web::get().to(gate::view))
                    .route("/sign-in", web::post().to(gate::sign_in))
                    .route("/session", web::post().to(gate::adopt_session))
                    .route("/sign-out", web::post().to(gate::sign_out))
                    .route("/tab/{tab}", web::post().to(console::open_tab))
                    .service(session_scope::<Post>("/posts"))
                    .service(session_scope::<Project>("/projects")),
            ),
    );
}
