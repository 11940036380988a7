//! # hs-api
//!
//! The web routing and orchestration layer for Hostel Solve: the JSON API
//! under `/api` and the server-rendered dashboards.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pages;
pub mod session;

use actix_web::web;

/// Registers every route. The binary (and the tests) wrap this with
/// [`middleware`] and the shared [`handlers::AppState`].
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(middleware::json_config())
        .app_data(middleware::query_config())
        .app_data(middleware::path_config())
        .route("/health", web::get().to(handlers::health))
        .service(
            web::scope("/api")
                .route("/facilities", web::get().to(handlers::list_facilities))
                .route("/issues", web::get().to(handlers::list_issues))
                .route("/issues", web::post().to(handlers::create_issue))
                .route("/issues/stats", web::get().to(handlers::issue_stats))
                .route("/issues/{id}", web::put().to(handlers::update_issue))
                .route("/issues/{id}/resolve", web::post().to(handlers::resolve_issue))
                .route("/issues/{id}/resolution", web::get().to(handlers::get_resolution))
                .route("/login", web::post().to(handlers::login))
                .route("/register", web::post().to(handlers::register)),
        )
        .route("/", web::get().to(pages::home))
        .route("/login", web::get().to(pages::login_page))
        .route("/login", web::post().to(pages::login_submit))
        .route("/register", web::get().to(pages::register_page))
        .route("/register", web::post().to(pages::register_submit))
        .route("/logout", web::get().to(pages::logout))
        .service(
            web::scope("/student")
                .route("", web::get().to(pages::student_dashboard))
                .route("/my-issues", web::get().to(pages::student_issues))
                .route("/raise-issue", web::get().to(pages::raise_issue_page))
                .route("/raise-issue", web::post().to(pages::raise_issue_submit)),
        )
        .service(
            web::scope("/admin")
                .route("", web::get().to(pages::admin_dashboard))
                .route("/raised-issues", web::get().to(pages::admin_raised))
                .route("/resolved-issues", web::get().to(pages::admin_resolved))
                .route("/issues/status", web::post().to(pages::admin_update_status)),
        )
        .service(
            web::scope("/facility-admin/{category}")
                .route("", web::get().to(pages::facility_dashboard))
                .route("/raised-issues", web::get().to(pages::facility_raised))
                .route("/resolved-issues", web::get().to(pages::facility_resolved))
                .route("/facilities", web::get().to(pages::facility_facilities))
                .route("/issues/status", web::post().to(pages::facility_update_status)),
        );
}
