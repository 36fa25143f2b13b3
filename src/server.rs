//! HTTP server and routes.

mod handlers;
mod state;

pub use state::AppState;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth_register))
        .route("/login", post(handlers::auth_login))
        .route("/logout", post(handlers::auth_logout))
        .route("/me", get(handlers::auth_me));

    let book_routes = Router::new()
        .route("/", get(handlers::list_books).post(handlers::create_book))
        .route(
            "/{id}",
            get(handlers::get_book)
                .put(handlers::update_book)
                .delete(handlers::delete_book),
        )
        .route("/{id}/download", post(handlers::download_book))
        .route(
            "/{id}/reviews",
            get(handlers::book_reviews).post(handlers::create_review),
        );

    let category_routes = Router::new()
        .route(
            "/",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/{id}",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        );

    let bookmark_routes = Router::new()
        .route(
            "/",
            get(handlers::my_bookmarks).post(handlers::create_bookmark),
        )
        .route(
            "/{book_id}",
            get(handlers::bookmark_status).delete(handlers::delete_bookmark),
        );

    let progress_routes = Router::new().route(
        "/{book_id}",
        get(handlers::get_progress).put(handlers::update_progress),
    );

    let admin_routes = Router::new()
        .route("/users", get(handlers::admin_list_users))
        .route("/users/{id}/role", put(handlers::admin_update_role))
        .route("/users/{id}/block", put(handlers::admin_update_block))
        .route("/stats", get(handlers::admin_stats))
        .route("/downloads", get(handlers::admin_downloads))
        .route("/reviews", get(handlers::admin_reviews));

    Router::new()
        .route("/", get(handlers::index))
        .nest("/api/auth", auth_routes)
        .nest("/api/books", book_routes)
        .nest("/api/categories", category_routes)
        .nest("/api/bookmarks", bookmark_routes)
        .nest("/api/progress", progress_routes)
        .nest("/api/admin", admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
