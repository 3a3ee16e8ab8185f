use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::auth::auth_middleware;
use crate::handlers::comments as comment_handlers;
use crate::store::CommentStore;
use crate::Config;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CommentStore>,
    pub config: Config,
}

pub fn create_router(store: Arc<dyn CommentStore>, config: Config) -> Router {
    let state = AppState { store, config };

    // Comment routes (nested under tasks)
    let comment_routes = Router::new()
        .route(
            "/",
            get(comment_handlers::list_comments).post(comment_handlers::create_comment),
        )
        .route(
            "/:comment_id",
            put(comment_handlers::update_comment).delete(comment_handlers::delete_comment),
        );

    // Protected routes with auth middleware
    let protected_routes = Router::new()
        .nest("/tasks/:task_id/comments", comment_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
