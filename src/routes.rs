use axum::{Router, middleware};
use tower_http::trace::TraceLayer;

use crate::{
    AppState,
    handler::{
        auth::auth_handler,
        catalog::{category_handler, world_cup_handler},
        comment::comment_handler,
        post::post_handler,
        report::report_handler,
        users::users_handler,
    },
    middleware::auth,
};

pub fn create_router(app_state: AppState) -> Router {
    let api_route = Router::new()
        .nest("/auth", auth_handler(app_state.clone()))
        .nest(
            "/users",
            users_handler().layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        // /posts carries the nested /{post_id}/comments and
        // /{post_id}/reaction routers
        .nest("/posts", post_handler(app_state.clone()))
        // single-comment operations (edit/delete/report)
        .nest("/comments", comment_handler(app_state.clone()))
        .nest("/reports", report_handler(app_state.clone()))
        .nest("/categories", category_handler(app_state.clone()))
        .nest("/worldcups", world_cup_handler(app_state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    Router::new().nest("/api", api_route)
}
