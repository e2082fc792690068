use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod handlers;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/account", get(handlers::account))
        .route("/account-settings", post(handlers::settings))
        .route(
            "/user/:fullname/delete",
            get(handlers::delete_user_stub).post(handlers::delete_user_stub),
        )
}
