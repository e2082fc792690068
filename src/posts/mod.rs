use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::feed))
        .route("/post/new", post(handlers::create_post))
        .route("/post/:id", get(handlers::get_post))
        .route("/post/:id/edit", post(handlers::edit_post))
        .route("/post/:id/delete", post(handlers::delete_post))
        .route("/user/:fullname", get(handlers::user_feed))
}
