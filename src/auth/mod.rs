use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/auth/refresh", post(handlers::refresh))
        .route("/logout", get(handlers::logout))
        .route("/reset_password", post(handlers::reset_request))
        .route("/reset_password/:token", post(handlers::reset_confirm))
}
