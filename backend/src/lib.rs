//! HTTP backend for the MedipolDAO Digiathon real-estate tokenization platform.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod mesken;
pub mod models;
pub mod schema;
pub mod solana;
pub mod store;
pub mod users;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

pub use handlers::AppState;

pub fn router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/user_exists", get(users::user_exists).post(users::user_exists))
        .route("/get_users", get(users::get_users))
        .route("/get_user_by_tckn", post(users::get_user_by_tckn))
        .route("/get_user", post(users::get_user_by_address))
        .route("/set_user", post(users::set_user))
        .route("/update_public_address", post(users::update_public_address))
        .route("/user_jwt", post(users::user_jwt))
        .route("/login", post(users::login))
        .route("/verify", post(users::verify))
        .route("/nonce", post(users::nonce))
        .route("/wallet_login", post(users::wallet_login));

    let mesken_routes = Router::new()
        .route("/set_mesken", post(mesken::set_mesken))
        .route("/get_mesken", post(mesken::get_mesken))
        .route("/get_meskens_on_sale", get(mesken::get_meskens_on_sale))
        .route("/my_meskens", get(mesken::my_meskens))
        .route("/update_mesken", post(mesken::update_mesken))
        .route("/put_mesken_on_sale", post(mesken::put_mesken_on_sale))
        .route("/cancel_mesken_sale", post(mesken::cancel_mesken_sale))
        .route("/buy_mesken", post(mesken::buy_mesken))
        .route("/add_maintenance", post(mesken::add_maintenance));

    Router::new()
        .route("/", get(handlers::root))
        .merge(user_routes)
        .merge(mesken_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
