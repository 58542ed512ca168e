//! Glamfeed Server Library
//!
//! A small social feed: users, posts, likes and like notifications, served
//! over HTTP on top of a record store without multi-record transactions.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod identity;
pub mod models;
pub mod mutations;
pub mod routes;
pub mod security;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use constants::MAX_REQUEST_BODY_BYTES;
use identity::Identity;
use mutations::Mutations;
use store::Store;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub mutations: Mutations,
    pub identity: Identity,
    pub config: Config,
}

impl AppState {
    /// Wire the protocol and identity layers over one store handle
    pub fn new(store: Store, config: Config) -> std::result::Result<Self, String> {
        let identity = Identity::new(store.clone(), &config)?;
        Ok(Self {
            mutations: Mutations::new(store.clone()),
            identity,
            store,
            config,
        })
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any)
}

/// Build the full HTTP router
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/logout", post(routes::auth::logout))
        .route("/users", get(routes::users::list_users))
        .route("/users/me", get(routes::users::me))
        .route(
            "/users/{id}",
            get(routes::users::get_user)
                .patch(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route("/users/{id}/avatar", get(routes::users::get_avatar))
        .route(
            "/posts",
            post(routes::posts::create_post).get(routes::posts::list_posts),
        )
        .route(
            "/posts/profile/{profile_id}",
            get(routes::posts::list_profile_posts),
        )
        .route(
            "/posts/{id}",
            get(routes::posts::get_post)
                .patch(routes::posts::update_post)
                .delete(routes::posts::delete_post),
        )
        .route("/posts/{id}/like", post(routes::posts::like_post))
        .route(
            "/notifications",
            get(routes::notifications::read_notifications),
        );

    let mut app = Router::new()
        .route("/health", get(routes::health_check))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(cors_layer(&state.config));

    if state.config.log_requests {
        app = app.layer(TraceLayer::new_for_http());
    }

    app.with_state(state)
}
