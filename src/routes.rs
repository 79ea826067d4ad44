// src/routes.rs

use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{
        admin, auth, community, dashboard, gamification, interaction, products, profile, search,
        social,
    },
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, posts, products, users, dashboard, ...).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/consent", get(auth::parental_consent));

    let profile_routes = Router::new()
        .route("/profile", get(profile::get_profile))
        .route("/update", put(profile::update_profile))
        .layer(auth.clone());

    let social_routes = Router::new()
        .route("/{id}/followers", get(social::list_followers))
        .route("/{id}/following", get(social::list_following))
        // Protected social routes
        .merge(
            Router::new()
                .route("/{id}/follow", post(social::follow).delete(social::unfollow))
                .layer(auth.clone()),
        );

    let post_routes = Router::new()
        .route("/", get(community::list_posts))
        .route("/{id}", get(community::get_post))
        .route("/{id}/comments", get(interaction::list_comments))
        // Protected post routes
        .merge(
            Router::new()
                .route("/", post(community::create_post))
                .route("/{id}", delete(community::delete_post))
                .route(
                    "/{id}/like",
                    post(interaction::toggle_like).delete(interaction::unlike),
                )
                .route("/{id}/like/strict", post(interaction::like_or_reject))
                .route("/{id}/comments", post(interaction::create_comment))
                .route("/{id}/report", post(interaction::report_post))
                .layer(auth.clone()),
        );

    let product_routes = Router::new()
        .route("/", get(products::list_products))
        .route("/{id}", get(products::get_product))
        // Protected product routes
        .merge(
            Router::new()
                .route("/purchased", get(products::list_purchased))
                .route("/{id}/purchase", post(products::purchase_product))
                .route("/{id}/download", post(products::register_download))
                .layer(auth.clone()),
        );

    let dashboard_routes = Router::new()
        .route("/", get(dashboard::get_dashboard))
        .layer(auth);

    let gamification_routes = Router::new()
        .route("/ranking", get(gamification::get_ranking))
        .route("/badges/{user_id}", get(gamification::get_badges));

    // Mounted without the auth layer.
    let admin_routes = Router::new()
        .route("/analytics", get(admin::get_analytics))
        .route("/stats", get(admin::get_stats));

    Router::new()
        .route("/api/ping", get(|| async { Json(serde_json::json!({ "pong": true })) }))
        .nest("/api/auth", auth_routes)
        .nest("/api/user", profile_routes)
        .nest("/api/users", social_routes)
        .nest("/api/posts", post_routes)
        .nest("/api/products", product_routes)
        .nest("/api/dashboard", dashboard_routes)
        .route("/api/search", get(search::search))
        .nest("/api/gamification", gamification_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
