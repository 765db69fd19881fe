use axum::{
    middleware::from_fn,
    routing::{delete, get, patch, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::database::DatabaseManager;
use crate::handlers::{admin, task, user};
use crate::middleware::{admin_auth_middleware, user_auth_middleware};

/// Full application router
pub fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Protected
        .merge(admin_routes())
        .merge(user_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router {
    Router::new()
        .route("/admin/login", post(admin::login))
        .route("/user/register", post(user::register))
        .route("/user/login", post(user::login))
}

fn admin_routes() -> Router {
    Router::new()
        .route("/admin/auth", get(admin::auth))
        .route("/admin/logout", post(admin::logout))
        .route(
            "/admin",
            post(admin::create).get(admin::list).patch(admin::update).delete(admin::delete),
        )
        .route("/user", get(user::list).delete(user::delete))
        .route("/user/details/:userId", get(user::details))
        .route("/user/status", patch(user::update_status))
        .route("/task/fetch-by-admin", get(task::list))
        .route("/task/fetch-by-admin/details/:todoId", get(task::details))
        .route("/task/delete-by-admin", delete(task::delete_by_admin))
        .route_layer(from_fn(admin_auth_middleware))
}

fn user_routes() -> Router {
    Router::new()
        .route("/user/auth", get(user::auth))
        .route("/user/logout", post(user::logout))
        .route("/user/home", get(user::home))
        .route(
            "/task",
            post(task::create).patch(task::update).delete(task::delete).get(task::list),
        )
        .route("/task/status", patch(task::update_status))
        .route("/task/details/:todoId", get(task::details))
        .route_layer(from_fn(user_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Todo API (Rust)",
            "version": version,
            "description": "Multi-tenant todo backend with scoped pagination, filtering and search",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "admin": "/admin/login (public), /admin[/auth|/logout] (admin)",
                "user": "/user/register, /user/login (public), /user/auth|logout|home (user), /user[/details/:userId|/status] (admin)",
                "task": "/task[/status|/details/:todoId] (user), /task/fetch-by-admin[/details/:todoId], /task/delete-by-admin (admin)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
