use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};

use crate::auth::{validate_jwt, Claims, TokenRole};
use crate::config;
use crate::database::models::{Admin, User, ADMINS};
use crate::database::{fetch_one, DatabaseError, DatabaseManager, Repository};
use crate::error::ApiError;
use crate::query::{plan, Caller, ScopedFilterComposer};

/// Admin routes: requires an admin token whose account is still enabled.
/// Admin tokens carry the username; the resolved [`Caller`] is inserted
/// into request extensions.
pub async fn admin_auth_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let claims = claims_from_headers(&headers)?;
    if claims.role != TokenRole::Admin {
        return Err(ApiError::forbidden("Admin access required"));
    }

    let caller = if is_super_admin_id(&claims.sub) {
        Caller::admin(claims.sub, true)
    } else {
        let pool = DatabaseManager::pool().await?;
        let descriptor = ScopedFilterComposer::new(&ADMINS, &Caller::admin(claims.sub.as_str(), false))
            .equals("username", Some(claims.sub.as_str()))
            .compose(plan(None, Some(1), None, None));
        let admin: Admin = match fetch_one(&Repository::new(pool), &descriptor).await {
            Ok(admin) => admin,
            Err(DatabaseError::NotFound(_)) => return Err(ApiError::unauthorized("Admin no longer exists")),
            Err(e) => return Err(e.into()),
        };
        if !admin.status {
            return Err(ApiError::forbidden("Admin account is disabled"));
        }
        // Primary flag is read from the record so demotions apply immediately
        Caller::admin(admin.username, admin.is_primary)
    };

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

/// User routes: requires a user token whose account is still enabled.
pub async fn user_auth_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let claims = claims_from_headers(&headers)?;
    if claims.role != TokenRole::User {
        return Err(ApiError::forbidden("User access required"));
    }

    let pool = DatabaseManager::pool().await?;
    let user = User::find_by_id(&pool, &claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;
    if !user.status {
        return Err(ApiError::forbidden("User account is disabled"));
    }

    request.extensions_mut().insert(Caller::user(user.id));
    Ok(next.run(request).await)
}

/// The configured super admin, who has no row in `admins`.
pub fn is_super_admin(caller: &Caller) -> bool {
    caller.is_primary() && is_super_admin_id(&caller.id)
}

fn is_super_admin_id(id: &str) -> bool {
    config::config().security.super_admin_username.as_deref() == Some(id)
}

fn claims_from_headers(headers: &HeaderMap) -> Result<Claims, ApiError> {
    let token = extract_jwt_from_headers(headers).map_err(ApiError::unauthorized)?;
    Ok(validate_jwt(&token)?)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err("Empty JWT token".to_string()),
        None => Err("Authorization header must use Bearer token format".to_string()),
    }
}
