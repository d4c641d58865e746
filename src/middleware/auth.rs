use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::user::{AuthUser, Role};
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

fn bearer_token(req: &Request) -> Result<&str> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("Missing authorization header".to_string()))?;
    let auth_str = auth_header
        .to_str()
        .map_err(|_| Error::Unauthorized("Malformed authorization header".to_string()))?;
    auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::Unauthorized("Unsupported authorization scheme".to_string()))
}

pub fn decode_claims(token: &str, secret: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| Error::Unauthorized("Invalid or expired token".to_string()))
}

/// Verifies the bearer token, loads the account and stores an [`AuthUser`]
/// in the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let claims = decode_claims(bearer_token(&req)?, &state.jwt_secret)?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| Error::Unauthorized("Invalid token subject".to_string()))?;

    let user = state
        .users
        .find_user(user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| Error::Unauthorized("User not found or inactive".to_string()))?;

    let company_id = if user.role == Role::Hr {
        state
            .users
            .find_hr_membership(user.id)
            .await?
            .map(|m| m.company_id)
    } else {
        None
    };

    req.extensions_mut().insert(AuthUser {
        id: user.id,
        name: user.name,
        role: user.role,
        company_id,
    });
    Ok(next.run(req).await)
}

async fn require_roles(req: Request, next: Next, allowed: &[Role]) -> Result<Response> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| Error::Unauthorized("Authentication required".to_string()))?;
    if !allowed.contains(&user.role) {
        let roles: Vec<&str> = allowed.iter().map(Role::as_str).collect();
        return Err(Error::Forbidden(format!(
            "Access denied. Required role: {}",
            roles.join(" or ")
        )));
    }
    Ok(next.run(req).await)
}

pub async fn require_student(req: Request, next: Next) -> Result<Response> {
    require_roles(req, next, &[Role::Student]).await
}

pub async fn require_hr(req: Request, next: Next) -> Result<Response> {
    require_roles(req, next, &[Role::Hr]).await
}

pub async fn require_hr_or_admin(req: Request, next: Next) -> Result<Response> {
    require_roles(req, next, &[Role::Hr, Role::Admin]).await
}

pub async fn require_admin(req: Request, next: Next) -> Result<Response> {
    require_roles(req, next, &[Role::Admin]).await
}
