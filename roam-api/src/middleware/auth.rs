use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use roam_catalog::Actor;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_HOST: &str = "HOST";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Catalog actor for these claims. Hosts must carry their id in `sub`.
    pub fn actor(&self) -> Result<Actor, AppError> {
        if self.is_admin() {
            return Ok(Actor::Admin);
        }
        Uuid::parse_str(&self.sub)
            .map(Actor::Host)
            .map_err(|_| AppError::AuthenticationError("Token subject is not a host id".to_string()))
    }
}

fn bearer_claims(state: &AppState, req: &Request) -> Result<Claims, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::AuthenticationError(format!("Invalid token: {}", e)))
}

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = bearer_claims(&state, &req)?;
    if !claims.is_admin() {
        return Err(AppError::AuthorizationError("Admin access required".to_string()));
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Lets hosts and admins through.
pub async fn host_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = bearer_claims(&state, &req)?;
    if claims.role != ROLE_HOST && !claims.is_admin() {
        return Err(AppError::AuthorizationError("Host access required".to_string()));
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str, role: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            role: role.to_string(),
            exp: 0,
        }
    }

    #[test]
    fn test_actor_from_claims() {
        assert_eq!(claims("anything", ROLE_ADMIN).actor().unwrap(), Actor::Admin);

        let host = Uuid::new_v4();
        assert_eq!(claims(&host.to_string(), ROLE_HOST).actor().unwrap(), Actor::Host(host));
        assert!(claims("not-a-uuid", ROLE_HOST).actor().is_err());
    }
}
