use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{
    error::{AppError, AppResult},
    models::{DocumentId, Role},
    services::token_service::TokenService,
};

/// Caller identity attached to the request by [`authorize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: DocumentId,
    pub role: Role,
}

impl AuthUser {
    pub fn is_staff(&self) -> bool {
        Role::STAFF.contains(&self.role)
    }
}

/// Customers may only act on their own records; staff may act on any.
pub fn ensure_owner_or_staff(user: &AuthUser, owner: &DocumentId) -> Result<(), AppError> {
    if !user.is_staff() && &user.user_id != owner {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Missing credentials".into()))
    }
}

/// Per-route authentication and role check.
///
/// `allowed: None` admits any authenticated caller; `Some(roles)` also
/// requires the token's role to be listed.
#[derive(Clone)]
pub struct Gate {
    tokens: TokenService,
    allowed: Option<&'static [Role]>,
}

impl Gate {
    pub fn authenticated(tokens: &TokenService) -> Self {
        Self {
            tokens: tokens.clone(),
            allowed: None,
        }
    }

    pub fn roles(tokens: &TokenService, allowed: &'static [Role]) -> Self {
        Self {
            tokens: tokens.clone(),
            allowed: Some(allowed),
        }
    }

    pub fn check(&self, headers: &HeaderMap) -> AppResult<AuthUser> {
        let auth_str = headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?;

        let user = self
            .tokens
            .verify(token)
            .map_err(|err| AppError::Unauthorized(err.to_string()))?;

        if self
            .allowed
            .is_some_and(|allowed| !allowed.contains(&user.role))
        {
            tracing::debug!(user_id = %user.user_id, role = %user.role, "role not allowed");
            return Err(AppError::Forbidden);
        }

        Ok(user)
    }
}

pub async fn authorize(
    State(gate): State<Gate>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = gate.check(req.headers())?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use chrono::Duration;

    use super::*;

    fn tokens() -> TokenService {
        TokenService::new("gate-secret", Duration::hours(1))
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    fn status_of(result: AppResult<AuthUser>) -> u16 {
        result.unwrap_err().status().as_u16()
    }

    #[test]
    fn missing_header_is_unauthenticated() {
        let gate = Gate::authenticated(&tokens());
        assert_eq!(status_of(gate.check(&HeaderMap::new())), 401);
    }

    #[test]
    fn non_bearer_scheme_is_unauthenticated() {
        let gate = Gate::authenticated(&tokens());
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(status_of(gate.check(&headers)), 401);
    }

    #[test]
    fn bad_token_is_unauthenticated_even_on_open_role_list() {
        let gate = Gate::roles(&tokens(), Role::ALL);
        assert_eq!(status_of(gate.check(&bearer("garbage"))), 401);
    }

    #[test]
    fn admits_iff_role_is_listed() {
        let tokens = tokens();
        let gate = Gate::roles(&tokens, Role::STAFF);

        for role in Role::ALL {
            let token = tokens.issue(&DocumentId::generate(), *role).unwrap();
            let result = gate.check(&bearer(&token));
            if Role::STAFF.contains(role) {
                assert_eq!(result.unwrap().role, *role);
            } else {
                assert_eq!(status_of(result), 403);
            }
        }
    }

    #[test]
    fn customers_only_touch_their_own_records() {
        let me = AuthUser {
            user_id: DocumentId::generate(),
            role: Role::Customer,
        };
        let other = DocumentId::generate();
        assert!(ensure_owner_or_staff(&me, &me.user_id).is_ok());
        assert!(ensure_owner_or_staff(&me, &other).is_err());

        let clerk = AuthUser {
            role: Role::Employee,
            ..me
        };
        assert!(ensure_owner_or_staff(&clerk, &other).is_ok());
    }

    #[test]
    fn authenticated_gate_admits_every_role() {
        let tokens = tokens();
        let gate = Gate::authenticated(&tokens);
        let id = DocumentId::generate();
        let token = tokens.issue(&id, Role::Customer).unwrap();

        let user = gate.check(&bearer(&token)).unwrap();
        assert_eq!(user.user_id, id);
        assert!(!user.is_staff());
    }
}
