/// Authentication extractors and utilities
use crate::{
    admin::Role, api::middleware::extract_bearer_token, context::AppContext, error::HubError,
    error::HubResult,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by an admin bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Admin identity (email or user id)
    pub sub: String,
    /// Tenant whose stores the token may touch
    pub tenant: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub exp: i64,
    pub iat: i64,
}

/// Admin authentication context
///
/// Extracted per request and passed to handlers by value; nothing about the
/// caller is held in shared state.
#[derive(Debug, Clone)]
pub struct AdminAuthContext {
    pub subject: String,
    pub tenant: String,
    pub role: Role,
}

#[async_trait]
impl FromRequestParts<AppContext> for AdminAuthContext {
    type Rejection = HubError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        // Extract bearer token
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| HubError::Authentication("Missing authorization header".to_string()))?;

        let claims = verify_jwt_token(&token, &state.config.authentication.jwt_secret)?;

        if claims.tenant.trim().is_empty() {
            return Err(HubError::Authentication(
                "Invalid JWT: missing 'tenant' claim".to_string(),
            ));
        }

        // Check if subject is in configured admin ids list
        let is_configured_admin = state
            .config
            .authentication
            .admin_ids
            .contains(&claims.sub);

        let role = if is_configured_admin {
            tracing::debug!(subject = %claims.sub, "configured admin, granting superadmin");
            Role::SuperAdmin
        } else if let Some(role) = claims.role {
            role
        } else {
            tracing::warn!(subject = %claims.sub, "token carries no admin role");
            return Err(HubError::Authorization("Admin role required".to_string()));
        };

        Ok(AdminAuthContext {
            subject: claims.sub,
            tenant: claims.tenant,
            role,
        })
    }
}

/// Macro to require specific admin role
/// Usage: require_admin_role!(auth, Role::SuperAdmin);
#[macro_export]
macro_rules! require_admin_role {
    ($auth:expr, $required:expr) => {
        if !$auth.role.can_act_as($required) {
            return Err($crate::error::HubError::Authorization(format!(
                "Requires {} role or higher",
                $required.as_str()
            )));
        }
    };
}

/// Verify a JWT token with full validation
///
/// This performs:
/// 1. JWT signature verification
/// 2. Expiration checking
/// 3. Claims validation
pub fn verify_jwt_token(token: &str, jwt_secret: &str) -> HubResult<AdminClaims> {
    let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    // Allow some clock skew (5 minutes)
    validation.leeway = 300;

    decode::<AdminClaims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::warn!("JWT verification failed: {}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    HubError::Authentication("Token has expired".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    HubError::Authentication("Invalid token signature".to_string())
                }
                _ => HubError::Authentication(format!("Invalid token: {}", e)),
            }
        })
}

/// Sign an admin token valid for `ttl`
pub fn issue_token(
    jwt_secret: &str,
    subject: &str,
    tenant: &str,
    role: Option<Role>,
    ttl: chrono::Duration,
) -> HubResult<String> {
    let now = Utc::now();
    let claims = AdminClaims {
        sub: subject.to_string(),
        tenant: tenant.to_string(),
        role,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| HubError::Internal(format!("Failed to sign token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_issue_and_verify() {
        let token = issue_token(
            SECRET,
            "ops@acme.com",
            "acme",
            Some(Role::Admin),
            chrono::Duration::hours(1),
        )
        .unwrap();
        let claims = verify_jwt_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "ops@acme.com");
        assert_eq!(claims.tenant, "acme");
        assert_eq!(claims.role, Some(Role::Admin));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token =
            issue_token(SECRET, "a", "acme", None, chrono::Duration::hours(1)).unwrap();
        let err = verify_jwt_token(&token, "another-secret-another-secret-xx").unwrap_err();
        assert!(matches!(err, HubError::Authentication(_)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = issue_token(
            SECRET,
            "a",
            "acme",
            Some(Role::Admin),
            chrono::Duration::hours(-2),
        )
        .unwrap();
        let err = verify_jwt_token(&token, SECRET).unwrap_err();
        assert_eq!(err.to_string(), "Authentication failed: Token has expired");
    }
}
