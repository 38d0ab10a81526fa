use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::policy::Role;

/// Bearer identity supplied by the external auth service. The middleware
/// only authenticates; role-based gating happens in the policy module with
/// the role threaded explicitly into each service call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

impl Claims {
    pub fn role(&self) -> Result<Role> {
        let raw = self
            .role
            .as_deref()
            .ok_or_else(|| Error::Forbidden("token carries no role claim".to_string()))?;
        Role::parse(raw)
            .ok_or_else(|| Error::Forbidden(format!("unrecognized role '{}'", raw)))
    }
}

/// Rejections go through the shared error type so 401 bodies carry the same
/// `{error, code}` shape as every other failure.
pub async fn require_bearer_auth(mut req: Request, next: Next) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return Error::Unauthenticated("missing authorization header".to_string())
            .into_response();
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Error::Unauthenticated("malformed authorization header".to_string())
            .into_response();
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Error::Unauthenticated("authorization scheme must be Bearer".to_string())
            .into_response();
    };

    let config = crate::config::get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => {
            req.extensions_mut().insert(data.claims);
            next.run(req).await
        }
        Err(_) => Error::Unauthenticated("invalid or expired token".to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    fn guarded_app() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(require_bearer_auth))
    }

    #[tokio::test]
    async fn missing_authorization_header_is_unauthenticated() {
        let response = guarded_app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "unauthenticated");
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_unauthenticated() {
        let response = guarded_app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("Authorization", "Basic Zm9vOmJhcg==")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "unauthenticated");
    }

    #[test]
    fn role_claim_parses_into_policy_roles() {
        let claims = Claims {
            sub: "user".to_string(),
            exp: 0,
            role: Some("recruiter".to_string()),
        };
        assert!(matches!(claims.role(), Ok(Role::Recruiter)));

        let missing = Claims {
            sub: "user".to_string(),
            exp: 0,
            role: None,
        };
        assert!(missing.role().is_err());
    }
}
