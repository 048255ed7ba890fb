use async_trait::async_trait;
use axum::http::{self};
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use serde::Deserialize;
use tracing::info;

use super::invitation::InviteError;

/// A caller identity as vouched for by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub name: String,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify an identity token, failing with `InviteError::InvalidToken`.
    async fn verify(&self, token: &str) -> Result<Identity, InviteError>;
}

#[derive(Debug, Deserialize)]
struct IdentityClaims {
    email: String,
    name: Option<String>,
}

/// Verifies HS256-signed identity tokens carrying `email` and `name` claims.
pub struct JwtIdentityVerifier {
    secret: String,
}

impl JwtIdentityVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, InviteError> {
        let token_data =
            validate_jwt(token, &self.secret).map_err(|e| InviteError::InvalidToken(e.to_string()))?;
        let claims = token_data.claims;
        info!("Identity token validated for {}", claims.email);
        Ok(Identity {
            name: claims.name.unwrap_or_else(|| claims.email.clone()),
            email: claims.email,
        })
    }
}

// Validate a JWT token and return the token data
fn validate_jwt(
    token: &str,
    secret: &str,
) -> Result<TokenData<IdentityClaims>, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<IdentityClaims>(token, &decoding_key, &validation)
}

// Get the bearer token from a request
pub fn get_auth_token<B>(req: &http::Request<B>) -> Result<String, String> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;
    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header".to_string())?;
    Ok(auth_str
        .strip_prefix("Bearer ")
        .unwrap_or(auth_str)
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct Claims<'a> {
        email: &'a str,
        name: Option<&'a str>,
        exp: i64,
    }

    fn token(secret: &str, name: Option<&str>, exp_offset: i64) -> String {
        let claims = Claims {
            email: "owner@example.com",
            name,
            exp: (Utc::now() + Duration::seconds(exp_offset)).timestamp(),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[tokio::test]
    async fn accepts_a_valid_token() {
        let verifier = JwtIdentityVerifier::new("secret");
        let identity = verifier.verify(&token("secret", Some("Olive Owner"), 600)).await.unwrap();
        assert_eq!(
            identity,
            Identity {
                email: "owner@example.com".into(),
                name: "Olive Owner".into()
            }
        );
    }

    #[tokio::test]
    async fn falls_back_to_email_for_the_display_name() {
        let verifier = JwtIdentityVerifier::new("secret");
        let identity = verifier.verify(&token("secret", None, 600)).await.unwrap();
        assert_eq!(identity.name, "owner@example.com");
    }

    #[tokio::test]
    async fn rejects_bad_signature_and_expired_tokens() {
        let verifier = JwtIdentityVerifier::new("secret");
        let forged = verifier.verify(&token("other", Some("x"), 600)).await;
        assert!(matches!(forged, Err(InviteError::InvalidToken(_))));

        let expired = verifier.verify(&token("secret", Some("x"), -3600)).await;
        assert!(matches!(expired, Err(InviteError::InvalidToken(_))));

        let garbage = verifier.verify("not-a-jwt").await;
        assert!(matches!(garbage, Err(InviteError::InvalidToken(_))));
    }

    #[test]
    fn reads_bearer_token_from_header() {
        let req = http::Request::builder()
            .header(http::header::AUTHORIZATION, "Bearer abc")
            .body(())
            .unwrap();
        assert_eq!(get_auth_token(&req).unwrap(), "abc");

        let req = http::Request::builder().body(()).unwrap();
        assert!(get_auth_token(&req).is_err());
    }
}
