//! Caller identity.
//!
//! Access tokens are issued elsewhere (the storefront's auth service) and signed with a shared HS256 secret. The server
//! only verifies them. The claims carry the account id in `sub`, optional contact details, and a list of roles.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::HeaderValue, FromRequest, HttpMessage, HttpRequest};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use livique_engine::db_types::{CustomerContact, UserId};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{config::AuthConfig, errors::AuthError, errors::ServerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The account id
    pub sub: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
    pub exp: i64,
}

impl JwtClaims {
    pub fn user_id(&self) -> &UserId {
        &self.sub
    }

    /// Admins implicitly hold the `User` role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role) || (role == Role::User && self.roles.contains(&Role::Admin))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// True if the caller may read data that belongs to `owner`.
    pub fn can_access(&self, owner: &UserId) -> bool {
        &self.sub == owner || self.is_admin()
    }

    /// Contact details from the request, falling back to those in the token.
    pub fn contact(&self, name: Option<String>, email: Option<String>) -> CustomerContact {
        CustomerContact::new(name.or_else(|| self.name.clone()), email.or_else(|| self.email.clone()))
    }
}

/// Handlers on authenticated routes take `JwtClaims` as an argument. The claims are placed in the request extensions by
/// [`crate::middleware::JwtMiddlewareFactory`].
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned();
        ready(claims.ok_or_else(|| {
            warn!("💻️ No JWT claims found in request extensions for {}", req.path());
            ServerError::AuthenticationError(AuthError::MissingToken)
        }))
    }
}

#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 30;
        Self { key, validation }
    }

    pub fn verify(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let claims = decode::<JwtClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                    AuthError::PoorlyFormattedToken(e.to_string())
                },
                _ => AuthError::ValidationError(e.to_string()),
            })?;
        if claims.sub.is_empty() {
            return Err(AuthError::ValidationError("The token does not name an account".into()));
        }
        trace!("🔐️ Access token validated for {}", claims.sub);
        Ok(claims)
    }

    /// Verifies the token in an `Authorization: Bearer <token>` header.
    pub fn verify_header(&self, header: Option<&HeaderValue>) -> Result<JwtClaims, AuthError> {
        let header = header.ok_or(AuthError::MissingToken)?;
        let value = header.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected a bearer token".into()))?;
        self.verify(token)
    }
}
