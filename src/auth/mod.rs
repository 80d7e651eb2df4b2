//! Accounts and bearer-token authentication.

pub mod accounts;
pub mod password;
pub mod token;

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};

use crate::api::error::ApiError;
use crate::error::MeetError;
use crate::meeting::UserSummary;

pub use accounts::{AccountService, RegisterRequest, UserProfile};
pub use token::{Claims, TokenIssuer, TokenPair, TokenType};

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

/// The caller identified by a valid access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub UserSummary);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<TokenIssuer>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            MeetError::unauthorized("Authentication credentials were not provided.")
        })?;

        let issuer = Arc::<TokenIssuer>::from_ref(state);
        let claims = issuer.verify(token, TokenType::Access)?;
        Ok(AuthUser(claims.user()))
    }
}
