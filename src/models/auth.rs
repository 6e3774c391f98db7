//! Bearer-token identity extracted from incoming requests.

use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, web};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::domain::auth::Actor;
use crate::domain::types::{OrganizationId, TypeConstraintError, UserId};
use crate::models::config::ServerConfig;

/// Claims carried by the HS256 bearer token.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// User id, as a decimal string.
    pub sub: String,
    pub email: String,
    pub name: String,
    pub organization_id: i32,
    pub exp: usize,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid bearer token")]
    InvalidToken,

    #[error("authentication is not configured")]
    NotConfigured,
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let code = match self {
            AuthError::MissingToken | AuthError::InvalidToken => "UNAUTHORIZED",
            AuthError::NotConfigured => "INTERNAL_ERROR",
        };
        HttpResponse::build(self.status_code()).json(json!({
            "error": { "code": code, "message": self.to_string() }
        }))
    }
}

impl AuthenticatedUser {
    /// Decodes and verifies an HS256 token.
    pub fn from_token(token: &str, secret: &str) -> Result<Self, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|err| {
            log::warn!("Rejected bearer token: {err}");
            AuthError::InvalidToken
        })
    }

    /// Signs the claims as an HS256 token.
    pub fn to_token(&self, secret: &str) -> Result<String, AuthError> {
        encode(
            &Header::new(Algorithm::HS256),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|err| {
            log::error!("Failed to sign token: {err}");
            AuthError::InvalidToken
        })
    }

    /// Identity passed into the services.
    pub fn actor(&self) -> Result<Actor, TypeConstraintError> {
        let user_id = self
            .sub
            .parse::<i32>()
            .map_err(|_| TypeConstraintError::InvalidValue(format!("user id `{}`", self.sub)))?;
        Ok(Actor::new(
            UserId::new(user_id)?,
            OrganizationId::new(self.organization_id)?,
        ))
    }

    fn from_http_request(req: &HttpRequest) -> Result<Self, AuthError> {
        let config = req
            .app_data::<web::Data<ServerConfig>>()
            .ok_or(AuthError::NotConfigured)?;

        let header = req
            .headers()
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidToken)?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidToken)?;

        let user = Self::from_token(token, &config.secret)?;
        // Claims that cannot form an actor are treated as a bad token.
        user.actor().map_err(|_| AuthError::InvalidToken)?;
        Ok(user)
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_http_request(req))
    }
}
