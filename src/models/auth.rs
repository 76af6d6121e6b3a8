//! Identity carried by the session cookie.
//!
//! The auth service issues an HS256 JWT; the identity cookie stores it and
//! every request decodes it again with the shared secret.

use std::future::{Ready, ready};

use actix_identity::IdentityExt;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::types::{Email, PersonName, TypeConstraintError};
use crate::models::config::ServerConfig;
use crate::services::ServiceError;

/// Claims of the identity token.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AuthenticatedUser {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub exp: usize,
}

impl AuthenticatedUser {
    pub fn from_jwt(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )?;
        Ok(data.claims)
    }

    pub fn to_jwt(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        encode(
            &Header::new(Algorithm::HS256),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Normalized email, the key memberships and invitations are matched on.
    pub fn email_address(&self) -> Result<Email, TypeConstraintError> {
        Email::new(self.email.as_str())
    }

    /// Display name, falling back to the email when the claim is blank.
    pub fn person_name(&self) -> Result<PersonName, TypeConstraintError> {
        PersonName::new(self.name.as_str()).or_else(|_| PersonName::new(self.email.as_str()))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, ServiceError> {
    let config = req
        .app_data::<web::Data<ServerConfig>>()
        .ok_or_else(|| ServiceError::Internal("server config missing".to_string()))?;
    let token = req
        .get_identity()
        .and_then(|identity| identity.id())
        .map_err(|_| ServiceError::Unauthorized)?;

    AuthenticatedUser::from_jwt(&token, &config.secret).map_err(|err| {
        log::warn!("Rejected identity token: {err}");
        ServiceError::Unauthorized
    })
}

impl FromRequest for AuthenticatedUser {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
