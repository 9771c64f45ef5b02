//! API-key authentication for the management API.
//!
//! Callers present their key in the `X-Api-Key` header. The [`crate::middleware::ApiKeyMiddlewareFactory`]
//! validates it against the configured key set and attaches the matching [`ApiClaims`] to the request. The
//! ACL middleware and handlers read the claims from the request extensions; handlers can also take them as an
//! extractor argument.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use donation_engine::db_types::Role;
use serde::{Deserialize, Serialize};

use crate::{config::ApiKeyEntry, errors::ServerError};

pub const API_KEY_HEADER: &str = "X-Api-Key";

/// The identity and capabilities of an authenticated API caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiClaims {
    pub actor_id: String,
    pub roles: Vec<Role>,
}

impl ApiClaims {
    pub fn has_roles(&self, required: &[Role]) -> bool {
        required.iter().all(|role| self.roles.contains(role))
    }
}

impl FromRequest for ApiClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<ApiClaims>().cloned();
        ready(claims.ok_or(ServerError::Unauthorized))
    }
}

/// Looks up the presented key in the configured key set. Comparison is exact; keys are opaque strings.
pub fn validate_api_key(presented: &str, keys: &[ApiKeyEntry]) -> Option<ApiClaims> {
    keys.iter()
        .find(|entry| entry.key.reveal() == presented)
        .map(|entry| ApiClaims { actor_id: entry.actor_id.clone(), roles: entry.roles.clone() })
}
