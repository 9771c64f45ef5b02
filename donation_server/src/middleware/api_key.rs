//! API-key middleware for the `/api` scope.
//!
//! Every request entering the scope must carry a configured key in the `X-Api-Key` header. A valid key
//! attaches the caller's [`ApiClaims`] to the request extensions, where the ACL middleware and the handlers
//! find them. A missing or unknown key is rejected with 401 before any handler runs.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorUnauthorized,
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};

use crate::{
    auth::{validate_api_key, ApiClaims, API_KEY_HEADER},
    config::ApiKeyEntry,
};

pub struct ApiKeyMiddlewareFactory {
    keys: Rc<Vec<ApiKeyEntry>>,
}

impl ApiKeyMiddlewareFactory {
    pub fn new(keys: Vec<ApiKeyEntry>) -> Self {
        ApiKeyMiddlewareFactory { keys: Rc::new(keys) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = ApiKeyMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyMiddlewareService { keys: Rc::clone(&self.keys), service: Rc::new(service) }))
    }
}

pub struct ApiKeyMiddlewareService<S> {
    keys: Rc<Vec<ApiKeyEntry>>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let keys = Rc::clone(&self.keys);
        Box::pin(async move {
            let presented = req.headers().get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
            let Some(presented) = presented else {
                warn!("🔑️ No API key in request to {}. Denying access.", req.path());
                return Err(ErrorUnauthorized("API key required."));
            };
            match validate_api_key(presented, &keys) {
                Some(claims) => {
                    trace!("🔑️ API key accepted for {}", claims.actor_id);
                    req.extensions_mut().insert::<ApiClaims>(claims);
                    service.call(req).await
                },
                None => {
                    warn!("🔑️ Unknown API key in request to {}. Denying access.", req.path());
                    Err(ErrorUnauthorized("Invalid API key."))
                },
            }
        })
    }
}
