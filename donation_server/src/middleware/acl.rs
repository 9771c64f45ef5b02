//! Access control list middleware for the donation server.
//! This middleware can be placed on any route or service.
//!
//! It will look up the [`ApiClaims`] attached to the request by the API-key middleware and check the roles in
//! the claims against the required roles for the route. If the caller has the required roles, the request
//! will be allowed to continue. Otherwise, a 403 Forbidden response will be returned.

use std::pin::Pin;
use std::rc::Rc;
use actix_web::dev::{forward_ready, Service, Transform};
use actix_web::{dev::ServiceRequest, dev::ServiceResponse, Error, HttpMessage};
use actix_web::error::{ErrorForbidden, ErrorInternalServerError};
use donation_engine::db_types::Role;
use futures::future::{ok, Ready};
use futures::Future;
use crate::auth::ApiClaims;

pub struct AclMiddlewareFactory {
    required_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(required_roles: &[Role]) -> Self {
        AclMiddlewareFactory { required_roles: required_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
    where
        S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
        S::Future: 'static,
        B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AclMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService {
            required_roles: self.required_roles.clone(),
            service: Rc::new(service),
        })
    }
}

pub struct AclMiddlewareService<S> {
    required_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
    where
        S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
        S::Future: 'static,
        B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required_roles = self.required_roles.clone();
        Box::pin( async move {
            let claims = req.extensions().get::<ApiClaims>()
                .ok_or_else(|| {
                    log::warn!("No API claims found in request extensions");
                    ErrorInternalServerError("No API claims found in request extensions")
                })?.clone();
            if claims.has_roles(&required_roles) {
                service.call(req).await
            } else {
                Err(ErrorForbidden("Insufficient permissions"))
            }
        })
    }
}
