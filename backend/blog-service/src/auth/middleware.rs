use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::{ready, Ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use super::{CurrentUser, SessionKeys, SESSION_COOKIE};

/// Session Middleware
///
/// Never rejects a request. A valid `sessionid` cookie puts a [`CurrentUser`]
/// into the request extensions; a missing, forged or expired one leaves the
/// request anonymous.
pub struct SessionMiddleware {
    keys: SessionKeys,
}

impl SessionMiddleware {
    pub fn new(keys: SessionKeys) -> Self {
        Self { keys }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = SessionMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddlewareService {
            service: Rc::new(service),
            keys: self.keys.clone(),
        }))
    }
}

pub struct SessionMiddlewareService<S> {
    service: Rc<S>,
    keys: SessionKeys,
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
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
        let service = self.service.clone();

        if let Some(cookie) = req.cookie(SESSION_COOKIE) {
            match self.keys.verify(cookie.value()) {
                Ok(user) => {
                    req.extensions_mut().insert::<CurrentUser>(user);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Ignoring invalid session cookie");
                }
            }
        }

        Box::pin(async move { service.call(req).await })
    }
}
