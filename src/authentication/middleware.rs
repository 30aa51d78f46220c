use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    Error, HttpMessage, ResponseError,
};
use futures_util::{
    future::{ok, Ready},
    FutureExt,
};
use std::{
    future::Future,
    pin::Pin,
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
};

use super::jwt::{TokenError, TokenKeys};
use crate::guards::GuardError;

/// Verifies the bearer token and stores its [`Claims`](super::Claims) in the
/// request extensions.
pub struct TokenGuard {
    keys: Arc<TokenKeys>,
}

impl TokenGuard {
    pub fn new(keys: Arc<TokenKeys>) -> Self {
        Self { keys }
    }
}

impl<S, B> Transform<S, ServiceRequest> for TokenGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = TokenGuardService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(TokenGuardService {
            service: Rc::new(service),
            keys: self.keys.clone(),
        })
    }
}

pub struct TokenGuardService<S> {
    service: Rc<S>,
    keys: Arc<TokenKeys>,
}

impl<S, B> Service<ServiceRequest> for TokenGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let keys = self.keys.clone();

        async move {
            let verified = bearer_token(req.headers()).map(|token| keys.verify(&token));

            let rejection = match verified {
                Some(Ok(claims)) => {
                    req.extensions_mut().insert(claims);
                    return service.call(req).await.map(|res| res.map_into_boxed_body());
                }
                Some(Err(TokenError::Expired)) => GuardError::TokenExpired,
                Some(Err(TokenError::Invalid(e))) => {
                    tracing::debug!(error = %e, "Rejected bearer token");
                    GuardError::InvalidToken
                }
                None => GuardError::InvalidToken,
            };

            Ok(req.into_response(rejection.error_response()))
        }
        .boxed_local()
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(String::from)
}
