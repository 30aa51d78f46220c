use super::jwt::Claims;
use crate::{
    configuration::AuthSettings,
    guards::{parse_user_id, GuardError},
};
use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, ResponseError,
};
use anyhow::Context as _;
use casbin::{CoreApi, DefaultModel, Enforcer, FileAdapter};
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

pub async fn load_enforcer(settings: &AuthSettings) -> Result<Enforcer, anyhow::Error> {
    let model = DefaultModel::from_file(&settings.casbin_model)
        .await
        .with_context(|| format!("Failed to load casbin model {}", settings.casbin_model))?;
    let adapter = FileAdapter::new(settings.casbin_policy.clone());

    Enforcer::new(model, adapter)
        .await
        .with_context(|| format!("Failed to load casbin policy {}", settings.casbin_policy))
}

/// Decides `(role, path, method, ownership)` with casbin. Ownership is `self`
/// when the token subject is the `{id}` of the path and `other` otherwise.
///
/// Must run inside [`TokenGuard`](super::TokenGuard).
pub struct PermissionGuard {
    enforcer: Arc<Enforcer>,
}

impl PermissionGuard {
    pub fn new(enforcer: Arc<Enforcer>) -> Self {
        Self { enforcer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for PermissionGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = PermissionGuardService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(PermissionGuardService {
            service: Rc::new(service),
            enforcer: self.enforcer.clone(),
        })
    }
}

pub struct PermissionGuardService<S> {
    service: Rc<S>,
    enforcer: Arc<Enforcer>,
}

impl<S, B> Service<ServiceRequest> for PermissionGuardService<S>
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
        let enforcer = self.enforcer.clone();

        async move {
            let claims = req.extensions().get::<Claims>().cloned();
            let Some(claims) = claims else {
                return Ok(req.into_response(GuardError::InvalidToken.error_response()));
            };

            let ownership = if owns_target(&claims, req.match_info().get("id")) {
                "self"
            } else {
                "other"
            };

            let sub = claims.role.clone();
            let obj = req.path().to_string();
            let act = req.method().to_string();

            match enforcer.enforce((sub, obj, act, ownership.to_string())) {
                Ok(true) => service.call(req).await.map(|res| res.map_into_boxed_body()),
                Ok(false) => Ok(req.into_response(GuardError::Forbidden.error_response())),
                Err(e) => {
                    let error = GuardError::UnexpectedError(
                        anyhow::Error::new(e).context("Failed to evaluate casbin policy"),
                    );
                    Ok(req.into_response(error.error_response()))
                }
            }
        }
        .boxed_local()
    }
}

/// Ids are compared as numbers, so `/users/007` belongs to subject `7`.
fn owns_target(claims: &Claims, target: Option<&str>) -> bool {
    let subject = claims.sub.parse::<i64>().ok();
    let target = target.and_then(parse_user_id);
    subject.zip(target).is_some_and(|(subject, target)| subject == target)
}
