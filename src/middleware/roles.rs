use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, ResponseError,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

use super::auth::Claims;
use crate::models::Role;
use crate::utils::AppError;

/// Role allow-list guard. Must be wrapped inside [`super::AuthMiddleware`]
/// (i.e. registered before it with `.wrap`) so the claims are already present.
pub struct RequireRole {
    allowed: Rc<[Role]>,
}

impl RequireRole {
    pub fn any_of(roles: &[Role]) -> Self {
        Self {
            allowed: Rc::from(roles),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleService {
            service,
            allowed: Rc::clone(&self.allowed),
        }))
    }
}

pub struct RequireRoleService<S> {
    service: S,
    allowed: Rc<[Role]>,
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let claims = req.extensions().get::<Claims>().cloned();

        let verdict = match claims {
            Some(claims) => ensure_role(&claims, &self.allowed),
            None => Err(AppError::Unauthorized("Missing authorization token".to_string())),
        };

        if let Err(err) = verdict {
            return Box::pin(async move {
                Ok(req.into_response(err.error_response()).map_into_right_body())
            });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_left_body())
        })
    }
}

pub fn ensure_role(claims: &Claims, allowed: &[Role]) -> Result<(), AppError> {
    if claims.has_any_role(allowed) {
        Ok(())
    } else {
        log::warn!(
            "⛔ {} ({:?}) is not one of {:?}",
            claims.uid,
            claims.role,
            allowed
        );
        Err(AppError::Forbidden("You do not have permission to perform this action".to_string()))
    }
}

/// Owner-or-admin rule shared by every edit/delete handler.
pub fn ensure_owner_or_admin(claims: &Claims, owner_uid: &str) -> Result<(), AppError> {
    if claims.uid == owner_uid || claims.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Only the owner or an admin can modify this resource".to_string()))
    }
}
