use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    web, Error, HttpMessage, ResponseError,
};
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;

use crate::models::Role;
use crate::services::identity_service::IdentityProvider;
use crate::utils::AppError;

/// Decoded identity attached to every authenticated request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub uid: String,
    pub email: String,
    /// Absent until the user registers and the role claim is written.
    pub role: Option<Role>,
    pub verified: bool,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }

    pub fn has_any_role(&self, allowed: &[Role]) -> bool {
        self.role.map_or(false, |role| allowed.contains(&role))
    }
}

/// Extracts the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Verifies the bearer token against the identity provider and stores the
/// resulting [`Claims`] in the request extensions.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let Some(token) = bearer_token(req.headers()) else {
                let err = AppError::Unauthorized("Missing authorization token".to_string());
                return Ok(req.into_response(err.error_response()).map_into_right_body());
            };

            let Some(provider) = req.app_data::<web::Data<dyn IdentityProvider>>().cloned() else {
                let err = AppError::Internal("Identity provider not configured".to_string());
                return Ok(req.into_response(err.error_response()).map_into_right_body());
            };

            match provider.verify_token(&token).await {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(_) => {
                    log::warn!("🔒 Rejected token on {} {}", req.method(), req.path());
                    let err = AppError::Unauthorized("Invalid or expired token".to_string());
                    Ok(req.into_response(err.error_response()).map_into_right_body())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{claims, StaticIdentity};
    // module only: the attribute macro of the same name would shadow #[test]
    use actix_web::test::{self};
    use actix_web::{http::StatusCode, App, HttpResponse};
    use std::sync::Arc;

    async fn whoami(claims: web::ReqData<Claims>) -> HttpResponse {
        HttpResponse::Ok().json(serde_json::json!({ "uid": claims.uid }))
    }

    fn identity() -> web::Data<dyn IdentityProvider> {
        let provider = StaticIdentity::new().with_token("good", claims("u1", "u1@college.edu", Some(Role::Student)));
        web::Data::from(Arc::new(provider) as Arc<dyn IdentityProvider>)
    }

    #[test]
    fn parses_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def".to_string()));

        headers.insert(AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer   ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[actix_web::test]
    async fn missing_token_is_unauthorized() {
        let app = test::init_service(
            App::new()
                .app_data(identity())
                .service(web::scope("/p").wrap(AuthMiddleware).route("", web::get().to(whoami))),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/p").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["message"], "Missing authorization token");
    }

    #[actix_web::test]
    async fn invalid_token_is_unauthorized() {
        let app = test::init_service(
            App::new()
                .app_data(identity())
                .service(web::scope("/p").wrap(AuthMiddleware).route("", web::get().to(whoami))),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/p")
            .insert_header((AUTHORIZATION, "Bearer forged"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn valid_token_attaches_claims() {
        let app = test::init_service(
            App::new()
                .app_data(identity())
                .service(web::scope("/p").wrap(AuthMiddleware).route("", web::get().to(whoami))),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/p")
            .insert_header((AUTHORIZATION, "Bearer good"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["uid"], "u1");
    }
}
