//! Guards tenant-scoped routes.
//!
//! Runs `auth::authenticate` and publishes the resulting `TenantContext` in
//! request extensions. Rejections are rendered here, inside the request's
//! trace scope, rather than bubbled up as errors.

use std::future::{ready, Ready};
use std::rc::Rc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, Error, HttpMessage};
use futures_util::future::LocalBoxFuture;

use crate::auth::guard::authenticate;
use crate::error::AppError;
use crate::state::app_state::AppState;

pub struct TenantJwt;

impl<S, B> Transform<S, ServiceRequest> for TenantJwt
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = TenantJwtMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TenantJwtMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct TenantJwtMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for TenantJwtMiddleware<S>
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
            let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
                let err = AppError::internal("AppState not registered");
                return Ok(req.error_response(err).map_into_right_body());
            };

            let header = req.headers().get(AUTHORIZATION).cloned();
            match authenticate(&state, header.as_ref()).await {
                Ok(ctx) => {
                    req.extensions_mut().insert(ctx);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(err) => Ok(req.error_response(err).map_into_right_body()),
            }
        })
    }
}
