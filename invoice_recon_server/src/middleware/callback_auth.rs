//! Signature middleware for approval callbacks.
//!
//! This module provides a middleware for Actix Web that checks the signature of incoming callback requests.
//!
//! The notification channel signs each callback with a shared secret over `"v0:{timestamp}:{body}"` and sends
//! the result in the `X-Recon-Signature` header, with the unix timestamp in `X-Recon-Timestamp`.
//!
//! Wrap the callback route with this middleware so that handlers only ever see authenticated requests. The
//! replay window is enforced before the signature is checked, so captured requests cannot be replayed after
//! the window closes even with a valid signature.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorForbidden},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use invoice_recon_engine::helpers::verify_callback;
use ivr_common::Secret;
use log::{trace, warn};

pub const SIGNATURE_HEADER: &str = "X-Recon-Signature";
pub const TIMESTAMP_HEADER: &str = "X-Recon-Timestamp";

pub struct CallbackAuthMiddlewareFactory {
    secret: Secret<String>,
    // If false, then the middleware will not check the signature and always allow the call
    enabled: bool,
}

impl CallbackAuthMiddlewareFactory {
    pub fn new(secret: Secret<String>, enabled: bool) -> Self {
        CallbackAuthMiddlewareFactory { secret, enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CallbackAuthMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = CallbackAuthMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CallbackAuthMiddlewareService {
            secret: self.secret.clone(),
            enabled: self.enabled,
            service: Rc::new(service),
        }))
    }
}

pub struct CallbackAuthMiddlewareService<S> {
    secret: Secret<String>,
    enabled: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for CallbackAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.secret.reveal().clone();
        let enabled = self.enabled;
        Box::pin(async move {
            trace!("🔐️ Checking signature for callback request");
            if !enabled {
                trace!("🔐️ Callback signature checks are disabled. Allowing request.");
                return service.call(req).await;
            }
            let signature = header_value(&req, SIGNATURE_HEADER)?;
            let timestamp = header_value(&req, TIMESTAMP_HEADER)?;
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {:?}", e);
                ErrorBadRequest("Failed to extract request data.")
            })?;
            let body = std::str::from_utf8(data.as_ref()).map_err(|_| {
                warn!("🔐️ Callback body is not valid UTF-8. Denying access.");
                ErrorBadRequest("Callback body is not valid UTF-8.")
            })?;
            match verify_callback(&secret, &timestamp, body, &signature) {
                Ok(()) => {
                    trace!("🔐️ Signature check for callback ✅️");
                    req.set_payload(bytes_to_payload(data));
                    service.call(req).await
                },
                Err(e) => {
                    warn!("🔐️ Rejected callback request: {e}");
                    Err(ErrorForbidden("Callback could not be authenticated."))
                },
            }
        })
    }
}

fn header_value(req: &ServiceRequest, name: &str) -> Result<String, Error> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            warn!("🔐️ No {name} header found in callback request. Denying access.");
            ErrorForbidden("Missing callback signature headers.")
        })
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
