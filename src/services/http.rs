// src/services/http.rs

use crate::observability::prom;

use actix_web::{
    Error,
    body::MessageBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{
    rc::Rc,
    task::{Context, Poll},
    time::Instant,
};

/// Request metrics for the receiver: inflight gauge, per-method/status
/// counters, duration histogram, and an optional slow-request warning.
#[derive(Clone, Debug, Default)]
pub struct RelayMetrics {
    /// Warn when a request takes at least this long (ms).
    pub warn_slow_request_ms: Option<u64>,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn_slower_than(ms: u64) -> Self {
        Self { warn_slow_request_ms: Some(ms) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RelayMetrics
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RelayMetricsMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        prom::init_prometheus();
        ready(Ok(RelayMetricsMiddleware {
            service: Rc::new(service),
            warn_slow_request_ms: self.warn_slow_request_ms,
        }))
    }
}

pub struct RelayMetricsMiddleware<S> {
    pub(crate) service: Rc<S>,
    pub(crate) warn_slow_request_ms: Option<u64>,
}

impl<S, B> Service<ServiceRequest> for RelayMetricsMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let warn_slow = self.warn_slow_request_ms;

        // capture request identity for metrics before move
        let method = req.method().as_str().to_string();
        let path = req.path().to_string();
        prom::inc_inflight();
        let req_start = Instant::now();

        Box::pin(async move {
            let res = match svc.call(req).await {
                Ok(res) => res,
                Err(e) => {
                    prom::dec_inflight();
                    return Err(e);
                }
            };

            let elapsed = req_start.elapsed();
            prom::dec_inflight();

            let status = res.status().as_u16();
            prom::observe_request(&method, status, elapsed.as_secs_f64());

            if let Some(th) = warn_slow {
                let elapsed_ms = elapsed.as_millis() as u64;
                if elapsed_ms >= th {
                    tracing::warn!(
                        target: "increlay::http",
                        method = %method,
                        path = %path,
                        elapsed_ms,
                        threshold_ms = th,
                        "slow receiver request"
                    );
                }
            }

            Ok(res)
        })
    }
}
