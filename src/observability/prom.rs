use actix_web::HttpResponse;
use once_cell::sync::OnceCell;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

static REGISTRY: OnceCell<Registry> = OnceCell::new();

static HTTP_REQ_COUNTER: OnceCell<IntCounterVec> = OnceCell::new();
static HTTP_INFLIGHT: OnceCell<IntGauge> = OnceCell::new();
static HTTP_REQ_HISTO: OnceCell<HistogramVec> = OnceCell::new();

static DISPATCH_COUNTER: OnceCell<IntCounterVec> = OnceCell::new();
static DISPATCH_HISTO: OnceCell<HistogramVec> = OnceCell::new();
static AUTOMATION_COUNTER: OnceCell<IntCounterVec> = OnceCell::new();

fn default_buckets_seconds() -> Vec<f64> {
    // Prometheus-default-ish buckets for latency (seconds)
    vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
}

pub fn init_prometheus() {
    let registry = REGISTRY.get_or_init(Registry::new);

    let http_counter = IntCounterVec::new(
        Opts::new("increlay_http_requests_total", "Receiver HTTP requests total"),
        &["method", "status"],
    ).unwrap();

    let http_inflight =
        IntGauge::new("increlay_http_inflight_requests", "Inflight receiver requests").unwrap();

    let http_histo = HistogramVec::new(
        HistogramOpts::new("increlay_http_request_duration_seconds", "Receiver request duration (s)")
            .buckets(default_buckets_seconds()),
        &["method"],
    ).unwrap();

    let dispatch_counter = IntCounterVec::new(
        Opts::new("increlay_dispatches_total", "Outbound webhook dispatches total"),
        &["outcome"], // "delivered" | "failed"
    ).unwrap();

    let dispatch_histo = HistogramVec::new(
        HistogramOpts::new("increlay_dispatch_duration_seconds", "Outbound dispatch duration (s)")
            .buckets(default_buckets_seconds()),
        &["outcome"],
    ).unwrap();

    let automation_counter = IntCounterVec::new(
        Opts::new("increlay_automation_runs_total", "Automation launches total"),
        &["outcome"], // "ok" | "failed"
    ).unwrap();

    registry.register(Box::new(http_counter.clone())).ok();
    registry.register(Box::new(http_inflight.clone())).ok();
    registry.register(Box::new(http_histo.clone())).ok();
    registry.register(Box::new(dispatch_counter.clone())).ok();
    registry.register(Box::new(dispatch_histo.clone())).ok();
    registry.register(Box::new(automation_counter.clone())).ok();

    HTTP_REQ_COUNTER.set(http_counter).ok();
    HTTP_INFLIGHT.set(http_inflight).ok();
    HTTP_REQ_HISTO.set(http_histo).ok();
    DISPATCH_COUNTER.set(dispatch_counter).ok();
    DISPATCH_HISTO.set(dispatch_histo).ok();
    AUTOMATION_COUNTER.set(automation_counter).ok();
}

// Called by middleware
pub fn inc_inflight() {
    if let Some(g) = HTTP_INFLIGHT.get() { g.inc(); }
}
pub fn dec_inflight() {
    if let Some(g) = HTTP_INFLIGHT.get() { g.dec(); }
}
pub fn observe_request(method: &str, status: u16, dur_seconds: f64) {
    if let Some(c) = HTTP_REQ_COUNTER.get() {
        c.with_label_values(&[method, &status.to_string()]).inc();
    }
    if let Some(h) = HTTP_REQ_HISTO.get() {
        h.with_label_values(&[method]).observe(dur_seconds);
    }
}

// Called by the notifier
pub fn observe_dispatch(outcome: &str, dur_seconds: f64) {
    if let Some(c) = DISPATCH_COUNTER.get() {
        c.with_label_values(&[outcome]).inc();
    }
    if let Some(h) = DISPATCH_HISTO.get() {
        h.with_label_values(&[outcome]).observe(dur_seconds);
    }
}

// Called by the receiver's background launch task
pub fn inc_automation(outcome: &str) {
    if let Some(c) = AUTOMATION_COUNTER.get() {
        c.with_label_values(&[outcome]).inc();
    }
}

pub async fn metrics_handler() -> HttpResponse {
    let Some(registry) = REGISTRY.get() else {
        init_prometheus();
        // try again
        let Some(reg) = REGISTRY.get() else {
            return HttpResponse::InternalServerError().body("metrics registry unavailable");
        };
        return encode(reg);
    };
    encode(registry)
}

fn encode(registry: &Registry) -> HttpResponse {
    let encoder = TextEncoder::new();
    let mf = registry.gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&mf, &mut buf) {
        return HttpResponse::InternalServerError().body(format!("encode error: {e}"));
    }
    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_before_init_is_a_no_op() {
        // statics may or may not be initialized depending on test order;
        // either way these must not panic
        observe_request("POST", 200, 0.001);
        observe_dispatch("delivered", 0.002);
        inc_automation("ok");
        inc_inflight();
        dec_inflight();
    }

    #[actix_web::test]
    async fn metrics_endpoint_renders_text_format() {
        init_prometheus();
        observe_dispatch("delivered", 0.001);
        let res = metrics_handler().await;
        assert_eq!(res.status(), actix_web::http::StatusCode::OK);
    }
}
