//! Prometheus metrics for the simulator.

use brew_core::tags;
use brew_core::{HardwareState, StateListener, TickObserver, TickOutcome};
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::{LazyLock, Mutex, PoisonError};
use std::thread;
use tiny_http::{Response, Server};
use tracing::{error, info, warn};

/// Global metrics registry
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static WATER_LEVEL: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(tags::WATER_LEVEL.metric, tags::WATER_LEVEL.help).unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

pub static COFFEE_LEVEL: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(tags::COFFEE_LEVEL.metric, tags::COFFEE_LEVEL.help).unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

pub static STATE_CHANGES: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(tags::STATE_CHANGES.metric, tags::STATE_CHANGES.help).unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

pub static BREW_TICKS: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(tags::BREW_TICKS.metric, tags::BREW_TICKS.help).unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

pub static BREW_TRANSFERS: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter =
        IntCounter::new(tags::BREW_TRANSFERS.metric, tags::BREW_TRANSFERS.help).unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Mirrors state changes into the level gauges and brew ticks into the
/// brew counters.
#[derive(Default)]
pub struct MetricsListener {
    /// Revision currently shown by the gauges.
    shown_revision: Mutex<u64>,
}

impl MetricsListener {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateListener for MetricsListener {
    fn on_state_changed(&self, state: &HardwareState) {
        STATE_CHANGES.inc();
        let mut shown = self
            .shown_revision
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Notifications can arrive out of order; never go back to an older state.
        if state.revision < *shown {
            return;
        }
        *shown = state.revision;
        WATER_LEVEL.set(i64::from(state.water_level));
        COFFEE_LEVEL.set(i64::from(state.coffee_level));
    }
}

impl TickObserver for MetricsListener {
    fn on_tick(&self, outcome: TickOutcome) {
        BREW_TICKS.inc();
        if outcome == TickOutcome::Transferred {
            BREW_TRANSFERS.inc();
        }
    }
}

/// Initialize all metrics (forces lazy initialization)
pub fn init() {
    let _ = WATER_LEVEL.get();
    let _ = COFFEE_LEVEL.get();
    let _ = STATE_CHANGES.get();
    let _ = BREW_TICKS.get();
    let _ = BREW_TRANSFERS.get();
}

pub fn start_metrics_server(addr: &Option<String>) -> Option<thread::JoinHandle<()>> {
    addr.as_ref().map(|addr| {
        info!(addr = %addr, "Starting metrics server");
        serve_metrics(addr.clone())
    })
}

fn render_metrics() -> Result<Vec<u8>, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(buffer)
}

/// Serve `/metrics`, `/health` and `/ready` on a background thread.
pub fn serve_metrics(bind_addr: String) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let server = match Server::http(&bind_addr) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to start metrics server on {}: {}", bind_addr, e);
                return;
            }
        };

        info!("Metrics server listening on http://{}/metrics", bind_addr);

        for request in server.incoming_requests() {
            match request.url() {
                "/metrics" => match render_metrics() {
                    Ok(buffer) => {
                        let mut response = Response::from_data(buffer);
                        if let Ok(header) = tiny_http::Header::from_bytes(
                            &b"Content-Type"[..],
                            &b"text/plain; version=0.0.4"[..],
                        ) {
                            response = response.with_header(header);
                        }
                        let _ = request.respond(response);
                    }
                    Err(e) => {
                        warn!("Failed to encode metrics: {}", e);
                        let _ = request.respond(
                            Response::from_string("Internal Server Error").with_status_code(500),
                        );
                    }
                },
                "/health" => {
                    let _ = request.respond(Response::from_string("OK"));
                }
                "/ready" => {
                    // Ready once the hardware has changed at least once
                    if STATE_CHANGES.get() > 0 {
                        let _ = request.respond(Response::from_string("Ready"));
                    } else {
                        let _ = request
                            .respond(Response::from_string("Not Ready").with_status_code(503));
                    }
                }
                _ => {
                    let _ =
                        request.respond(Response::from_string("Not Found").with_status_code(404));
                }
            }
        }
    })
}
