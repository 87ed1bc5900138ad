//! Request counters and latencies behind `/metrics`, rendered as Prometheus
//! text.

use std::collections::HashMap;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use tokio::sync::Mutex;

use crate::AppState;

/// Samples kept per route; older observations are overwritten in place.
const LATENCY_SAMPLES: usize = 1024;

#[derive(Default)]
struct LatencyRing {
    samples: Vec<u64>,
    next: usize,
}

impl LatencyRing {
    fn push(&mut self, value: u64) {
        if self.samples.len() < LATENCY_SAMPLES {
            self.samples.push(value);
        } else {
            self.samples[self.next] = value;
        }
        self.next = (self.next + 1) % LATENCY_SAMPLES;
    }
}

#[derive(Default)]
pub struct RequestMetrics {
    counts: Mutex<HashMap<(String, String, u16), u64>>,
    latency_ns: Mutex<HashMap<String, LatencyRing>>,
}

impl RequestMetrics {
    pub(crate) async fn observe_request(
        &self,
        method: &str,
        route: &str,
        status: StatusCode,
        latency: Duration,
    ) {
        let mut counts = self.counts.lock().await;
        *counts
            .entry((route.to_string(), method.to_string(), status.as_u16()))
            .or_insert(0) += 1;
        drop(counts);
        let mut latency_map = self.latency_ns.lock().await;
        latency_map
            .entry(route.to_string())
            .or_default()
            .push(latency.as_nanos() as u64);
    }

    pub(crate) async fn render(&self) -> String {
        let mut body = String::new();
        let mut counts: Vec<_> = self
            .counts
            .lock()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        counts.sort_by(|a, b| a.0.cmp(&b.0));
        for ((route, method, status), count) in counts {
            body.push_str(&format!(
                "http_requests_total{{route=\"{route}\",method=\"{method}\",status=\"{status}\"}} {count}\n"
            ));
        }
        let mut latencies: Vec<_> = self
            .latency_ns
            .lock()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.samples.clone()))
            .collect();
        latencies.sort_by(|a, b| a.0.cmp(&b.0));
        for (route, vals) in latencies {
            body.push_str(&format!(
                "http_request_latency_p95_seconds{{route=\"{route}\"}} {:.6}\n",
                percentile_ns(&vals, 0.95) as f64 / 1_000_000_000.0
            ));
        }
        body
    }
}

fn percentile_ns(samples: &[u64], p: f64) -> u64 {
    if samples.is_empty() {
        return 0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_unstable();
    let idx = ((sorted.len() as f64) * p).ceil() as usize;
    sorted[idx.saturating_sub(1).min(sorted.len() - 1)]
}

pub(crate) async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.render().await
}
