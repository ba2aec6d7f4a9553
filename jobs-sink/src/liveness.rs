use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Heartbeat for the single pipeline worker. The worker reports once per
/// loop iteration; a report older than the deadline fails the liveness
/// probe and the supervisor restarts the process.
///
/// Starts stale: the probe only goes green once the pipeline is actually
/// looping.
#[derive(Clone)]
pub struct WorkerHealth {
    last_report_ms: Arc<AtomicI64>,
    deadline: Duration,
}

impl WorkerHealth {
    pub fn new(deadline: Duration) -> Self {
        Self {
            last_report_ms: Arc::new(AtomicI64::new(0)),
            deadline,
        }
    }

    pub fn report_healthy(&self) {
        self.last_report_ms.store(now_millis(), Ordering::Relaxed);
    }

    pub fn is_alive(&self) -> bool {
        let last = self.last_report_ms.load(Ordering::Relaxed);
        if last == 0 {
            return false;
        }
        now_millis().saturating_sub(last) <= self.deadline.as_millis() as i64
    }

    /// Probe response, usable as an axum handler body.
    pub fn status(&self) -> Response {
        if self.is_alive() {
            (StatusCode::OK, "ok").into_response()
        } else {
            (StatusCode::INTERNAL_SERVER_ERROR, "worker stalled").into_response()
        }
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
