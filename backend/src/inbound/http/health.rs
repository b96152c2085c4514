//! Liveness and readiness probes for orchestrators and load balancers.
//!
//! The server moves through three phases: starting, serving, draining.
//! Readiness holds only while serving; liveness fails only once draining.

use std::sync::atomic::{AtomicU8, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use serde::Serialize;
use utoipa::ToSchema;

/// Server lifecycle phase reported by the probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Listener not bound yet.
    Starting,
    /// Accepting traffic.
    Serving,
    /// Shutting down.
    Draining,
}

impl Phase {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Starting,
            1 => Self::Serving,
            _ => Self::Draining,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Starting => 0,
            Self::Serving => 1,
            Self::Draining => 2,
        }
    }
}

/// Probe response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProbeReport {
    /// Phase at the time of the probe.
    pub phase: Phase,
}

/// Lifecycle phase shared between the bootstrap and the probes.
pub struct HealthState {
    phase: AtomicU8,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            phase: AtomicU8::new(Phase::Starting.as_u8()),
        }
    }
}

impl HealthState {
    /// Start in the starting phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Enter the serving phase once the listener is bound. No effect once
    /// draining has begun.
    pub fn start_serving(&self) {
        // Err means draining already started, which is final.
        let _ = self.phase.compare_exchange(
            Phase::Starting.as_u8(),
            Phase::Serving.as_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Enter the draining phase. Final.
    pub fn start_draining(&self) {
        self.phase.store(Phase::Draining.as_u8(), Ordering::Release);
    }

    fn report(&self, healthy: fn(Phase) -> bool) -> HttpResponse {
        let phase = self.phase();
        let mut response = if healthy(phase) {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };
        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .json(ProbeReport { phase })
    }
}

/// Readiness probe. 200 while serving, 503 otherwise.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    responses(
        (status = 200, description = "Serving traffic", body = ProbeReport),
        (status = 503, description = "Starting or draining", body = ProbeReport)
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    state.report(|phase| phase == Phase::Serving)
}

/// Liveness probe. 503 once draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    responses(
        (status = 200, description = "Process is alive", body = ProbeReport),
        (status = 503, description = "Draining", body = ProbeReport)
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    state.report(|phase| phase != Phase::Draining)
}
