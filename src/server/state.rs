use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::Serialize;

use crate::service::DispositionService;

#[derive(Clone)]
pub struct ServeState {
    pub(crate) service: Arc<DispositionService>,
    pub(crate) health: Arc<ServeHealth>,
}

impl ServeState {
    pub fn new(service: DispositionService) -> Self {
        Self::with_health(Arc::new(service), Arc::new(ServeHealth::new()))
    }

    pub fn with_health(service: Arc<DispositionService>, health: Arc<ServeHealth>) -> Self {
        health.mark_live();
        Self { service, health }
    }

    pub fn health(&self) -> &ServeHealth {
        &self.health
    }
}

/// Liveness plus request bookkeeping for `/health`
#[derive(Default)]
pub struct ServeHealth {
    live: AtomicBool,
    started_at: AtomicU64,
    in_flight: AtomicU64,
    completed: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl ServeHealth {
    pub fn new() -> Self {
        let health = Self::default();
        health.started_at.store(unix_now(), Ordering::SeqCst);
        health
    }

    pub fn mark_live(&self) {
        self.live.store(true, Ordering::SeqCst);
    }

    pub(crate) fn begin(&self) -> InFlight<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlight { health: self }
    }

    pub(crate) fn record_error(&self, error: impl Into<String>) {
        *self.last_error.lock() = Some(error.into());
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            status: "ok",
            live: self.live.load(Ordering::SeqCst),
            uptime_secs: unix_now().saturating_sub(self.started_at.load(Ordering::SeqCst)),
            in_flight: self.in_flight.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            last_error: self.last_error.lock().clone(),
        }
    }
}

/// Decrements the in-flight count when the request ends, even on cancellation
pub(crate) struct InFlight<'a> {
    health: &'a ServeHealth,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.health.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.health.completed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub live: bool,
    pub uptime_secs: u64,
    pub in_flight: u64,
    pub completed: u64,
    pub last_error: Option<String>,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
