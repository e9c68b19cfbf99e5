//! Metrics recording implementation backed by atomic counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use http::Method;
use tracing::warn;

/// Both auth counters reset to zero once either climbs past this value.
const AUTH_COUNTER_CEILING: u64 = 1000;

/// Trait for recording application metrics.
///
/// Collaborators (auth flow, order flow, HTTP middleware) record events
/// through this trait so tests can inject a fake registry. Every call is a
/// fire-and-forget side effect: it never fails, never blocks, and never
/// returns anything the caller consumes.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Counts an incoming HTTP request by method.
    fn record_http_request(&self, method: &Method);

    /// Records a login outcome; a success marks one more active user.
    fn record_login(&self, success: bool);

    /// Records a logout, releasing one active user.
    fn record_logout(&self);

    /// Records an authentication attempt with its outcome.
    fn record_auth_attempt(&self, success: bool);

    /// Records a completed order of `quantity` pizzas.
    fn record_purchase(&self, success: bool, quantity: u64);

    /// Adds an order's price to the cumulative revenue.
    fn record_revenue(&self, amount: f64);

    /// Records the duration of a handled request in milliseconds.
    fn record_latency(&self, millis: f64);

    /// Records the duration of an order-creation operation in milliseconds.
    fn record_pizza_latency(&self, millis: f64);
}

/// An `f64` stored as raw bits in an `AtomicU64`.
#[derive(Default)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    fn add(&self, delta: f64) {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }
}

#[derive(Default)]
struct Counters {
    http_get: AtomicU64,
    http_post: AtomicU64,
    http_put: AtomicU64,
    http_delete: AtomicU64,
    cpu_pct: AtomicF64,
    latency_ms: AtomicF64,
    pizza_latency_ms: AtomicF64,
    active_users: AtomicU64,
    sold: AtomicU64,
    failed_pizzas: AtomicU64,
    revenue: AtomicF64,
    auth_successful: AtomicU64,
    auth_failed: AtomicU64,
}

/// Central metrics registry.
///
/// Cheap to clone; all clones share the same counters. Constructed once at
/// startup and handed to every collaborator that records events.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<Counters>,
}

impl Metrics {
    /// Creates a new, empty metrics registry.
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(Counters::default()),
        }
    }

    /// Reads every counter without resetting anything.
    ///
    /// The read is not transactional; increments landing between field reads
    /// are picked up by the next snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = &self.inner;
        MetricsSnapshot {
            http_get: c.http_get.load(Ordering::Relaxed),
            http_post: c.http_post.load(Ordering::Relaxed),
            http_put: c.http_put.load(Ordering::Relaxed),
            http_delete: c.http_delete.load(Ordering::Relaxed),
            cpu_pct: c.cpu_pct.load(),
            latency_ms: c.latency_ms.load(),
            pizza_latency_ms: c.pizza_latency_ms.load(),
            active_users: c.active_users.load(Ordering::Relaxed),
            sold: c.sold.load(Ordering::Relaxed),
            failed_pizzas: c.failed_pizzas.load(Ordering::Relaxed),
            revenue: c.revenue.load(),
            auth_successful: c.auth_successful.load(Ordering::Relaxed),
            auth_failed: c.auth_failed.load(Ordering::Relaxed),
        }
    }

    /// Stores the latest CPU utilization sample from the background sampler.
    pub(crate) fn set_cpu_usage(&self, percentage: f64) {
        self.inner.cpu_pct.store(percentage);
    }

    /// Passive decrement applied by the decay timer, floored at zero.
    pub(crate) fn decay_active_users(&self) {
        self.decrement_active_users();
    }

    fn decrement_active_users(&self) {
        let _ = self
            .inner
            .active_users
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |users| {
                users.checked_sub(1)
            });
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder for Metrics {
    fn record_http_request(&self, method: &Method) {
        let c = &self.inner;
        match method.as_str() {
            "GET" => {
                c.http_get.fetch_add(1, Ordering::Relaxed);
            }
            "POST" => {
                c.http_post.fetch_add(1, Ordering::Relaxed);
            }
            "PUT" => {
                c.http_put.fetch_add(1, Ordering::Relaxed);
            }
            "DELETE" => {
                c.http_delete.fetch_add(1, Ordering::Relaxed);
            }
            other => warn!("Not tracking request with unrecognized method '{}'", other),
        }
    }

    fn record_login(&self, success: bool) {
        if success {
            self.inner.active_users.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_logout(&self) {
        self.decrement_active_users();
    }

    fn record_auth_attempt(&self, success: bool) {
        let c = &self.inner;
        let (hit, other) = if success {
            (&c.auth_successful, &c.auth_failed)
        } else {
            (&c.auth_failed, &c.auth_successful)
        };
        let updated = hit.fetch_add(1, Ordering::Relaxed) + 1;
        if updated > AUTH_COUNTER_CEILING || other.load(Ordering::Relaxed) > AUTH_COUNTER_CEILING {
            c.auth_successful.store(0, Ordering::Relaxed);
            c.auth_failed.store(0, Ordering::Relaxed);
        }
    }

    fn record_purchase(&self, success: bool, quantity: u64) {
        if success {
            self.inner.sold.fetch_add(quantity, Ordering::Relaxed);
        } else {
            self.inner.failed_pizzas.fetch_add(quantity, Ordering::Relaxed);
        }
    }

    fn record_revenue(&self, amount: f64) {
        self.inner.revenue.add(amount);
    }

    fn record_latency(&self, millis: f64) {
        smooth(&self.inner.latency_ms, millis);
    }

    fn record_pizza_latency(&self, millis: f64) {
        smooth(&self.inner.pizza_latency_ms, millis);
    }
}

/// Single-step moving average. A current value of exactly zero is a cold
/// start and the sample replaces it outright.
fn smooth(slot: &AtomicF64, sample: f64) {
    let current = slot.load();
    if current == 0.0 {
        slot.store(sample);
    } else {
        slot.store((sample + current) / 2.0);
    }
}

/// Point-in-time copy of every counter, taken once per export cycle.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub http_get: u64,
    pub http_post: u64,
    pub http_put: u64,
    pub http_delete: u64,
    pub cpu_pct: f64,
    pub latency_ms: f64,
    pub pizza_latency_ms: f64,
    pub active_users: u64,
    pub sold: u64,
    pub failed_pizzas: u64,
    pub revenue: f64,
    pub auth_successful: u64,
    pub auth_failed: u64,
}

impl MetricsSnapshot {
    /// Total request count across the four tracked methods.
    pub fn http_total(&self) -> u64 {
        self.http_get + self.http_post + self.http_put + self.http_delete
    }
}
