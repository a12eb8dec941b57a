//! Counters for authentication outcomes.
//!
//! The process uses one registry created lazily by [`AuthMetrics::global`], which `main` hands to
//! the auth service. Nothing reads the global implicitly, so tests construct their own isolated
//! [`AuthMetrics::new`] and assert on it.

use std::sync::{
    Arc, OnceLock,
    atomic::{AtomicU64, Ordering},
};

use serde::Serialize;

/// Point-in-time copy of all counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuthMetricsSnapshot {
    pub merchants_registered: u64,
    pub logins_succeeded: u64,
    pub logins_failed: u64,
    pub tokens_issued: u64,
    pub tokens_rejected: u64,
    pub api_keys_accepted: u64,
    pub api_keys_rejected: u64,
    pub api_keys_rotated: u64,
}

#[derive(Default)]
struct AuthMetricsInner {
    merchants_registered: AtomicU64,
    logins_succeeded: AtomicU64,
    logins_failed: AtomicU64,
    tokens_issued: AtomicU64,
    tokens_rejected: AtomicU64,
    api_keys_accepted: AtomicU64,
    api_keys_rejected: AtomicU64,
    api_keys_rotated: AtomicU64,
}

/// Shared authentication counters.
///
/// Cloning is cheap; all clones update the same counters.
#[derive(Clone, Default)]
pub struct AuthMetrics {
    inner: Arc<AuthMetricsInner>,
}

static GLOBAL: OnceLock<AuthMetrics> = OnceLock::new();

impl AuthMetrics {
    /// Creates a new, zeroed registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry, created on first use.
    pub fn global() -> &'static AuthMetrics {
        GLOBAL.get_or_init(AuthMetrics::new)
    }

    pub fn record_registration(&self) {
        self.inner.merchants_registered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_login(&self, succeeded: bool) {
        let counter = if succeeded {
            &self.inner.logins_succeeded
        } else {
            &self.inner.logins_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_token_issued(&self) {
        self.inner.tokens_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_token_rejected(&self) {
        self.inner.tokens_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_api_key_check(&self, accepted: bool) {
        let counter = if accepted {
            &self.inner.api_keys_accepted
        } else {
            &self.inner.api_keys_rejected
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rotation(&self) {
        self.inner.api_keys_rotated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AuthMetricsSnapshot {
        let inner = &self.inner;
        AuthMetricsSnapshot {
            merchants_registered: inner.merchants_registered.load(Ordering::Relaxed),
            logins_succeeded: inner.logins_succeeded.load(Ordering::Relaxed),
            logins_failed: inner.logins_failed.load(Ordering::Relaxed),
            tokens_issued: inner.tokens_issued.load(Ordering::Relaxed),
            tokens_rejected: inner.tokens_rejected.load(Ordering::Relaxed),
            api_keys_accepted: inner.api_keys_accepted.load(Ordering::Relaxed),
            api_keys_rejected: inner.api_keys_rejected.load(Ordering::Relaxed),
            api_keys_rotated: inner.api_keys_rotated.load(Ordering::Relaxed),
        }
    }

    /// Emit the current counters as one structured log line.
    pub fn log_metrics(&self) {
        let s = self.snapshot();
        tracing::info!(
            merchants_registered = s.merchants_registered,
            logins_succeeded = s.logins_succeeded,
            logins_failed = s.logins_failed,
            tokens_issued = s.tokens_issued,
            tokens_rejected = s.tokens_rejected,
            api_keys_rejected = s.api_keys_rejected,
            api_keys_rotated = s.api_keys_rotated,
            "Auth metrics"
        );
    }
}

impl std::fmt::Debug for AuthMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthMetrics")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
