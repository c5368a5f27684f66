//! Shared rate limit bookkeeping.
//!
//! Every response updates a [`RateLimitState`] with the quota reported in its
//! `X-RateLimit-*` headers. Before each attempt the transport consults the
//! state and, when the quota for its token is exhausted, waits for the reset
//! instead of burning a request on a guaranteed 429.
//!
//! The state is an explicit value, not a global. Clients built from the same
//! [`RestClient::with_rate_limits`](crate::clients::RestClient::with_rate_limits)
//! argument share one quota view; tests get a fresh one per case.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use crate::clients::http_response::RateLimitInfo;
use crate::config::ApiToken;

const UNKNOWN_U32: u32 = u32::MAX;
const UNKNOWN_U64: u64 = u64::MAX;

/// A point-in-time view of the quota for one token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    /// Requests allowed per window, if reported.
    pub limit: Option<u32>,
    /// Requests left in the current window, if reported.
    pub remaining: Option<u32>,
    /// Time until the window resets, if reported and still in the future.
    pub reset_in: Option<Duration>,
}

#[derive(Debug)]
struct TokenQuota {
    limit: AtomicU32,
    remaining: AtomicU32,
    // Milliseconds since `RateLimitState::epoch`.
    reset_at_ms: AtomicU64,
    writer: Mutex<()>,
}

impl TokenQuota {
    fn new() -> Self {
        Self {
            limit: AtomicU32::new(UNKNOWN_U32),
            remaining: AtomicU32::new(UNKNOWN_U32),
            reset_at_ms: AtomicU64::new(UNKNOWN_U64),
            writer: Mutex::new(()),
        }
    }
}

/// Quota tracking shared by every request made with the same token.
///
/// Reads are lock-free loads. Writes for one token are serialized so two
/// concurrent responses never interleave their updates.
#[derive(Debug)]
pub struct RateLimitState {
    epoch: Instant,
    quotas: RwLock<HashMap<u64, Arc<TokenQuota>>>,
}

// Verify RateLimitState is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RateLimitState>();
};

impl Default for RateLimitState {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            quotas: RwLock::new(HashMap::new()),
        }
    }

    /// Creates an empty state ready to be shared between clients.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn key(token: &ApiToken) -> u64 {
        let mut hasher = DefaultHasher::new();
        token.as_ref().hash(&mut hasher);
        hasher.finish()
    }

    fn quota(&self, token: &ApiToken) -> Option<Arc<TokenQuota>> {
        let quotas = self.quotas.read().unwrap_or_else(PoisonError::into_inner);
        quotas.get(&Self::key(token)).cloned()
    }

    fn quota_or_insert(&self, token: &ApiToken) -> Arc<TokenQuota> {
        if let Some(quota) = self.quota(token) {
            return quota;
        }
        let mut quotas = self.quotas.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            quotas
                .entry(Self::key(token))
                .or_insert_with(|| Arc::new(TokenQuota::new())),
        )
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(UNKNOWN_U64 - 1)
    }

    /// Records the quota reported by a response.
    pub fn record(&self, token: &ApiToken, info: &RateLimitInfo) {
        let quota = self.quota_or_insert(token);
        let _guard = quota.writer.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(limit) = info.limit {
            quota.limit.store(limit, Ordering::Release);
        }
        if let Some(remaining) = info.remaining {
            quota.remaining.store(remaining, Ordering::Release);
        }
        if let Some(reset_after) = info.reset_after {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let offset_ms = (reset_after * 1000.0).round() as u64;
            let reset_at = self.elapsed_ms().saturating_add(offset_ms);
            quota
                .reset_at_ms
                .store(reset_at.min(UNKNOWN_U64 - 1), Ordering::Release);
        }
    }

    /// Returns the last known quota for `token`, if any response reported one.
    #[must_use]
    pub fn snapshot(&self, token: &ApiToken) -> Option<RateLimitSnapshot> {
        let quota = self.quota(token)?;

        let known = |value: u32| (value != UNKNOWN_U32).then_some(value);
        let reset_at = quota.reset_at_ms.load(Ordering::Acquire);
        let reset_in = (reset_at != UNKNOWN_U64)
            .then(|| reset_at.saturating_sub(self.elapsed_ms()))
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);

        Some(RateLimitSnapshot {
            limit: known(quota.limit.load(Ordering::Acquire)),
            remaining: known(quota.remaining.load(Ordering::Acquire)),
            reset_in,
        })
    }

    /// Returns how long to wait before sending, when the quota is exhausted.
    #[must_use]
    pub fn required_wait(&self, token: &ApiToken) -> Option<Duration> {
        let snapshot = self.snapshot(token)?;
        if snapshot.remaining == Some(0) {
            snapshot.reset_in
        } else {
            None
        }
    }
}
