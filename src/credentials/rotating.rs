//! `Rotating` — wraps a provider yielding expiring credentials, caching the
//! last value in an `ExpiringValue` cell with background refresh ahead of
//! hard expiration and coalesced refresh on expiry (§4.3, §5).

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{Credential, CredentialError, CredentialProvider};

const DEFAULT_REFRESH_WINDOW_SECONDS: i64 = 300;

/// A concurrency-safe cell holding the last resolved credential. Reads are
/// lock-free (`ArcSwapOption::load_full`) since every `get_credential` call
/// takes this path; only a refresh — the rare case — needs the async gate
/// that serializes concurrent fetches down to at most one in flight.
struct ExpiringValue {
    cached: ArcSwapOption<Credential>,
    refreshing: AtomicBool,
    refresh_gate: tokio::sync::Mutex<()>,
}

impl ExpiringValue {
    fn new() -> Self {
        Self {
            cached: ArcSwapOption::from(None),
            refreshing: AtomicBool::new(false),
            refresh_gate: tokio::sync::Mutex::new(()),
        }
    }

    async fn get_value(
        self: &Arc<Self>,
        window: Duration,
        inner: Arc<dyn CredentialProvider>,
    ) -> Result<Credential, CredentialError> {
        let now = Utc::now();

        if let Some(cred) = self.cached.load_full() {
            if !cred.is_expired(now) {
                if cred.near_expiration(now, window) {
                    self.maybe_spawn_background_refresh(Arc::clone(&inner));
                }
                return Ok((*cred).clone());
            }
        }

        let _guard = self.refresh_gate.lock().await;
        let now = Utc::now();
        if let Some(cred) = self.cached.load_full() {
            if !cred.is_expired(now) {
                return Ok((*cred).clone());
            }
        }

        let fresh = inner.get_credential().await?;
        self.cached.store(Some(Arc::new(fresh.clone())));
        Ok(fresh)
    }

    fn maybe_spawn_background_refresh(self: &Arc<Self>, inner: Arc<dyn CredentialProvider>) {
        if self.refreshing.swap(true, Ordering::SeqCst) {
            return;
        }
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = this.refresh_gate.lock().await;
            if let Ok(fresh) = inner.get_credential().await {
                this.cached.store(Some(Arc::new(fresh)));
            }
            this.refreshing.store(false, Ordering::SeqCst);
        });
    }
}

pub struct RotatingProvider {
    inner: Arc<dyn CredentialProvider>,
    value: Arc<ExpiringValue>,
    refresh_window: Duration,
}

impl RotatingProvider {
    pub fn new(inner: Arc<dyn CredentialProvider>) -> Self {
        Self {
            inner,
            value: Arc::new(ExpiringValue::new()),
            refresh_window: Duration::seconds(DEFAULT_REFRESH_WINDOW_SECONDS),
        }
    }

    pub fn with_refresh_window(mut self, window: Duration) -> Self {
        self.refresh_window = window;
        self
    }
}

#[async_trait]
impl CredentialProvider for RotatingProvider {
    async fn get_credential(&self) -> Result<Credential, CredentialError> {
        self.value
            .get_value(self.refresh_window, Arc::clone(&self.inner))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CountingProvider {
        calls: AtomicUsize,
        expiration: chrono::DateTime<Utc>,
    }

    #[async_trait]
    impl CredentialProvider for CountingProvider {
        async fn get_credential(&self) -> Result<Credential, CredentialError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Credential::expiring("AKID", "SECRET", None, self.expiration))
        }
    }

    #[tokio::test]
    async fn caches_non_expired_value_without_refetching() {
        let inner = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            expiration: Utc::now() + Duration::hours(1),
        });
        let rotating = RotatingProvider::new(inner.clone());
        rotating.get_credential().await.unwrap();
        rotating.get_credential().await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refetches_once_expired() {
        let inner = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            expiration: Utc::now() - Duration::seconds(1),
        });
        let rotating = RotatingProvider::new(inner.clone());
        rotating.get_credential().await.unwrap();
        rotating.get_credential().await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn background_refresh_does_not_block_the_caller() {
        let inner = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            expiration: Utc::now() + Duration::seconds(60), // inside the default 300s window
        });
        let rotating = RotatingProvider::new(inner.clone());
        rotating.get_credential().await.unwrap();

        // The cached value is already near expiration, so this call kicks off
        // a background refresh via tokio::spawn but must still resolve on
        // its first poll rather than waiting on that task.
        let mut polled = tokio_test::task::spawn(rotating.get_credential());
        assert!(polled.poll().is_ready());
    }

    // Universal property (spec §8): `get_value` invokes its closure at most
    // once when N concurrent callers race on an already-expired value.
    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn get_value_invokes_closure_once_under_concurrent_race() {
        let value = Arc::new(ExpiringValue::new());
        value.cached.store(Some(Arc::new(Credential::expiring(
            "STALE",
            "STALE",
            None,
            Utc::now() - Duration::seconds(1),
        ))));

        let inner = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            expiration: Utc::now() + Duration::hours(1),
        });

        let mut handles = Vec::new();
        for _ in 0..16 {
            let value = Arc::clone(&value);
            let inner: Arc<dyn CredentialProvider> = inner.clone();
            handles.push(tokio::spawn(async move {
                value.get_value(Duration::seconds(300), inner).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }
}
