//! `Deferred` — delays the factory invocation until the first
//! `get_credential`, then memoizes the built provider.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::{Credential, CredentialError, CredentialProvider};

pub struct DeferredProvider {
    factory: Box<dyn Fn() -> Arc<dyn CredentialProvider> + Send + Sync>,
    cell: OnceCell<Arc<dyn CredentialProvider>>,
}

impl DeferredProvider {
    pub fn new(factory: impl Fn() -> Arc<dyn CredentialProvider> + Send + Sync + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            cell: OnceCell::new(),
        }
    }
}

#[async_trait]
impl CredentialProvider for DeferredProvider {
    async fn get_credential(&self) -> Result<Credential, CredentialError> {
        let provider = self
            .cell
            .get_or_init(|| async { (self.factory)() })
            .await;
        provider.get_credential().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn factory_invoked_exactly_once() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let invocations2 = Arc::clone(&invocations);
        let deferred = DeferredProvider::new(move || {
            invocations2.fetch_add(1, Ordering::SeqCst);
            Arc::new(super::super::StaticProvider::new(Credential::new("AKID", "SECRET")))
                as Arc<dyn CredentialProvider>
        });

        deferred.get_credential().await.unwrap();
        deferred.get_credential().await.unwrap();
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
    }
}
