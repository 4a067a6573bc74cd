use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use crate::env::request::ExecRequest;
use crate::error::ExecError;
use crate::exec::artifact::Artifact;
use crate::exec::provider::ExecutionProvider;

/// Content-addressed memoization over another provider.
///
/// Requests are keyed by [`ExecRequest::cache_key`]. Concurrent callers
/// with the same key wait on a single inner run. Failures are not
/// remembered, so a later call runs the inner provider again.
#[derive(Debug)]
pub struct Memoized<P> {
    inner: P,
    entries: Mutex<HashMap<String, Arc<OnceCell<Artifact>>>>,
}

impl<P> Memoized<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Drop the entry for a failed run unless another caller has since
    /// filled or replaced it.
    async fn forget_failed(&self, key: &str, cell: &Arc<OnceCell<Artifact>>) {
        let mut entries = self.entries.lock().await;
        let stale = entries
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, cell) && !current.initialized());
        if stale {
            entries.remove(key);
        }
    }
}

async fn cache_key(request: &ExecRequest) -> Result<String, ExecError> {
    let request = request.clone();
    tokio::task::spawn_blocking(move || request.cache_key())
        .await
        .map_err(|err| ExecError::io("cache key task failed", io::Error::other(err)))?
}

impl<P: ExecutionProvider> ExecutionProvider for Memoized<P> {
    fn run(
        &self,
        request: &ExecRequest,
    ) -> impl Future<Output = Result<Artifact, ExecError>> + Send {
        async move {
            let key = cache_key(request).await?;
            let cell = {
                let mut entries = self.entries.lock().await;
                Arc::clone(entries.entry(key.clone()).or_default())
            };

            let mut launched = false;
            let result = cell
                .get_or_try_init(|| {
                    launched = true;
                    self.inner.run(request)
                })
                .await;

            match result {
                Ok(artifact) => {
                    if !launched {
                        debug!(%key, "reusing memoized artifact");
                    }
                    Ok(artifact.clone())
                }
                Err(err) => {
                    self.forget_failed(&key, &cell).await;
                    Err(err)
                }
            }
        }
    }
}
