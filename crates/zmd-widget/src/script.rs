//! Exactly-once external script loading.
//!
//! [`ScriptLoader`] makes sure each capability's script executes at most once
//! per process. The dedup key is the script's completion-signal name, not its
//! URL: two different URLs configured with the same signal name are treated
//! as one resource.

use std::future::Future;

use zmd_cache::{Claim, ResourceCache};
use zmd_fetch::Fetcher;

use crate::error::LoadError;

/// Completion signal of the markdown engine script.
pub const RENDERER_SIGNAL: &str = "zmd-renderer-ready";
/// Completion signal of the highlighter script.
pub const HIGHLIGHTER_SIGNAL: &str = "zmd-highlighter-ready";
/// Load attributes of the markdown engine script.
pub const RENDERER_ATTRIBUTES: &[&str] = &["async"];
/// Load attributes of the highlighter script. `data-manual` stops it from
/// highlighting the whole page on its own.
pub const HIGHLIGHTER_ATTRIBUTES: &[&str] = &["async", "data-manual"];

/// Performs the script-loading side effect.
pub trait ScriptHost {
    /// Load and execute the script at `url`, carrying the given boolean
    /// attributes. Resolves once the script has run.
    fn insert_script(
        &self,
        url: &str,
        attributes: &[&str],
    ) -> impl Future<Output = Result<(), LoadError>>;
}

/// Headless [`ScriptHost`]: a script counts as executed once its body has
/// been fetched successfully.
#[derive(Clone)]
pub struct FetchingScriptHost<F> {
    fetcher: F,
}

impl<F: Fetcher> FetchingScriptHost<F> {
    /// Create a host that fetches scripts with `fetcher`.
    #[must_use]
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

impl<F: Fetcher> ScriptHost for FetchingScriptHost<F> {
    async fn insert_script(&self, url: &str, attributes: &[&str]) -> Result<(), LoadError> {
        tracing::debug!(url, ?attributes, "Inserting script");
        self.fetcher
            .fetch(url)
            .await
            .map(drop)
            .map_err(|err| LoadError::Failed {
                url: url.to_owned(),
                reason: err.to_string(),
            })
    }
}

/// Ensures scripts execute exactly once, deduplicated through a
/// [`ResourceCache`].
pub struct ScriptLoader<'a, S> {
    cache: &'a ResourceCache,
    host: &'a S,
}

impl<'a, S: ScriptHost> ScriptLoader<'a, S> {
    /// Create a loader over `cache` and `host`.
    pub fn new(cache: &'a ResourceCache, host: &'a S) -> Self {
        Self { cache, host }
    }

    /// Make sure the capability behind `signal` is available.
    ///
    /// Resolves immediately if `probe` reports it present, without touching
    /// the cache. Otherwise the first caller for `signal` inserts the script
    /// and completes the cache entry; concurrent callers wait for that
    /// completion instead of inserting again. A failed load is not cached:
    /// the entry is dropped so a later call retries.
    pub async fn ensure(
        &self,
        url: &str,
        probe: &dyn Fn() -> bool,
        signal: &str,
        attributes: &[&str],
    ) -> Result<(), LoadError> {
        if probe() {
            return Ok(());
        }

        match self.cache.claim(signal) {
            Claim::Loaded(_) => Ok(()),
            Claim::Pending(waiter) => waiter.wait().await.map_err(|_| LoadError::Abandoned {
                url: url.to_owned(),
            }),
            Claim::Begun(guard) => match self.host.insert_script(url, attributes).await {
                Ok(()) => {
                    guard.complete(None);
                    Ok(())
                }
                Err(err) => {
                    tracing::warn!(url, error = %err, "Error loading script");
                    guard.abandon();
                    Err(err)
                }
            },
        }
    }
}
