//! Shared test doubles.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use zmd_cache::ResourceCache;
use zmd_fetch::MockFetcher;

use crate::environment::Environment;
use crate::error::LoadError;
use crate::script::ScriptHost;

/// Script host that records every insertion and yields once per load.
#[derive(Default)]
pub(crate) struct RecordingScriptHost {
    inserted: Mutex<Vec<(String, Vec<String>)>>,
    failing: HashSet<String>,
}

impl RecordingScriptHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_owned());
        self
    }

    pub(crate) fn inserted(&self) -> Vec<(String, Vec<String>)> {
        self.inserted.lock().unwrap().clone()
    }

    pub(crate) fn insert_count(&self, url: &str) -> usize {
        self.inserted
            .lock()
            .unwrap()
            .iter()
            .filter(|(inserted, _)| inserted == url)
            .count()
    }
}

impl ScriptHost for RecordingScriptHost {
    async fn insert_script(&self, url: &str, attributes: &[&str]) -> Result<(), LoadError> {
        self.inserted.lock().unwrap().push((
            url.to_owned(),
            attributes.iter().map(|&a| a.to_owned()).collect(),
        ));
        tokio::task::yield_now().await;

        if self.failing.contains(url) {
            return Err(LoadError::Failed {
                url: url.to_owned(),
                reason: "onerror".to_owned(),
            });
        }
        Ok(())
    }
}

pub(crate) type TestEnvironment = Environment<MockFetcher, RecordingScriptHost>;

/// Environment on an isolated cache with built-in engines reported present.
pub(crate) fn environment(fetcher: MockFetcher) -> TestEnvironment {
    Environment::new(fetcher, RecordingScriptHost::new()).with_cache(Arc::new(ResourceCache::new()))
}

/// Environment on an isolated cache whose engine scripts must be loaded.
pub(crate) fn loading_environment(
    fetcher: MockFetcher,
    scripts: RecordingScriptHost,
) -> TestEnvironment {
    Environment::new(fetcher, scripts)
        .with_cache(Arc::new(ResourceCache::new()))
        .with_renderer_probe(Arc::new(|| false))
        .with_highlighter_probe(Arc::new(|| false))
}
