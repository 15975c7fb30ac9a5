//! Style block assembly.

use std::sync::Arc;

use futures::future::join_all;
use zmd_cache::{Claim, ResourceCache};
use zmd_config::InstanceConfig;
use zmd_fetch::{FetchError, Fetcher};

use crate::template::Template;

/// Opening of every style block, including the host-level display rule.
pub const STYLE_PRELUDE: &str = r#"<style class="markdown-style">:host{display:block;contain:content;}"#;
/// Closing of every style block.
pub const STYLE_CLOSE: &str = "</style>";

/// Builds a widget's `<style>` block from a local override or fetched
/// stylesheets.
///
/// Stylesheets are cached process-wide by URL, so every widget on a page
/// shares one fetch per sheet. Failures never escape: the block degrades to
/// the prelude alone.
pub struct StyleAssembler<'a, F> {
    cache: &'a ResourceCache,
    fetcher: &'a F,
}

impl<'a, F: Fetcher> StyleAssembler<'a, F> {
    /// Create an assembler over `cache` and `fetcher`.
    pub fn new(cache: &'a ResourceCache, fetcher: &'a F) -> Self {
        Self { cache, fetcher }
    }

    /// Build the style block for one render cycle.
    pub async fn build(&self, config: &InstanceConfig, template: Option<&Template>) -> String {
        if let Some(style) = template.and_then(Template::style) {
            return style_block(&[style]);
        }

        if config.stylesheet_urls.is_empty() {
            tracing::warn!("No styles are defined");
            return style_block(&[]);
        }

        let sheets = join_all(
            config
                .stylesheet_urls
                .iter()
                .map(|url| self.stylesheet(url)),
        )
        .await;

        match sheets.into_iter().collect::<Result<Vec<_>, _>>() {
            Ok(sheets) => {
                let sheets: Vec<&str> = sheets.iter().map(|sheet| &**sheet).collect();
                style_block(&sheets)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Error loading styles, using prelude only");
                style_block(&[])
            }
        }
    }

    /// Fetch one stylesheet through the cache.
    ///
    /// The first requester fetches; concurrent requesters wait for it and
    /// read the same cached text. A failed fetch is not cached.
    pub async fn stylesheet(&self, url: &str) -> Result<Arc<str>, FetchError> {
        let abandoned = || FetchError::Abandoned {
            url: url.to_owned(),
        };

        match self.cache.claim(url) {
            Claim::Loaded(entry) => Ok(entry.data),
            Claim::Pending(waiter) => {
                waiter.wait().await.map_err(|_| abandoned())?;
                self.cache
                    .get(url)
                    .map(|entry| entry.data)
                    .ok_or_else(abandoned)
            }
            Claim::Begun(guard) => {
                // Dropping the guard on error abandons the entry
                let text = self.fetcher.fetch(url).await?;
                Ok(guard.complete(Some(text)).data)
            }
        }
    }
}

fn style_block(sheets: &[&str]) -> String {
    let mut block = String::from(STYLE_PRELUDE);
    for sheet in sheets {
        block.push_str(sheet);
    }
    block.push_str(STYLE_CLOSE);
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use zmd_config::{Attributes, instance::CSS_URLS};
    use zmd_fetch::MockFetcher;

    fn config(css_urls: &str) -> InstanceConfig {
        InstanceConfig::from_attributes(&Attributes::new().with(CSS_URLS, css_urls)).unwrap()
    }

    fn prelude_only() -> String {
        format!("{STYLE_PRELUDE}{STYLE_CLOSE}")
    }

    #[tokio::test]
    async fn test_override_skips_network() {
        let cache = ResourceCache::new();
        let fetcher = MockFetcher::new().with_response("a.css", "a{}");
        let template = Template::new().with_style("h1{color:red}");

        let block = StyleAssembler::new(&cache, &fetcher)
            .build(&config(r#"["a.css"]"#), Some(&template))
            .await;

        assert_eq!(block, format!("{STYLE_PRELUDE}h1{{color:red}}{STYLE_CLOSE}"));
        assert!(fetcher.requests().is_empty());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_no_urls_is_prelude_only() {
        let cache = ResourceCache::new();
        let fetcher = MockFetcher::new();

        let block = StyleAssembler::new(&cache, &fetcher)
            .build(&config("[]"), None)
            .await;

        assert_eq!(block, prelude_only());
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_sheets_concatenate_in_configured_order() {
        let cache = ResourceCache::new();
        let fetcher = MockFetcher::new()
            .with_response("z.css", "z{}")
            .with_response("a.css", "a{}");

        let block = StyleAssembler::new(&cache, &fetcher)
            .build(&config(r#"["z.css", "a.css"]"#), None)
            .await;

        assert_eq!(block, format!("{STYLE_PRELUDE}z{{}}a{{}}{STYLE_CLOSE}"));
        assert_eq!(cache.get("z.css").unwrap().data.as_ref(), "z{}");
    }

    #[tokio::test]
    async fn test_failing_sheets_degrade_to_prelude() {
        let cache = ResourceCache::new();
        let fetcher = MockFetcher::new()
            .with_status("a.css", 500)
            .with_status("b.css", 404);

        let block = StyleAssembler::new(&cache, &fetcher)
            .build(&config(r#"["a.css", "b.css"]"#), None)
            .await;

        assert_eq!(block, prelude_only());
        assert!(!cache.has("a.css"));
        assert!(!cache.has("b.css"));
    }

    #[tokio::test]
    async fn test_one_failing_sheet_degrades_to_prelude() {
        let cache = ResourceCache::new();
        let fetcher = MockFetcher::new().with_response("good.css", "p{}");

        let block = StyleAssembler::new(&cache, &fetcher)
            .build(&config(r#"["good.css", "missing.css"]"#), None)
            .await;

        assert_eq!(block, prelude_only());
        // The successful sheet stays cached for later cycles
        assert!(cache.get("good.css").unwrap().loaded);
    }

    #[tokio::test]
    async fn test_concurrent_requests_fetch_once() {
        let cache = ResourceCache::new();
        let fetcher = MockFetcher::new()
            .with_response("shared.css", "body{}")
            .with_yields(3);
        let assembler = StyleAssembler::new(&cache, &fetcher);

        let sheets = join_all((0..5).map(|_| assembler.stylesheet("shared.css"))).await;

        assert_eq!(fetcher.request_count("shared.css"), 1);
        for sheet in sheets {
            assert_eq!(sheet.unwrap().as_ref(), "body{}");
        }
    }

    #[tokio::test]
    async fn test_cached_sheet_is_not_refetched() {
        let cache = ResourceCache::new();
        let fetcher = MockFetcher::new().with_response("a.css", "a{}");
        let assembler = StyleAssembler::new(&cache, &fetcher);
        let config = config(r#"["a.css"]"#);

        let first = assembler.build(&config, None).await;
        let second = assembler.build(&config, None).await;

        assert_eq!(first, second);
        assert_eq!(fetcher.request_count("a.css"), 1);
    }

    #[tokio::test]
    async fn test_concurrent_waiters_fail_with_abandoned() {
        let cache = ResourceCache::new();
        let fetcher = MockFetcher::new().with_status("gone.css", 410);
        let assembler = StyleAssembler::new(&cache, &fetcher);

        let (first, second) = tokio::join!(
            assembler.stylesheet("gone.css"),
            assembler.stylesheet("gone.css"),
        );

        assert!(matches!(first, Err(FetchError::Status { status: 410, .. })));
        assert_eq!(
            second,
            Err(FetchError::Abandoned {
                url: "gone.css".to_owned()
            })
        );
        assert_eq!(fetcher.request_count("gone.css"), 1);
    }
}
