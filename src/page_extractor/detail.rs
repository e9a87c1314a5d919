//! Detail-page fetchers backed by the shared browser

use std::path::Path;

use async_trait::async_trait;
use chromiumoxide::{Browser, Page};
use log::{debug, info};

use super::extractors::navigate;
use super::js_scripts::detail_script;
use super::schema::RawExtensionDetail;
use crate::config::PageTimeouts;
use crate::content_saver::save_snapshot;
use crate::crawl_engine::crawl_types::{HarvestError, HarvestResult, WorkItem};
use crate::crawl_engine::exploration::DetailFetcher;
use crate::crawl_engine::page_timeout::with_page_timeout;
use crate::crawl_engine::rescrape::{Materialized, Materializer};
use crate::store::{ExtensionFields, ExtensionRecord};

/// Each call opens its own tab, so concurrent tasks never share a page.
pub struct ChromiumDetailFetcher<'a> {
    browser: &'a Browser,
    timeouts: PageTimeouts,
    script: String,
}

impl<'a> ChromiumDetailFetcher<'a> {
    pub fn new(browser: &'a Browser, timeouts: PageTimeouts) -> Self {
        Self {
            browser,
            timeouts,
            script: detail_script(),
        }
    }

    /// Run `work` against a fresh tab on `url`; the tab is closed either way.
    async fn with_page<T, F, Fut>(&self, url: &str, work: F) -> HarvestResult<T>
    where
        F: FnOnce(Page) -> Fut,
        Fut: std::future::Future<Output = HarvestResult<T>>,
    {
        let page = with_page_timeout(
            async {
                self.browser
                    .new_page("about:blank")
                    .await
                    .map_err(|e| HarvestError::Browser(format!("new tab: {e}")))
            },
            self.timeouts.action_secs,
            "Open tab",
        )
        .await?;

        let result = match navigate(&page, url, self.timeouts.navigation_secs).await {
            Ok(()) => work(page.clone()).await,
            Err(e) => Err(e),
        };

        if let Err(e) = page.close().await {
            debug!("Failed to close tab for {url}: {e}");
        }
        result
    }

    async fn read_detail(&self, page: &Page) -> HarvestResult<RawExtensionDetail> {
        with_page_timeout(
            async {
                page.evaluate(self.script.as_str())
                    .await
                    .map_err(|e| HarvestError::Extraction(format!("detail script: {e}")))?
                    .into_value::<RawExtensionDetail>()
                    .map_err(|e| HarvestError::Extraction(format!("detail result: {e}")))
            },
            self.timeouts.action_secs,
            "Detail extraction",
        )
        .await
    }
}

#[async_trait]
impl DetailFetcher for ChromiumDetailFetcher<'_> {
    async fn fetch_details(&self, item: &WorkItem) -> HarvestResult<ExtensionFields> {
        let raw = self
            .with_page(&item.url, |page| async move { self.read_detail(&page).await })
            .await?;
        Ok(raw.into_fields(&item.url))
    }
}

#[async_trait]
impl Materializer for ChromiumDetailFetcher<'_> {
    async fn materialize(
        &self,
        record: &ExtensionRecord,
        url: &str,
        save_dir: &Path,
    ) -> HarvestResult<Materialized> {
        let (raw, html) = self
            .with_page(url, |page| async move {
                let raw = self.read_detail(&page).await?;
                let html = with_page_timeout(
                    async {
                        page.content()
                            .await
                            .map_err(|e| HarvestError::Extraction(format!("page content: {e}")))
                    },
                    self.timeouts.action_secs,
                    "Snapshot",
                )
                .await?;
                Ok::<_, HarvestError>((raw, html))
            })
            .await?;

        let fields = raw.into_fields(url);

        // Folder is named after the rendered title, falling back to what the store knows
        let display_name = fields
            .name
            .clone()
            .or_else(|| record.fields.name.clone())
            .unwrap_or_default();

        let path = save_snapshot(save_dir, &display_name, &record.identifier, url, &html).await?;
        info!("Saved {} to {}", record.identifier, path.display());
        Ok(Materialized { fields, path })
    }
}
