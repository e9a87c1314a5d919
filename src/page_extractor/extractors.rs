//! Listing-page candidate extraction
//!
//! The listing markup comes in several variants. Each variant is covered by a
//! selector strategy; all strategies run on every extraction and their
//! results are unioned, so the crawl loop never needs to know which variant
//! it is looking at.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::Page;
use log::{debug, info, trace};

use super::js_scripts::{candidate_links_script, scroll_script};
use super::schema::SelectorHits;
use crate::config::PageTimeouts;
use crate::crawl_engine::crawl_types::{HarvestError, HarvestResult};
use crate::crawl_engine::exploration::ListingSession;
use crate::crawl_engine::page_timeout::with_page_timeout;
use crate::utils::ITEM_LINK_MARKER;

/// Ordered selector strategies plus the marker a detail link must carry
#[derive(Debug, Clone)]
pub struct CandidateExtractor {
    selectors: Vec<String>,
    marker: String,
    script: String,
}

impl CandidateExtractor {
    #[must_use]
    pub fn new(selectors: Vec<String>) -> Self {
        let script = candidate_links_script(&selectors);
        Self {
            selectors,
            marker: ITEM_LINK_MARKER.to_string(),
            script,
        }
    }

    #[must_use]
    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }

    /// Union of every strategy's hits, in first-seen order, restricted to
    /// detail links.
    #[must_use]
    pub fn retain_candidates(&self, hits: Vec<SelectorHits>) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();

        for hit in hits {
            trace!("Selector {:?} matched {} links", hit.selector, hit.hrefs.len());
            for href in hit.hrefs {
                if href.contains(&self.marker) && seen.insert(href.clone()) {
                    urls.push(href);
                }
            }
        }
        urls
    }

    /// Evaluate the strategies against `page`
    pub async fn extract(&self, page: &Page, timeout_secs: u64) -> HarvestResult<Vec<String>> {
        let hits = with_page_timeout(
            async {
                page.evaluate(self.script.as_str())
                    .await
                    .map_err(|e| HarvestError::Extraction(format!("candidate script: {e}")))?
                    .into_value::<Vec<SelectorHits>>()
                    .map_err(|e| HarvestError::Extraction(format!("candidate result: {e}")))
            },
            timeout_secs,
            "Candidate extraction",
        )
        .await?;

        Ok(self.retain_candidates(hits))
    }
}

/// Poll for `selector` until it appears or `timeout_secs` elapse
pub async fn wait_for_selector(page: &Page, selector: &str, timeout_secs: u64) -> HarvestResult<()> {
    let timeout = Duration::from_secs(timeout_secs);
    let poll_interval = Duration::from_millis(250);
    let start = Instant::now();

    loop {
        if page.find_element(selector).await.is_ok() {
            debug!("{selector} present after {:.2}s", start.elapsed().as_secs_f64());
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(HarvestError::Timeout {
                operation: format!("Waiting for {selector}"),
                secs: timeout_secs,
            });
        }
        tokio::time::sleep(poll_interval).await;
    }
}

/// Navigate `page` to `url` and wait for the load to finish
pub async fn navigate(page: &Page, url: &str, timeout_secs: u64) -> HarvestResult<()> {
    let navigation_error = |e: chromiumoxide::error::CdpError| HarvestError::Navigation {
        url: url.to_string(),
        message: e.to_string(),
    };

    with_page_timeout(
        async {
            page.goto(url).await.map_err(navigation_error)?;
            page.wait_for_navigation().await.map_err(navigation_error)?;
            Ok(())
        },
        timeout_secs,
        "Navigation",
    )
    .await
}

/// The listing tab of a discovery run
pub struct ChromiumListing {
    page: Page,
    extractor: CandidateExtractor,
    ready_selector: String,
    scroll_viewports: u32,
    timeouts: PageTimeouts,
}

impl ChromiumListing {
    pub fn new(
        page: Page,
        extractor: CandidateExtractor,
        ready_selector: String,
        scroll_viewports: u32,
        timeouts: PageTimeouts,
    ) -> Self {
        Self {
            page,
            extractor,
            ready_selector,
            scroll_viewports,
            timeouts,
        }
    }

    pub async fn close(self) {
        if let Err(e) = self.page.close().await {
            debug!("Failed to close listing page: {e}");
        }
    }
}

#[async_trait]
impl ListingSession for ChromiumListing {
    async fn navigate(&mut self, url: &str) -> HarvestResult<()> {
        info!("Navigating to listing: {url}");
        navigate(&self.page, url, self.timeouts.navigation_secs).await?;
        wait_for_selector(&self.page, &self.ready_selector, self.timeouts.selector_secs).await
    }

    async fn extract_candidates(&mut self) -> HarvestResult<Vec<String>> {
        self.extractor
            .extract(&self.page, self.timeouts.action_secs)
            .await
    }

    async fn scroll_forward(&mut self) -> HarvestResult<()> {
        let script = scroll_script(self.scroll_viewports);
        with_page_timeout(
            async {
                self.page
                    .evaluate(script.as_str())
                    .await
                    .map(|_| ())
                    .map_err(|e| HarvestError::Browser(format!("scroll: {e}")))
            },
            self.timeouts.action_secs,
            "Scroll",
        )
        .await
    }
}
