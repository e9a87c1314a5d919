//! Exploration loop scenarios driven through scripted listings

use std::sync::atomic::Ordering;

use marketscrape::crawl_engine::{
    CrawlSession, ExplorationLoop, NoOpProgress, ScrollBudget, SortMode, Termination,
};
use marketscrape::store::{ExtensionFields, ExtensionStore};

mod common;

use common::{
    FakeFetcher, FakeListing, FlakyStore, RecordingProgress, detail_url, memory_store,
    test_settings,
};

fn urls(identifiers: &[&str]) -> Vec<String> {
    identifiers.iter().map(|id| detail_url(id)).collect()
}

#[tokio::test]
async fn test_mode_exhausts_after_consecutive_empty_scrolls() {
    let store = memory_store().await;
    let fetcher = FakeFetcher::new();
    let session = CrawlSession::new();

    // Nothing on first render, two items after the first scroll, then the DOM never changes
    let mut listing = FakeListing::new(vec![vec![], urls(&["acme.alpha", "acme.beta"])]);
    let exploration = ExplorationLoop::new(
        &store,
        &fetcher,
        &NoOpProgress,
        test_settings(&[SortMode::Installs], 4),
    )
    .unwrap();

    let report = exploration.run(&mut listing, &session).await.unwrap();

    assert_eq!(report.modes.len(), 1);
    let mode = &report.modes[0];
    assert_eq!(mode.scrolls, 9);
    assert_eq!(mode.termination, Termination::Exhausted);
    assert_eq!(mode.discovered, 2);
    assert_eq!(mode.outcome.succeeded, 2);
    assert_eq!(report.total_processed, 2);
    assert_eq!(fetcher.calls(), 2);
    assert_eq!(listing.scrolls, 9);

    assert!(store.find("acme.alpha").await.unwrap().is_some());
    assert!(store.find("acme.beta").await.unwrap().is_some());
}

#[tokio::test]
async fn test_first_render_does_not_count_as_a_scroll() {
    let store = memory_store().await;
    let fetcher = FakeFetcher::new();
    let session = CrawlSession::new();

    let mut listing = FakeListing::new(vec![urls(&["acme.alpha", "acme.beta"])]);
    let exploration = ExplorationLoop::new(
        &store,
        &fetcher,
        &NoOpProgress,
        test_settings(&[SortMode::Installs], 4),
    )
    .unwrap();

    let report = exploration.run(&mut listing, &session).await.unwrap();

    assert_eq!(report.modes[0].scrolls, 8);
    assert_eq!(report.modes[0].termination, Termination::Exhausted);
    assert_eq!(report.total_processed, 2);
}

#[tokio::test]
async fn test_already_stored_identifier_is_never_fetched() {
    let store = memory_store().await;
    store
        .upsert(
            "acme.tool",
            &ExtensionFields {
                name: Some("Acme Tool".into()),
                url: Some(detail_url("acme.tool")),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let fetcher = FakeFetcher::new();
    let session = CrawlSession::new();
    let mut listing = FakeListing::new(vec![urls(&["acme.tool", "acme.other"])]);
    let exploration = ExplorationLoop::new(
        &store,
        &fetcher,
        &NoOpProgress,
        test_settings(&[SortMode::Installs], 4),
    )
    .unwrap();

    let report = exploration.run(&mut listing, &session).await.unwrap();

    assert_eq!(fetcher.fetched(), vec!["acme.other".to_string()]);
    assert_eq!(report.modes[0].discovered, 2);
    assert_eq!(report.modes[0].outcome.total(), 1);
    assert_eq!(report.total_processed, 1);

    let kept = store.find("acme.tool").await.unwrap().unwrap();
    assert_eq!(kept.fields.name.as_deref(), Some("Acme Tool"));
}

#[tokio::test]
async fn test_new_urls_reset_the_empty_streak() {
    let store = memory_store().await;
    let fetcher = FakeFetcher::new();
    let session = CrawlSession::new();
    let progress = RecordingProgress::default();

    let a = urls(&["acme.a"]);
    let ab = urls(&["acme.a", "acme.b"]);
    // Scrolls 1-3 empty, scroll 4 reveals acme.b, then eight more empty scrolls
    let mut listing = FakeListing::new(vec![a.clone(), a.clone(), a.clone(), a, ab]);
    let exploration = ExplorationLoop::new(
        &store,
        &fetcher,
        &progress,
        test_settings(&[SortMode::Rating], 2),
    )
    .unwrap();

    let report = exploration.run(&mut listing, &session).await.unwrap();

    assert_eq!(report.modes[0].scrolls, 12);
    assert_eq!(report.modes[0].termination, Termination::Exhausted);
    assert_eq!(fetcher.calls(), 2);

    let events = progress.events();
    assert!(events.contains(&"scroll Rating 3 3 0".to_string()));
    assert!(events.contains(&"scroll Rating 4 0 1".to_string()));
    assert!(events.contains(&"scroll Rating 12 8 0".to_string()));
    assert_eq!(events.last().map(String::as_str), Some("completed 2"));
}

#[tokio::test]
async fn test_scroll_limit_ends_a_productive_mode() {
    let store = memory_store().await;
    let fetcher = FakeFetcher::new();
    let session = CrawlSession::new();

    // Every scroll reveals one more item
    let script: Vec<Vec<String>> = (0..20)
        .map(|n| (0..=n).map(|i| detail_url(&format!("acme.item{i}"))).collect())
        .collect();
    let mut listing = FakeListing::new(script);

    let mut settings = test_settings(&[SortMode::Name], 3);
    settings.budget = ScrollBudget {
        max_scrolls: 5,
        max_empty_scrolls: 8,
    };
    let exploration = ExplorationLoop::new(&store, &fetcher, &NoOpProgress, settings).unwrap();

    let report = exploration.run(&mut listing, &session).await.unwrap();

    assert_eq!(report.modes[0].scrolls, 5);
    assert_eq!(report.modes[0].termination, Termination::ScrollLimit);
    // First render plus one new item per scroll
    assert_eq!(report.total_processed, 6);
}

#[tokio::test]
async fn test_navigation_failure_skips_only_that_mode() {
    let store = memory_store().await;
    let fetcher = FakeFetcher::new();
    let session = CrawlSession::new();
    let progress = RecordingProgress::default();

    let mut listing = FakeListing::new(vec![urls(&["acme.alpha", "acme.beta"])])
        .fail_mode(SortMode::Installs);
    let exploration = ExplorationLoop::new(
        &store,
        &fetcher,
        &progress,
        test_settings(&[SortMode::Installs, SortMode::Rating], 4),
    )
    .unwrap();

    let report = exploration.run(&mut listing, &session).await.unwrap();

    assert_eq!(report.modes.len(), 2);
    assert_eq!(report.modes[0].termination, Termination::NavigationFailed);
    assert_eq!(report.modes[0].scrolls, 0);
    assert_eq!(report.modes[1].termination, Termination::Exhausted);
    assert_eq!(report.total_processed, 2);
    assert_eq!(listing.navigations.len(), 2);
    assert!(listing.navigations[0].ends_with("sortBy=Installs"));
    assert_eq!(progress.count_prefix("error Installs"), 1);
}

#[tokio::test]
async fn test_later_modes_skip_items_seen_earlier_in_the_run() {
    let store = memory_store().await;
    let fetcher = FakeFetcher::new();
    let session = CrawlSession::new();

    let mut listing = FakeListing::new(vec![urls(&["acme.alpha", "acme.beta"])]);
    let exploration = ExplorationLoop::new(
        &store,
        &fetcher,
        &NoOpProgress,
        test_settings(&[SortMode::Installs, SortMode::UpdatedDate], 4),
    )
    .unwrap();

    let report = exploration.run(&mut listing, &session).await.unwrap();

    assert_eq!(report.modes[1].discovered, 0);
    assert_eq!(report.modes[1].termination, Termination::Exhausted);
    assert_eq!(fetcher.calls(), 2);
    assert_eq!(report.total_processed, 2);
}

#[tokio::test]
async fn test_failed_detail_fetch_is_counted_not_stored() {
    let store = memory_store().await;
    let fetcher = FakeFetcher::failing_on(&["acme.broken"]);
    let session = CrawlSession::new();

    let mut listing = FakeListing::new(vec![urls(&["acme.ok", "acme.broken"])]);
    let exploration = ExplorationLoop::new(
        &store,
        &fetcher,
        &NoOpProgress,
        test_settings(&[SortMode::Installs], 4),
    )
    .unwrap();

    let report = exploration.run(&mut listing, &session).await.unwrap();

    let outcome = report.outcome();
    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.failed, 1);
    assert_eq!(report.total_processed, 2);
    assert!(store.find("acme.broken").await.unwrap().is_none());
    // Zero downloads survive the round trip through the store
    let stored = store.find("acme.ok").await.unwrap().unwrap();
    assert_eq!(stored.fields.downloads, Some(0));
}

#[tokio::test]
async fn test_links_without_identifier_are_dropped() {
    let store = memory_store().await;
    let fetcher = FakeFetcher::new();
    let session = CrawlSession::new();

    let mut candidates = urls(&["acme.alpha"]);
    candidates.push("https://marketplace.visualstudio.com/publishers/acme".to_string());
    candidates.push("https://marketplace.visualstudio.com/items?itemName=".to_string());
    let mut listing = FakeListing::new(vec![candidates]);
    let exploration = ExplorationLoop::new(
        &store,
        &fetcher,
        &NoOpProgress,
        test_settings(&[SortMode::Installs], 4),
    )
    .unwrap();

    let report = exploration.run(&mut listing, &session).await.unwrap();

    assert_eq!(fetcher.fetched(), vec!["acme.alpha".to_string()]);
    assert_eq!(report.total_processed, 1);
}

#[tokio::test]
async fn test_many_items_all_settle_across_waves() {
    let store = memory_store().await;
    let fetcher = FakeFetcher::new();
    let session = CrawlSession::new();

    let ids: Vec<String> = (0..10).map(|i| format!("acme.bulk{i}")).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let mut listing = FakeListing::new(vec![urls(&id_refs)]);
    let exploration = ExplorationLoop::new(
        &store,
        &fetcher,
        &NoOpProgress,
        test_settings(&[SortMode::ReleaseDate], 3),
    )
    .unwrap();

    let report = exploration.run(&mut listing, &session).await.unwrap();

    assert_eq!(report.modes[0].outcome.succeeded, 10);
    assert_eq!(session.identifier_count(), 10);
    assert_eq!(store.stats().await.unwrap().total, 10);
}

#[tokio::test]
async fn test_zero_concurrency_is_rejected() {
    let store = memory_store().await;
    let fetcher = FakeFetcher::new();

    let result = ExplorationLoop::new(
        &store,
        &fetcher,
        &NoOpProgress,
        test_settings(&[SortMode::Installs], 0),
    );

    assert!(result.is_err());
}

#[tokio::test]
async fn test_busy_store_during_discovery_is_retried() {
    let store = FlakyStore::new().await;
    store.busy_existence.store(1, Ordering::SeqCst);
    store.busy_upserts.store(2, Ordering::SeqCst);
    let fetcher = FakeFetcher::new();
    let session = CrawlSession::new();

    let ids = ["acme.a", "acme.b", "acme.c", "acme.d", "acme.e"];
    let mut listing = FakeListing::new(vec![urls(&ids)]);
    let exploration = ExplorationLoop::new(
        &store,
        &fetcher,
        &NoOpProgress,
        test_settings(&[SortMode::Installs], 5),
    )
    .unwrap();

    let report = exploration.run(&mut listing, &session).await.unwrap();

    assert_eq!(report.modes[0].outcome.succeeded, 5);
    assert_eq!(report.modes[0].outcome.failed, 0);
    // One batched check for the first render, plus its retry
    assert_eq!(store.existence_calls(), 2);
    assert_eq!(store.upsert_calls(), 7);
    assert_eq!(store.inner().stats().await.unwrap().total, 5);
}

#[tokio::test]
async fn test_one_existence_query_per_discovered_batch() {
    let store = FlakyStore::new().await;
    let fetcher = FakeFetcher::new();
    let session = CrawlSession::new();

    // First render, one productive scroll, then an unchanged DOM
    let mut listing = FakeListing::new(vec![
        urls(&["acme.a", "acme.b", "acme.c"]),
        urls(&["acme.a", "acme.b", "acme.c", "acme.d", "acme.e"]),
    ]);
    let exploration = ExplorationLoop::new(
        &store,
        &fetcher,
        &NoOpProgress,
        test_settings(&[SortMode::Installs], 2),
    )
    .unwrap();

    let report = exploration.run(&mut listing, &session).await.unwrap();

    assert_eq!(report.total_processed, 5);
    assert_eq!(store.existence_calls(), 2);
}

#[tokio::test]
async fn test_fatal_store_error_ends_the_run() {
    let mut store = FlakyStore::new().await;
    store.fatal_existence = true;
    let fetcher = FakeFetcher::new();
    let session = CrawlSession::new();

    let mut listing = FakeListing::new(vec![urls(&["acme.alpha", "acme.beta"])]);
    let exploration = ExplorationLoop::new(
        &store,
        &fetcher,
        &NoOpProgress,
        test_settings(&[SortMode::Installs, SortMode::Rating], 4),
    )
    .unwrap();

    let result = exploration.run(&mut listing, &session).await;

    assert!(result.is_err());
    // Not retried, and the second mode never starts
    assert_eq!(store.existence_calls(), 1);
    assert_eq!(listing.navigations.len(), 1);
    assert_eq!(fetcher.calls(), 0);
    assert_eq!(store.upsert_calls(), 0);
}
