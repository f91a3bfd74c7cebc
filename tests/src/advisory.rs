#![cfg(test)]
//! Advisory cache behavior under concurrency: call collapsing, cache
//! hits, and retry-after-failure.

use std::time::Duration;

use vantage_core::advisory::{AdvisoryCache, AdvisoryState};

use crate::util::CountingAdvisor;

#[tokio::test]
async fn concurrent_requests_collapse_into_one_call() {
    let provider = CountingAdvisor::new(Duration::from_millis(20));
    let cache = AdvisoryCache::new(provider.clone());

    let mut handles: Vec<_> = (0..8).map(|_| cache.request("CVE-2021-44790")).collect();

    let mut texts = Vec::new();
    for handle in &mut handles {
        match handle.wait().await {
            AdvisoryState::Ready(text) => texts.push(text),
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    assert_eq!(provider.calls(), 1);
    assert!(
        texts.iter().all(|t| t == &texts[0]),
        "all waiters observe the same advisory"
    );
}

#[tokio::test]
async fn later_requests_hit_the_cache() {
    let provider = CountingAdvisor::new(Duration::ZERO);
    let cache = AdvisoryCache::new(provider.clone());

    cache.request("CVE-2020-14145").wait().await;

    // The entry is already terminal; no new provider call, no waiting.
    let handle = cache.request("CVE-2020-14145");
    assert!(matches!(handle.state(), AdvisoryState::Ready(_)));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn failed_advisory_is_retryable_after_invalidate() {
    let provider = CountingAdvisor::failing_first(Duration::ZERO, 1);
    let cache = AdvisoryCache::new(provider.clone());

    let state = cache.request("CVE-X").wait().await;
    assert!(matches!(state, AdvisoryState::Failed(_)));

    // Failures stick until the caller explicitly clears them.
    let state = cache.request("CVE-X").wait().await;
    assert!(matches!(state, AdvisoryState::Failed(_)));
    assert_eq!(provider.calls(), 1);

    assert!(cache.invalidate("CVE-X"));
    let state = cache.request("CVE-X").wait().await;
    assert!(matches!(state, AdvisoryState::Ready(_)));
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn distinct_keys_get_distinct_calls() {
    let provider = CountingAdvisor::new(Duration::ZERO);
    let cache = AdvisoryCache::new(provider.clone());

    let a = cache.request("CVE-2020-14145").wait().await;
    let b = cache.request("CVE-2021-44790").wait().await;

    assert_ne!(a, b);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn invalidating_an_unknown_key_is_a_noop() {
    let provider = CountingAdvisor::new(Duration::ZERO);
    let cache = AdvisoryCache::new(provider);

    assert!(!cache.invalidate("CVE-NOPE"));
    assert!(cache.state("CVE-NOPE").is_none());
}
