use futures_util::stream::{FuturesUnordered, Stream};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::info;

use crate::lookup::Lookup;
use crate::resolver::Resolver;
use crate::stats::LookupResult;

/// Starts one resolution per address and yields results in completion order.
///
/// Every unit is created up front and polled on the caller's task, but at most
/// `concurrency` requests are in flight at once; units sleeping through a
/// backoff do not count. The stream ends after exactly `ips.len()` items.
pub fn dispatch<'a, L: Lookup>(
    resolver: &'a Resolver<L>,
    ips: &'a [String],
    concurrency: usize,
) -> impl Stream<Item = LookupResult> + 'a {
    let concurrency = concurrency.clamp(1, Semaphore::MAX_PERMITS);
    info!(
        action = "configure",
        component = "dispatcher",
        target_count = ips.len(),
        concurrency,
        "Dispatching lookups"
    );

    let permits = Arc::new(Semaphore::new(concurrency));
    ips.iter()
        .map(move |ip| {
            let permits = Arc::clone(&permits);
            async move { resolver.resolve_gated(ip, &permits).await }
        })
        .collect::<FuturesUnordered<_>>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{Lookup, LookupError};
    use crate::resolver::RetryPolicy;
    use async_trait::async_trait;
    use futures_util::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// The last octet is both the ASN and the response delay in seconds.
    struct Delayed {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Delayed {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Lookup for Delayed {
        async fn lookup(&self, ip: &str) -> Result<Option<u32>, LookupError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let last: u32 = ip.rsplit('.').next().and_then(|o| o.parse().ok()).unwrap_or(0);
            tokio::time::sleep(Duration::from_secs(u64::from(last))).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Some(last))
        }
    }

    fn ips(octets: &[u32]) -> Vec<String> {
        octets.iter().map(|o| format!("192.0.2.{o}")).collect()
    }

    fn asns(results: &[LookupResult]) -> Vec<u32> {
        results
            .iter()
            .map(|r| match r {
                LookupResult::Resolved { asn } => *asn,
                other => panic!("unexpected {other:?}"),
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn yields_in_completion_order() {
        let resolver = Resolver::new(Delayed::new(), RetryPolicy::default());
        let targets = ips(&[3, 1, 2]);
        let results: Vec<LookupResult> = dispatch(&resolver, &targets, 8).collect().await;
        assert_eq!(asns(&results), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn respects_concurrency_limit() {
        let resolver = Resolver::new(Delayed::new(), RetryPolicy::default());
        let targets = ips(&[1, 1, 1, 1, 1, 1, 1]);
        let start = tokio::time::Instant::now();
        let results: Vec<LookupResult> = dispatch(&resolver, &targets, 2).collect().await;
        assert_eq!(results.len(), targets.len());
        assert_eq!(resolver_peak(&resolver), 2);
        // Seven one-second lookups, two at a time.
        assert!(start.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn launches_everything_when_unconstrained() {
        let resolver = Resolver::new(Delayed::new(), RetryPolicy::default());
        let targets = ips(&[2, 2, 2, 2, 2]);
        let results: Vec<LookupResult> = dispatch(&resolver, &targets, 64).collect().await;
        assert_eq!(results.len(), 5);
        assert_eq!(resolver_peak(&resolver), 5);
    }

    fn resolver_peak(resolver: &Resolver<Delayed>) -> usize {
        resolver.lookup().peak.load(Ordering::SeqCst)
    }

    #[tokio::test(start_paused = true)]
    async fn empty_input_yields_nothing() {
        let resolver = Resolver::new(Delayed::new(), RetryPolicy::default());
        let results: Vec<LookupResult> = dispatch(&resolver, &[], 4).collect().await;
        assert!(results.is_empty());
        assert_eq!(resolver_peak(&resolver), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_block_others() {
        struct Flaky;

        #[async_trait]
        impl Lookup for Flaky {
            async fn lookup(&self, ip: &str) -> Result<Option<u32>, LookupError> {
                if ip == "bad" {
                    Err(LookupError::Unavailable(reqwest::StatusCode::GATEWAY_TIMEOUT))
                } else {
                    Ok(Some(64500))
                }
            }
        }

        let resolver = Resolver::new(Flaky, RetryPolicy::default());
        let targets = vec!["bad".to_string(), "good".to_string()];
        let results: Vec<LookupResult> = dispatch(&resolver, &targets, 1).collect().await;
        assert_eq!(
            results,
            vec![LookupResult::Resolved { asn: 64500 }, LookupResult::Unresolved]
        );
    }
}
