use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::lookup::Lookup;
use crate::stats::LookupResult;

/// Fixed attempt budget with a constant pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff: Duration::from_secs(5),
        }
    }
}

pub struct Resolver<L> {
    lookup: L,
    policy: RetryPolicy,
}

impl<L: Lookup> Resolver<L> {
    pub fn new(lookup: L, policy: RetryPolicy) -> Self {
        Self { lookup, policy }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Resolves one address. Never fails: every error ends as `Unresolved`.
    pub async fn resolve(&self, ip: &str) -> LookupResult {
        self.resolve_inner(ip, None).await
    }

    /// Like [`resolve`](Self::resolve), but each request first takes a permit from `gate`.
    /// The permit is released before any backoff pause.
    pub async fn resolve_gated(&self, ip: &str, gate: &Semaphore) -> LookupResult {
        self.resolve_inner(ip, Some(gate)).await
    }

    async fn resolve_inner(&self, ip: &str, gate: Option<&Semaphore>) -> LookupResult {
        let retries = self.policy.retries;

        for attempt in 1..=retries {
            let answer = match gate {
                // A closed semaphore only means nobody limits us any more.
                Some(gate) => {
                    let _permit = gate.acquire().await.ok();
                    self.lookup.lookup(ip).await
                }
                None => self.lookup.lookup(ip).await,
            };

            match answer {
                Ok(Some(asn)) => return LookupResult::Resolved { asn },
                Ok(None) => {
                    debug!(action = "resolve", component = "resolver", ip, "Response carried no ASN");
                    return LookupResult::Unattributed;
                }
                Err(e) if e.is_transient() => {
                    if attempt == retries {
                        warn!(action = "give_up", component = "resolver", ip, attempt, error = %e, "Lookup failed, retries exhausted");
                        break;
                    }
                    warn!(
                        action = "retry",
                        component = "resolver",
                        ip,
                        attempt,
                        retries,
                        backoff_s = self.policy.backoff.as_secs_f32(),
                        error = %e,
                        "Lookup failed, retrying"
                    );
                    tokio::time::sleep(self.policy.backoff).await;
                }
                Err(e) => {
                    warn!(action = "fail", component = "resolver", ip, attempt, error = %e, "Lookup failed");
                    return LookupResult::Unresolved;
                }
            }
        }

        LookupResult::Unresolved
    }
}
