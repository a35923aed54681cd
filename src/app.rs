use anyhow::{Context, Result};
use futures_util::StreamExt;
use std::io::{self, IsTerminal};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::dispatcher::dispatch;
use crate::input;
use crate::lookup::{HttpLookup, Lookup};
use crate::reporter::{Reporter, SummaryReporter, TerminalReporter};
use crate::resolver::{Resolver, RetryPolicy};
use crate::stats::{Aggregator, RunSummary};
use crate::Args;

/// Drains the dispatcher into the aggregator, redrawing after every result.
pub async fn rank_asns<L, R>(
    resolver: &Resolver<L>,
    ips: &[String],
    concurrency: usize,
    top: usize,
    reporter: &mut R,
) -> Result<RunSummary>
where
    L: Lookup,
    R: Reporter + ?Sized,
{
    let mut aggregator = Aggregator::new(ips.len());
    let mut results = std::pin::pin!(dispatch(resolver, ips, concurrency));

    while let Some(result) = results.next().await {
        aggregator.record(result);
        reporter
            .render(&aggregator.counters(), &aggregator.top_k(top))
            .context("Failed to draw progress")?;
    }

    let counters = aggregator.counters();
    let ranking = aggregator.top_k(top);
    reporter
        .finish(&counters, &ranking)
        .context("Failed to draw final ranking")?;

    Ok(RunSummary {
        counters,
        ranking,
        distinct_asns: aggregator.distinct_asns(),
    })
}

pub async fn analyze_targets(args: &Args) -> Result<RunSummary> {
    let total_start_time = Instant::now();
    info!(action = "start", component = "analysis", "Starting ASN analysis");

    let targets = input::load_targets(&args.input)?;

    let lookup = HttpLookup::new(&args.endpoint, Duration::from_secs(args.timeout))?;
    let policy = RetryPolicy {
        retries: args.retries,
        backoff: Duration::from_secs(args.backoff),
    };
    info!(
        action = "configure",
        component = "analysis",
        endpoint = %args.endpoint,
        retries = policy.retries,
        backoff_s = args.backoff,
        "Lookup configured"
    );
    let resolver = Resolver::new(lookup, policy);

    let stdout = io::stdout();
    let mut reporter: Box<dyn Reporter> = if args.plain || !stdout.is_terminal() {
        Box::new(SummaryReporter::new(stdout))
    } else {
        Box::new(TerminalReporter::new(stdout))
    };

    let summary = rank_asns(&resolver, &targets, args.concurrency, args.top, reporter.as_mut()).await?;

    if summary.counters.unattributed > 0 {
        info!(
            action = "complete",
            component = "analysis",
            unattributed = summary.counters.unattributed,
            "Some responses carried no ASN; they count as checked but are not ranked"
        );
    }
    if !summary.counters.is_complete() {
        warn!(
            action = "complete",
            component = "analysis",
            checked = summary.counters.checked,
            total = summary.counters.total,
            "Run ended before every target was checked"
        );
    }
    info!(
        action = "complete",
        component = "analysis",
        checked = summary.counters.checked,
        failed = summary.counters.failed,
        distinct_asns = summary.distinct_asns,
        duration_ms = total_start_time.elapsed().as_millis(),
        "Analysis completed"
    );

    Ok(summary)
}
