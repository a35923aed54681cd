pub mod app;
pub mod args;
pub mod dispatcher;
pub mod input;
pub mod lookup;
pub mod reporter;
pub mod resolver;
pub mod stats;
pub mod utils;

pub use app::{analyze_targets, rank_asns};
pub use args::Args;
pub use lookup::{HttpLookup, Lookup, LookupError};
pub use reporter::{Reporter, SummaryReporter, TerminalReporter};
pub use resolver::{Resolver, RetryPolicy};
pub use stats::{Aggregator, AsnCount, LookupResult, ProgressCounters, RunSummary};
