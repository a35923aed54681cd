use time::macros::format_description;
use tracing_subscriber::{fmt::time::LocalTime, EnvFilter};

/// Diagnostics go to stderr so they never land inside the redrawn block on stdout.
pub fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "info" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(LocalTime::new(format_description!(
            "[hour]:[minute]:[second]"
        )))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn validate_args(args: &crate::args::Args) -> anyhow::Result<()> {
    if args.top == 0 {
        anyhow::bail!("--top must be greater than 0");
    }

    if args.retries == 0 {
        anyhow::bail!("--retries must be greater than 0");
    }

    if args.concurrency == 0 {
        anyhow::bail!("--concurrency must be greater than 0");
    }

    if args.timeout == 0 {
        anyhow::bail!("--timeout must be greater than 0");
    }

    Ok(())
}
