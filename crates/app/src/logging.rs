use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber.
///
/// `--verbose` wins over any configured directive; otherwise the configured
/// directive applies, falling back to `info`. A directive that does not parse
/// is reported as a warning once the subscriber is up.
pub fn init_logger(directive: Option<&str>, verbose: bool) {
    let (filter, rejected) = build_filter(directive, verbose);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .compact(),
        )
        .init();

    if let Some((directive, reason)) = rejected {
        tracing::warn!(%directive, %reason, "invalid log filter; using {DEFAULT_FILTER}");
    }
}

/// Pick the filter, returning the rejected directive and parse error if any.
fn build_filter(directive: Option<&str>, verbose: bool) -> (EnvFilter, Option<(String, String)>) {
    if verbose {
        return (EnvFilter::new("debug"), None);
    }
    match directive {
        None => (EnvFilter::new(DEFAULT_FILTER), None),
        Some(d) => match EnvFilter::try_new(d) {
            Ok(filter) => (filter, None),
            Err(e) => (
                EnvFilter::new(DEFAULT_FILTER),
                Some((d.to_owned(), e.to_string())),
            ),
        },
    }
}
