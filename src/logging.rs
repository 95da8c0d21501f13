use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "vault_agent=info,warn";
const VERBOSE_FILTER: &str = "vault_agent=debug,info";

/// Install the global subscriber. RUST_LOG, when set, overrides the flag.
/// Output goes to stderr so command output on stdout stays parseable.
pub fn init_logging(verbose: bool) {
    let fallback = EnvFilter::new(if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER });
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::try_from_default_env().unwrap_or(fallback)
    } else {
        fallback
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_line_number(verbose);

    // A second init (tests, embedding) keeps the first subscriber
    if tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
    {
        debug!("logging initialized");
    }
}
