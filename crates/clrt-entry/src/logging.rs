use once_cell::sync::OnceCell;

static LOGGING: OnceCell<()> = OnceCell::new();

/// Install the `CLRT_LOG`-filtered fmt subscriber, once per process.
///
/// A subscriber installed by the host application wins; ours is then dropped.
pub fn init_logging() {
    LOGGING.get_or_init(|| {
        let filter = tracing_subscriber::EnvFilter::try_new(&crate::policy::policy().log_filter)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(crate::policy::DEFAULT_LOG_FILTER));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
