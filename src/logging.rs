use tracing_subscriber::EnvFilter;

/// Installs a global fmt subscriber filtered by `directive`
/// (e.g. `"comment_harvester=debug"`).
///
/// Returns an error if the directive is malformed or a global subscriber is
/// already installed.
pub fn init_tracing(directive: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_new(directive)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
}
