use std::str::FromStr;
use tracing::Level;

/// Install the global fmt subscriber. Unknown levels fall back to `info`.
///
/// Returns `false` when a subscriber was already installed; that one stays
/// in place.
pub fn init_tracing(level: &str) -> bool {
    let parsed = Level::from_str(level.trim()).ok();
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(parsed.unwrap_or(Level::INFO))
        .finish();
    let installed = match tracing::subscriber::set_global_default(subscriber) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Tracing subscriber already installed, keeping it");
            false
        }
    };
    if parsed.is_none() {
        tracing::warn!(level, "Unknown log level, using info");
    }
    installed
}
