//! Process-wide log output.

use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

/// Installs a formatting subscriber as the global default.
///
/// Logs at DEBUG when `debug` is set, at INFO otherwise. Returns `false` when
/// another global subscriber was installed first; that one is left in place.
pub fn init(debug: bool) -> bool {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();

    match tracing::subscriber::set_global_default(subscriber) {
        Ok(()) => {
            debug!("installed global subscriber at level {}", level);
            true
        }
        Err(e) => {
            debug!(cause = %e, "keeping existing global subscriber");
            false
        }
    }
}
