//! Diagnostics output
//!
//! The plugin lives inside somebody else's process, so it only installs a
//! subscriber when asked to: set `ALSA_ANDROID_LOG` to an `EnvFilter`
//! directive (e.g. `alsa_android=debug`). If the host already installed a
//! global subscriber, events go there instead and this is a no-op.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "ALSA_ANDROID_LOG";

pub fn init() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = match EnvFilter::try_from_env(LOG_ENV) {
            Ok(f) => f,
            Err(_) => return,
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

#[test]
fn init_twice() {
    init();
    init();
    tracing::debug!("still alive");
}
