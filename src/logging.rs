use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::settings::config_dir;

pub const LOG_ENV: &str = "SALESCOPE_LOG";
pub const LOG_FILE: &str = "salescope.log";

/// Send tracing output to `<config dir>/salescope.log`; the terminal belongs
/// to the dashboard. `SALESCOPE_LOG` overrides `default_level`. Logging is
/// skipped if the file cannot be opened.
pub fn init(default_level: &str) {
    let dir = config_dir();
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))
    else {
        return;
    };

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
}
