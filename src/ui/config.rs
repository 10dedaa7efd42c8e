use std::path::PathBuf;
use std::sync::OnceLock;

/// Application user interface config.
#[derive(Debug)]
pub struct UIConfig {
    /// Save command history in a regular file.
    pub save_history: bool,
    /// Path to the history file.
    pub history_file: PathBuf,
    /// Use terminal colors in output.
    pub colors: bool,
}

/// Read-only ui configuration (set only once, at application start).
static CONFIG: OnceLock<UIConfig> = OnceLock::new();

/// Set initial configuration. Returns `false` if configuration already set.
pub fn set(config: UIConfig) -> bool {
    CONFIG.set(config).is_ok()
}

/// Return application ui config, `None` until [`set`] is called.
pub fn current() -> Option<&'static UIConfig> {
    CONFIG.get()
}

/// True if output may be colored. Colors are enabled until configuration says otherwise.
pub fn colors_enabled() -> bool {
    current().map(|cfg| cfg.colors).unwrap_or(true)
}
