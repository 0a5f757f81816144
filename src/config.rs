//! File locations.
//!
//! The shortcuts file comes from `--config`, then `HOTBIND_CONFIG`,
//! then `$XDG_CONFIG_HOME/hotbind/shortcuts.json`. The daemon's pid
//! file lives in `$XDG_RUNTIME_DIR`, or the temp dir without one.

use std::path::PathBuf;

/// Environment variable overriding the shortcuts file path.
pub const CONFIG_ENV: &str = "HOTBIND_CONFIG";

const APP_DIR: &str = "hotbind";
const CONFIG_FILE: &str = "shortcuts.json";
const PID_FILE: &str = "hotbind.pid";

/// Shortcuts file path. `explicit` wins when given.
pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(default_config_path)
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

pub fn pid_file_path() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(PID_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let path = PathBuf::from("/tmp/custom.json");
        assert_eq!(config_path(Some(path.clone())), path);
    }

    #[test]
    fn default_path_ends_in_app_dir() {
        let path = config_path(None);
        assert!(path.ends_with("hotbind/shortcuts.json"), "{}", path.display());
        assert!(pid_file_path().ends_with("hotbind.pid"));
    }
}
