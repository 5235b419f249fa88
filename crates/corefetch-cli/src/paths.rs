use dirs::data_dir;
use std::path::PathBuf;

/// Returns the corefetch home directory, or None if no data directory can be resolved.
pub fn try_corefetch_home() -> Option<PathBuf> {
    if let Some(val) = std::env::var_os("COREFETCH_HOME") {
        return Some(PathBuf::from(val));
    }
    data_dir().map(|d| d.join("corefetch"))
}

/// Default core root: $COREFETCH_HOME/cores
pub fn default_core_root(home: &std::path::Path) -> PathBuf {
    home.join("cores")
}

/// Default tool root: $COREFETCH_HOME/tools
pub fn default_tool_root(home: &std::path::Path) -> PathBuf {
    home.join("tools")
}

/// Settings file looked up when `--config` is not given: $COREFETCH_HOME/config.toml
pub fn default_settings_path(home: &std::path::Path) -> PathBuf {
    home.join("config.toml")
}
