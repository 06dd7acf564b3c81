use std::path::PathBuf;

/// Name reported in `serverInfo` and used for the data directory
pub const SERVER_NAME: &str = "echo-lsp";

/// Log filter used when RUST_LOG is not set
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Returns the path to the data directory for echo-lsp.
/// Uses $XDG_DATA_HOME/echo-lsp if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/echo-lsp,
/// or ./echo-lsp if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join(format!("{SERVER_NAME}.log"))
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join(SERVER_NAME)
}
