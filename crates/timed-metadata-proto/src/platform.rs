use std::path::PathBuf;

const APP_DIR: &str = "timed-metadata";

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV: &str = "TIMED_METADATA_CONFIG";

/// Environment variable that overrides the console's gateway base URL.
pub const API_URL_ENV: &str = "TIMED_METADATA_API";

pub fn data_dir() -> PathBuf {
    // On macOS and Linux, use ~/.local/share/timed-metadata/ (XDG standard)
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join(APP_DIR)
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join(APP_DIR)
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}
