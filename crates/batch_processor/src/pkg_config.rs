use config::{Config, File};
use serde::Deserialize;

/// Batch conversion settings read from `config.toml`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BatchConfig {
    /// Threads used for per-class conversion; 0 leaves the choice to rayon.
    pub worker_count: usize,
    /// Suffix replacing `.java` on converted test classes.
    pub test_file_suffix: String,
    pub include_resources: bool,
    /// Upper bound on files read at once.
    pub read_concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            worker_count: 0,
            test_file_suffix: ".spec.ts".to_string(),
            include_resources: true,
            read_concurrency: 16,
        }
    }
}

/// Ordered search locations for `config.toml` relative to the working directory.
const CONFIG_PATHS: [&str; 3] = [
    "config/config.toml",
    "../config/config.toml",
    "../../config/config.toml",
];

pub fn get_config() -> Result<BatchConfig, config::ConfigError> {
    let path = CONFIG_PATHS
        .iter()
        .find(|path| std::path::Path::new(path).exists())
        .ok_or_else(|| {
            config::ConfigError::NotFound(
                "config.toml not found in any expected location".to_string(),
            )
        })?;
    load_from(path)
}

/// Reads the `[batch]` table of one config file; missing keys keep their defaults.
pub fn load_from(path: &str) -> Result<BatchConfig, config::ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name(path))
        .build()?;
    match config.get::<BatchConfig>("batch") {
        Ok(batch) => Ok(batch),
        Err(config::ConfigError::NotFound(_)) => Ok(BatchConfig::default()),
        Err(err) => Err(err),
    }
}

/// [`get_config`], falling back to defaults when no usable file exists.
pub fn load_or_default() -> BatchConfig {
    match get_config() {
        Ok(config) => config,
        Err(err) => {
            log::warn!("Using default batch settings: {err}");
            BatchConfig::default()
        }
    }
}
