//! fxlist Configuration Management
//!
//! Loads the stream reader configuration from a `key = value` text file.
//!
//! ```text
//! # config/fxlist.txt
//! source = tcp://127.0.0.1:30120
//! maxservers = 500
//! output = json
//! loglevel = debug
//! ```

use fxlist_core::{FxListError, Result};
use std::fmt;
use std::fs;
use std::path::Path;

/// Default config file location, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/fxlist.txt";

const DEFAULT_MAX_FRAME_SIZE: u32 = 10 * 1024 * 1024;
const DEFAULT_READ_CHUNK_SIZE: usize = 16 * 1024;

/// How collected servers are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One JSON object per server on stdout
    Json,
    /// Aggregate statistics through the log
    #[default]
    Summary,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Json => write!(f, "json"),
            OutputMode::Summary => write!(f, "summary"),
        }
    }
}

/// Stream reader configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Byte source (from "source" option: `-`, `tcp://host:port` or a path)
    pub source: String,
    /// Server cap (from "maxservers" option, 0 = unlimited)
    pub max_servers: usize,
    /// Frame ceiling in bytes (from "maxframesize" option, default: 10485760)
    pub max_frame_size: u32,
    /// Read chunk size in bytes (from "readchunksize" option, default: 16384)
    pub read_chunk_size: usize,
    /// Output mode (from "output" option: json | summary)
    pub output: OutputMode,
    /// Log filter used when RUST_LOG is unset (from "loglevel" option)
    pub log_level: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            source: "-".to_string(),
            max_servers: 0,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            output: OutputMode::Summary,
            log_level: "info".to_string(),
        }
    }
}

impl StreamConfig {
    /// Load configuration from a config file
    ///
    /// A missing or unreadable file is a `Config` error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            FxListError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Ok(Self::parse(&content))
    }

    /// Load configuration from `config/fxlist.txt`
    pub fn load_default() -> Result<Self> {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }

    /// Parse config file content
    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // Parse key=value
            if let Some(eq_pos) = line.find('=') {
                let key = line[..eq_pos].trim();
                let value = line[eq_pos + 1..].trim();

                config.parse_option(key, value);
            }
        }

        config
    }

    fn parse_option(&mut self, key: &str, value: &str) {
        match key.to_lowercase().as_str() {
            "source" => self.source = value.into(),
            "maxservers" => {
                self.max_servers = value.parse().unwrap_or(0);
            }
            "maxframesize" => {
                self.max_frame_size = value.parse().unwrap_or(DEFAULT_MAX_FRAME_SIZE);
            }
            "readchunksize" => {
                self.read_chunk_size = value.parse().unwrap_or(DEFAULT_READ_CHUNK_SIZE);
            }
            "output" => {
                self.output = match value.to_lowercase().as_str() {
                    "json" => OutputMode::Json,
                    "summary" => OutputMode::Summary,
                    other => {
                        tracing::warn!("Unknown output mode '{}', using summary", other);
                        OutputMode::Summary
                    }
                };
            }
            "loglevel" => self.log_level = value.into(),
            _ => {
                tracing::debug!("Unknown config option: {} = {}", key, value);
            }
        }
    }

    /// Server cap as an option (`None` when unlimited)
    pub fn server_cap(&self) -> Option<usize> {
        (self.max_servers > 0).then_some(self.max_servers)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_frame_size == 0 {
            return Err(FxListError::Config("maxframesize must be > 0".to_string()));
        }

        if self.read_chunk_size == 0 {
            return Err(FxListError::Config("readchunksize must be > 0".to_string()));
        }

        if self.source.trim().is_empty() {
            return Err(FxListError::Config("source must not be empty".to_string()));
        }

        Ok(())
    }

    /// Display configuration summary
    pub fn display(&self) {
        tracing::info!("Stream configuration:");
        tracing::info!("  Source: {}", self.source);
        match self.server_cap() {
            Some(cap) => tracing::info!("  Max servers: {}", cap),
            None => tracing::info!("  Max servers: unlimited"),
        }
        tracing::info!("  Max frame size: {} bytes", self.max_frame_size);
        tracing::info!("  Read chunk size: {} bytes", self.read_chunk_size);
        tracing::info!("  Output: {}", self.output);
        tracing::info!("  Log level: {}", self.log_level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = StreamConfig::default();
        assert_eq!(config.source, "-");
        assert_eq!(config.max_servers, 0);
        assert_eq!(config.server_cap(), None);
        assert_eq!(config.max_frame_size, 10485760);
        assert_eq!(config.read_chunk_size, 16384);
        assert_eq!(config.output, OutputMode::Summary);
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_simple_config() {
        let config_text = r#"
# dump from the list endpoint
source = tcp://127.0.0.1:30120
maxservers = 50
output = JSON
loglevel = debug
"#;
        let config = StreamConfig::parse(config_text);
        assert_eq!(config.source, "tcp://127.0.0.1:30120");
        assert_eq!(config.server_cap(), Some(50));
        assert_eq!(config.output, OutputMode::Json);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.read_chunk_size, 16384);
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = StreamConfig::parse("maxframesize = huge\nreadchunksize = -1\nmaxservers = x");
        assert_eq!(config.max_frame_size, 10485760);
        assert_eq!(config.read_chunk_size, 16384);
        assert_eq!(config.max_servers, 0);
    }

    #[test]
    fn test_unknown_keys_and_lines_ignored() {
        let config = StreamConfig::parse("colour = blue\nnot a pair\n\nsource=dump.bin");
        assert_eq!(config.source, "dump.bin");
    }

    #[test]
    fn test_validate_rejects_zero_sizes() {
        let config = StreamConfig::parse("readchunksize = 0");
        assert!(matches!(config.validate(), Err(FxListError::Config(_))));

        let config = StreamConfig::parse("maxframesize = 0");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "source = servers.bin").unwrap();
        writeln!(file, "maxframesize = 4096").unwrap();

        let config = StreamConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.source, "servers.bin");
        assert_eq!(config.max_frame_size, 4096);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        let result = StreamConfig::load_from_file(&path);
        match result {
            Err(FxListError::Config(msg)) => assert!(msg.contains("missing.txt")),
            other => panic!("expected a config error, got {:?}", other),
        }
    }
}
