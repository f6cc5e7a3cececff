//! Test configuration builder for creating config directories programmatically

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Builder for `main.toml`
pub struct TestConfigBuilder {
    temp_dir: TempDir,
    entries: Vec<(String, String)>,
    write_file: bool,
}

impl TestConfigBuilder {
    /// Create a new test config builder with a complete, valid file
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self {
            temp_dir,
            entries: Vec::new(),
            write_file: true,
        }
        .string("rcon_host", "127.0.0.1")
        .string("rcon_password", "admin")
        .string("container", "palworld")
    }

    /// Directory without a `main.toml`
    pub fn without_file(mut self) -> Self {
        self.write_file = false;
        self
    }

    /// Set a string value
    pub fn string(self, key: &str, value: &str) -> Self {
        self.raw(key, &format!("\"{}\"", value))
    }

    /// Set a numeric value
    pub fn number(self, key: &str, value: u64) -> Self {
        self.raw(key, &value.to_string())
    }

    /// Remove a key written by default
    pub fn remove(mut self, key: &str) -> Self {
        self.entries.retain(|(k, _)| k != key);
        self
    }

    fn raw(mut self, key: &str, value: &str) -> Self {
        self.entries.retain(|(k, _)| k != key);
        self.entries.push((key.to_string(), value.to_string()));
        self
    }

    fn to_toml(&self) -> String {
        self.entries
            .iter()
            .map(|(key, value)| format!("{} = {}\n", key, value))
            .collect()
    }

    /// Build and write config files to temp directory
    pub fn build(self) -> TestConfig {
        let config_dir = self.temp_dir.path().join("config");
        fs::create_dir_all(&config_dir).expect("Failed to create config dir");

        if self.write_file {
            fs::write(config_dir.join("main.toml"), self.to_toml())
                .expect("Failed to write main.toml");
        }

        TestConfig {
            _temp_dir: self.temp_dir,
            config_dir,
        }
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Built test configuration with temp directory
pub struct TestConfig {
    _temp_dir: TempDir,
    pub config_dir: PathBuf,
}

impl TestConfig {
    /// Get the config directory path
    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    pub fn config_dir_string(&self) -> String {
        self.config_dir.to_string_lossy().to_string()
    }
}
