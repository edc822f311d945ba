//! Offline subsystem configuration and policies

use std::time::Duration;

/// Configuration for the offline caching subsystem.
#[derive(Debug, Clone)]
pub struct OfflineConfig {
    /// Origin the shell manifest paths and derived keys resolve against.
    pub origin: String,

    /// Application-shell paths precached during worker installation.
    pub shell_manifest: Vec<String>,

    /// Bounded wait for a worker acknowledgement broadcast (default: 10s)
    pub ack_timeout: Duration,

    /// Timeout applied to individual asset/shell fetches (default: 30s)
    pub fetch_timeout: Duration,

    /// Age beyond which a stored asset is re-downloaded (default: 7 days)
    pub asset_max_age: Duration,

    /// Verify stored asset hashes before serving them (default: true)
    pub verify_integrity: bool,

    /// Activate immediately after install instead of waiting for a
    /// skip-waiting signal (default: true)
    pub skip_waiting_on_install: bool,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            origin: "https://briefcast.app".to_string(),
            shell_manifest: vec![
                "/".to_string(),
                "/offline".to_string(),
                "/library".to_string(),
                "/downloads".to_string(),
                "/icons/icon-192x192.png".to_string(),
                "/icons/icon-512x512.png".to_string(),
                "/manifest.json".to_string(),
            ],
            ack_timeout: Duration::from_secs(10),
            fetch_timeout: Duration::from_secs(30),
            asset_max_age: Duration::from_secs(7 * 24 * 60 * 60),
            verify_integrity: true,
            skip_waiting_on_install: true,
        }
    }
}

impl OfflineConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application origin.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Replace the shell precache manifest.
    pub fn with_shell_manifest(mut self, paths: Vec<String>) -> Self {
        self.shell_manifest = paths;
        self
    }

    /// Set the acknowledgement timeout.
    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    /// Set the per-fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the maximum stored-asset age.
    pub fn with_asset_max_age(mut self, max_age: Duration) -> Self {
        self.asset_max_age = max_age;
        self
    }

    /// Enable or disable integrity verification.
    pub fn with_verify_integrity(mut self, verify: bool) -> Self {
        self.verify_integrity = verify;
        self
    }

    /// Control whether install flows straight into activation.
    pub fn with_skip_waiting_on_install(mut self, skip: bool) -> Self {
        self.skip_waiting_on_install = skip;
        self
    }

    /// Shell manifest paths resolved against the origin.
    pub fn shell_urls(&self) -> Vec<String> {
        let origin = self.origin.trim_end_matches('/');
        self.shell_manifest
            .iter()
            .map(|path| {
                if path.starts_with("http://") || path.starts_with("https://") {
                    path.clone()
                } else {
                    format!("{}{}", origin, path)
                }
            })
            .collect()
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.origin.is_empty() {
            return Err("origin cannot be empty".to_string());
        }

        if !self.origin.starts_with("http://") && !self.origin.starts_with("https://") {
            return Err("origin must use an http(s) scheme".to_string());
        }

        if self.ack_timeout.is_zero() {
            return Err("ack_timeout must be greater than zero".to_string());
        }

        if self.fetch_timeout.is_zero() {
            return Err("fetch_timeout must be greater than zero".to_string());
        }

        Ok(())
    }
}
