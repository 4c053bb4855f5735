//! Session configuration.
//!
//! ```
//! use tableau::SessionConfig;
//!
//! let config = SessionConfig::from_toml_str(
//!     r#"
//!     default_row_height = 52.0
//!     worker_name = "inbox-loader"
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.default_row_height, 52.0);
//! assert_eq!(config.worker_queue_capacity, 16);
//! ```

use serde::Deserialize;
use tableau_core::WorkerConfig;

use crate::error::ConfigError;

/// Settings for a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Height of rows without an override.
    pub default_row_height: f32,
    /// Thread name of the load-more worker.
    pub worker_name: String,
    /// Capacity of the load-more worker queue.
    pub worker_queue_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_row_height: 44.0,
            worker_name: "tableau-load-more".to_string(),
            worker_queue_capacity: 16,
        }
    }
}

impl SessionConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Set the default row height.
    pub fn with_default_row_height(mut self, height: f32) -> Self {
        self.default_row_height = height;
        self
    }

    /// Set the worker thread name.
    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    /// Set the worker queue capacity.
    pub fn with_worker_queue_capacity(mut self, capacity: usize) -> Self {
        self.worker_queue_capacity = capacity.max(1);
        self
    }

    /// Configuration for the load-more worker.
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            queue_capacity: self.worker_queue_capacity.max(1),
            ..WorkerConfig::with_name(self.worker_name.clone())
        }
    }
}
