//! Storage module for the state snapshot and configuration.

pub mod config;
pub mod state_file;

pub use config::{load_config, save_config, AppConfig, ConfigError};
pub use state_file::{JsonFileStore, MemoryStore, StateStore, StoreError, STATE_FILE_NAME};
