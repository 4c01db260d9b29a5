//! # DBMatrix Core
//!
//! Schema model and configuration shared by the DBMatrix crates.
//!
//! Discovery produces [`TableInfo`] and [`ForeignKeyInfo`] values fresh on
//! every sync cycle; [`PipelineConfig`] is loaded once at process start and
//! never mutated afterwards.

pub mod config;
pub mod error;
pub mod model;

pub use config::{DatabaseConfig, GraphSettings, PipelineConfig, SyncSettings, MAX_INTERVAL_SECS};
pub use error::{ConfigError, ConfigResult};
pub use model::{ForeignKeyInfo, ForeignKeyKey, TableInfo, TableKey};
