//! Churn ML - прогнозирование оттока клиентов

pub mod config;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod preprocessing;
pub mod report;
pub mod solver;
pub mod types;

pub use config::{ChurnSchema, SolverConfig};
pub use error::{PipelineError, Result};
pub use models::{ChurnNetwork, LogitBaseline, NetworkConfig, TrainingHistory};
pub use preprocessing::{MissingValuePolicy, PreparedData, ScalingMode};
pub use solver::{RunSummary, Solver};
pub use types::*;
