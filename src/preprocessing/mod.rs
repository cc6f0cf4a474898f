//! Модуль предобработки данных

pub mod cleaning;
pub mod columns;
pub mod encoding;
pub mod normalization;
pub mod partition;
pub mod pipeline;

pub use cleaning::MissingValuePolicy;
pub use columns::{normalize_column_name, normalize_column_names};
pub use encoding::{decode_target, TargetLabels};
pub use normalization::{DataNormalizer, ScalingMode};
pub use partition::{train_test_split, Split};
pub use pipeline::{prepare, PreparedData};
