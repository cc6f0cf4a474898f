//! Конвейер подготовки данных. Каждый этап принимает таблицу по значению
//! и возвращает новую

use crate::config::{ChurnSchema, SolverConfig};
use crate::error::Result;
use crate::preprocessing::cleaning::{
    cast_continuous, drop_identifier, handle_missing, MissingValuePolicy,
};
use crate::preprocessing::columns::normalize_column_names;
use crate::preprocessing::encoding::{encode_categoricals, log_transform, TargetLabels};
use crate::preprocessing::normalization::scale_partitions;
use crate::preprocessing::partition::{train_test_split, Split};
use crate::types::Table;

/// Подготовленные данные: закодированная таблица и стандартизированное разбиение
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub encoded: Table,
    pub split: Split,
}

impl PreparedData {
    pub fn n_features(&self) -> usize {
        self.split.x_train.ncols()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.split.x_train.columns
    }
}

pub fn clean(table: Table, schema: &ChurnSchema, policy: MissingValuePolicy) -> Result<Table> {
    let n_before = table.n_rows();
    let table = normalize_column_names(table);
    let table = drop_identifier(table, &schema.identifier)?;
    let table = handle_missing(table, &schema.sentinel_column, policy)?;
    let table = cast_continuous(table, schema)?;

    tracing::info!(
        "Cleaned table: {} -> {} rows, {} columns ({:?})",
        n_before,
        table.n_rows(),
        table.n_cols(),
        policy
    );
    Ok(table)
}

pub fn encode(table: Table, schema: &ChurnSchema) -> Result<Table> {
    let table = log_transform(table, &schema.skewed_column)?;
    let labels = TargetLabels::new(&schema.positive_label, &schema.negative_label);
    let table = encode_categoricals(table, &schema.categorical_columns, &schema.target, &labels)?;

    tracing::info!(
        "Encoded table: {} rows, {} columns",
        table.n_rows(),
        table.n_cols()
    );
    Ok(table)
}

/// Очистка, кодирование, разбиение и стандартизация
pub fn prepare(table: Table, config: &SolverConfig) -> Result<PreparedData> {
    let schema = &config.schema;
    let policy = MissingValuePolicy::from_impute_flag(config.impute_nan);

    let encoded = encode(clean(table, schema, policy)?, schema)?;

    let x = encoded.to_feature_matrix(&schema.target)?;
    let y = encoded.target_vector(&schema.target)?;
    let split = train_test_split(&x, &y, config.test_size, config.seed)?;

    let (x_train, x_test) = scale_partitions(&split.x_train, &split.x_test, config.scaling)?;
    tracing::debug!("Scaled {} features ({:?})", x_train.ncols(), config.scaling);

    Ok(PreparedData {
        encoded,
        split: Split {
            x_train,
            x_test,
            ..split
        },
    })
}
