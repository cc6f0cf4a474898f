//! Очистка данных: идентификаторы, пропуски, приведение типов

use serde::{Deserialize, Serialize};

use crate::config::ChurnSchema;
use crate::error::{PipelineError, Result};
use crate::types::{Column, ColumnData, ColumnRole, Table};

/// Политика обработки пропусков
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingValuePolicy {
    /// Заменить пропуски средним по непустым значениям
    ImputeMean,
    /// Удалить строки с пропусками
    DropRows,
}

impl MissingValuePolicy {
    pub fn from_impute_flag(impute_nan: bool) -> Self {
        if impute_nan {
            MissingValuePolicy::ImputeMean
        } else {
            MissingValuePolicy::DropRows
        }
    }
}

pub fn drop_identifier(table: Table, identifier: &str) -> Result<Table> {
    table.drop_column(identifier)
}

/// Маркеры пропуска наравне с пустой строкой (сравнение без учёта регистра)
const MISSING_TOKENS: [&str; 5] = ["nan", "na", "n/a", "null", "none"];

/// Текст -> float. При `blank_is_null` пустая строка и маркеры пропуска
/// становятся пропуском, иначе это ошибка домена. Бесконечности - всегда ошибка
pub fn cast_to_float(column: Column, blank_is_null: bool) -> Result<Column> {
    let Column { name, data } = column;
    let values = float_values(&name, data, blank_is_null)?;
    Ok(Column::new(name, ColumnData::Float(values)))
}

fn float_values(name: &str, data: ColumnData, blank_is_null: bool) -> Result<Vec<Option<f64>>> {
    match data {
        ColumnData::Float(values) => values
            .into_iter()
            .enumerate()
            .map(|(row, value)| match value {
                Some(v) if v.is_nan() && blank_is_null => Ok(None),
                Some(v) => finite(name, row, v).map(Some),
                None => Ok(None),
            })
            .collect(),
        ColumnData::Text(values) => values
            .into_iter()
            .enumerate()
            .map(|(row, value)| parse_cell(name, row, value.as_deref(), blank_is_null))
            .collect(),
        ColumnData::Categorical { .. } => Err(PipelineError::Schema {
            column: name.to_string(),
            reason: "cannot cast categorical column to float".to_string(),
        }),
    }
}

fn is_missing_token(value: &str) -> bool {
    value.is_empty() || MISSING_TOKENS.iter().any(|t| value.eq_ignore_ascii_case(t))
}

fn finite(column: &str, row: usize, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PipelineError::domain(column, row, format!("non-finite value {}", value)))
    }
}

fn parse_cell(
    column: &str,
    row: usize,
    value: Option<&str>,
    blank_is_null: bool,
) -> Result<Option<f64>> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if is_missing_token(trimmed) {
        if blank_is_null {
            return Ok(None);
        }
        return Err(PipelineError::domain(
            column,
            row,
            format!("missing value '{}' in numeric column", raw),
        ));
    }
    let parsed = trimmed
        .parse::<f64>()
        .map_err(|_| PipelineError::domain(column, row, format!("'{}' is not a number", raw)))?;
    finite(column, row, parsed).map(Some)
}

/// Заменяет пустые строки пропусками, приводит к float и применяет политику
pub fn handle_missing(table: Table, column: &str, policy: MissingValuePolicy) -> Result<Table> {
    let position = table
        .position(column)
        .ok_or_else(|| PipelineError::missing_column(column))?;
    let mut columns = table.into_columns();
    let raw = columns.remove(position);
    let values = float_values(column, raw.data, true)?;
    let n_missing = values.iter().filter(|v| v.is_none()).count();

    match policy {
        MissingValuePolicy::ImputeMean => {
            let present: Vec<f64> = values.iter().flatten().copied().collect();
            if present.is_empty() {
                return Err(PipelineError::domain(
                    column,
                    0,
                    "every value is missing, mean is undefined",
                ));
            }
            let mean = present.iter().sum::<f64>() / present.len() as f64;
            if n_missing > 0 {
                tracing::info!(
                    "Imputed {} missing values in '{}' with mean {:.4}",
                    n_missing,
                    column,
                    mean
                );
            }
            let filled = values.into_iter().map(|v| Some(v.unwrap_or(mean))).collect();
            columns.insert(position, Column::new(column, ColumnData::Float(filled)));
            Table::new(columns)
        }
        MissingValuePolicy::DropRows => {
            let keep: Vec<bool> = values.iter().map(Option::is_some).collect();
            if n_missing > 0 {
                tracing::warn!("Dropping {} rows with missing '{}'", n_missing, column);
            }
            columns.insert(position, Column::new(column, ColumnData::Float(values)));
            Ok(Table::new(columns)?.filter_rows(&keep))
        }
    }
}

/// Приводит к float все столбцы с ролью `Continuous`
pub fn cast_continuous(table: Table, schema: &ChurnSchema) -> Result<Table> {
    let columns = table
        .into_columns()
        .into_iter()
        .map(|column| match schema.role_of(&column.name) {
            ColumnRole::Continuous => cast_to_float(column, false),
            _ => Ok(column),
        })
        .collect::<Result<Vec<_>>>()?;
    Table::new(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charges_table() -> Table {
        Table::new(vec![
            Column::text("id", &["1", "2", "3", "4"]),
            Column::text("totalcharges", &["10.0", " ", "30.0", "20.0"]),
            Column::text("churn", &["Yes", "No", "No", "Yes"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_impute_keeps_rows_and_fills_mean() {
        let policy = MissingValuePolicy::ImputeMean;
        let table = handle_missing(charges_table(), "totalcharges", policy).unwrap();
        assert_eq!(table.n_rows(), 4);
        let column = table.require("totalcharges").unwrap();
        assert_eq!(column.data.null_count(), 0);
        assert_eq!(column.dense_floats().unwrap(), vec![10.0, 20.0, 30.0, 20.0]);
    }

    #[test]
    fn test_drop_removes_only_blank_rows() {
        let table =
            handle_missing(charges_table(), "totalcharges", MissingValuePolicy::DropRows).unwrap();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.null_count(), 0);
        assert_eq!(
            table.require("id").unwrap().data,
            ColumnData::Text(vec![Some("1".into()), Some("3".into()), Some("4".into())])
        );
    }

    #[test]
    fn test_column_keeps_its_position() {
        let table =
            handle_missing(charges_table(), "totalcharges", MissingValuePolicy::DropRows).unwrap();
        assert_eq!(table.column_names(), vec!["id", "totalcharges", "churn"]);
    }

    #[test]
    fn test_row_count_never_increases() {
        let inputs: [&[&str]; 4] = [
            &["1", "2", "3"],
            &[" ", " ", "3"],
            &["", "2.5", "  "],
            &["4", "5", "6"],
        ];
        for values in inputs {
            let table = Table::new(vec![Column::text("x", values)]).unwrap();
            let n = table.n_rows();
            let dropped = handle_missing(table.clone(), "x", MissingValuePolicy::DropRows).unwrap();
            assert!(dropped.n_rows() <= n);
            let imputed = handle_missing(table, "x", MissingValuePolicy::ImputeMean).unwrap();
            assert_eq!(imputed.n_rows(), n);
            assert_eq!(imputed.null_count(), 0);
        }
    }

    fn nan_charges_table() -> Table {
        Table::new(vec![
            Column::text("id", &["1", "2", "3", "4", "5"]),
            Column::text("totalcharges", &["NaN", " ", "4", "null", "8"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_nan_tokens_are_imputed_as_missing() {
        let policy = MissingValuePolicy::ImputeMean;
        let table = handle_missing(nan_charges_table(), "totalcharges", policy).unwrap();
        let values = table.require("totalcharges").unwrap().dense_floats().unwrap();
        assert!(values.iter().all(|v| v.is_finite()), "{:?}", values);
        assert_eq!(values, vec![6.0, 6.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_nan_tokens_are_dropped_as_missing() {
        let policy = MissingValuePolicy::DropRows;
        let table = handle_missing(nan_charges_table(), "totalcharges", policy).unwrap();
        assert_eq!(table.n_rows(), 2);
        assert_eq!(
            table.require("totalcharges").unwrap().dense_floats().unwrap(),
            vec![4.0, 8.0]
        );
        assert_eq!(
            table.require("id").unwrap().data,
            ColumnData::Text(vec![Some("3".into()), Some("5".into())])
        );
    }

    #[test]
    fn test_nan_in_float_column_counts_as_missing() {
        let table = Table::new(vec![Column::new(
            "x",
            ColumnData::Float(vec![Some(2.0), Some(f64::NAN), None]),
        )])
        .unwrap();
        let imputed = handle_missing(table, "x", MissingValuePolicy::ImputeMean).unwrap();
        assert_eq!(imputed.require("x").unwrap().dense_floats().unwrap(), vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_infinite_value_is_domain_error() {
        for token in ["inf", "-inf", "infinity"] {
            let table = Table::new(vec![Column::text("x", &["1.0", token])]).unwrap();
            let err = handle_missing(table, "x", MissingValuePolicy::ImputeMean).unwrap_err();
            assert!(
                matches!(err, PipelineError::Domain { ref column, row: 1, .. } if column == "x"),
                "{}: {:?}",
                token,
                err
            );
        }
    }

    #[test]
    fn test_impute_all_missing_is_domain_error() {
        let table = Table::new(vec![Column::text("x", &[" ", ""])]).unwrap();
        assert!(matches!(
            handle_missing(table, "x", MissingValuePolicy::ImputeMean),
            Err(PipelineError::Domain { .. })
        ));
    }

    #[test]
    fn test_non_numeric_value_reports_row() {
        let table = Table::new(vec![Column::text("x", &["1.0", "abc"])]).unwrap();
        let err = handle_missing(table, "x", MissingValuePolicy::DropRows).unwrap_err();
        assert!(matches!(err, PipelineError::Domain { ref column, row: 1, .. } if column == "x"));
    }

    #[test]
    fn test_missing_sentinel_column_is_schema_error() {
        assert!(matches!(
            handle_missing(charges_table(), "nope", MissingValuePolicy::DropRows),
            Err(PipelineError::Schema { .. })
        ));
    }

    #[test]
    fn test_cast_continuous_leaves_categoricals() {
        let schema = ChurnSchema {
            categorical_columns: vec!["gender".into(), "churn".into()],
            ..ChurnSchema::telco()
        };
        let table = Table::new(vec![
            Column::text("gender", &["Male", "Female"]),
            Column::text("monthlycharges", &["29.85", "56.95"]),
            Column::text("churn", &["No", "Yes"]),
        ])
        .unwrap();
        let table = cast_continuous(table, &schema).unwrap();
        assert!(matches!(table.require("gender").unwrap().data, ColumnData::Text(_)));
        assert_eq!(
            table.require("monthlycharges").unwrap().dense_floats().unwrap(),
            vec![29.85, 56.95]
        );
    }

    #[test]
    fn test_cast_continuous_rejects_nan() {
        let schema = ChurnSchema::telco();
        for token in ["NaN", "inf"] {
            let column = Column::text("monthlycharges", &["29.85", token]);
            let table = Table::new(vec![column]).unwrap();
            assert!(matches!(
                cast_continuous(table, &schema),
                Err(PipelineError::Domain { row: 1, .. })
            ));
        }
    }

    #[test]
    fn test_cast_continuous_rejects_blank() {
        let schema = ChurnSchema::telco();
        let table = Table::new(vec![Column::text("monthlycharges", &["1", ""])]).unwrap();
        assert!(matches!(
            cast_continuous(table, &schema),
            Err(PipelineError::Domain { row: 1, .. })
        ));
    }
}
