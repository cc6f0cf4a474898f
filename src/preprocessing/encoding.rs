//! Кодирование признаков: категории, one-hot, целевая переменная, логарифм

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::error::{PipelineError, Result};
use crate::preprocessing::columns::normalize_column_names;
use crate::types::{Column, ColumnData, Table};

/// Пара меток бинарной целевой переменной: positive -> 1, negative -> 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLabels {
    pub positive: String,
    pub negative: String,
}

impl TargetLabels {
    pub fn new(positive: impl Into<String>, negative: impl Into<String>) -> Self {
        Self {
            positive: positive.into(),
            negative: negative.into(),
        }
    }

    pub fn encode(&self, column: &str, row: usize, label: &str) -> Result<f64> {
        if label == self.positive {
            Ok(1.0)
        } else if label == self.negative {
            Ok(0.0)
        } else {
            Err(PipelineError::domain(
                column,
                row,
                format!(
                    "unexpected target label '{}', expected '{}' or '{}'",
                    label, self.positive, self.negative
                ),
            ))
        }
    }

    pub fn decode(&self, value: f64) -> Option<&str> {
        if value == 1.0 {
            Some(&self.positive)
        } else if value == 0.0 {
            Some(&self.negative)
        } else {
            None
        }
    }
}

/// Порядок уровней: числовой, если все уровни - числа, иначе лексикографический
fn sort_levels(levels: BTreeSet<String>) -> Vec<String> {
    let mut levels: Vec<String> = levels.into_iter().collect();
    let numeric: Option<Vec<f64>> = levels.iter().map(|l| l.trim().parse::<f64>().ok()).collect();
    if let Some(keys) = numeric {
        let mut keyed: Vec<(f64, String)> = keys.into_iter().zip(levels).collect();
        keyed.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.cmp(&b.1))
        });
        levels = keyed.into_iter().map(|(_, l)| l).collect();
    }
    levels
}

/// Приводит столбец к категориальному типу; домен берётся из данных
pub fn to_categorical(column: Column) -> Result<Column> {
    let Column { name, data } = column;
    let values: Vec<String> = match data {
        ColumnData::Categorical { .. } => return Ok(Column::new(name, data)),
        ColumnData::Text(values) => values
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.ok_or_else(|| PipelineError::domain(&name, row, "null in categorical column"))
            })
            .collect::<Result<_>>()?,
        ColumnData::Float(values) => values
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.map(|x| x.to_string())
                    .ok_or_else(|| PipelineError::domain(&name, row, "null in categorical column"))
            })
            .collect::<Result<_>>()?,
    };

    let levels = sort_levels(values.iter().cloned().collect());
    let index: HashMap<&str, u32> = levels
        .iter()
        .enumerate()
        .map(|(code, level)| (level.as_str(), code as u32))
        .collect();
    let codes = values
        .iter()
        .enumerate()
        .map(|(row, v)| {
            index
                .get(v.as_str())
                .copied()
                .ok_or_else(|| PipelineError::domain(&name, row, format!("'{}' has no level", v)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Column::new(name, ColumnData::Categorical { levels, codes }))
}

pub fn cast_categoricals(table: Table, categorical: &[String]) -> Result<Table> {
    if let Some(missing) = categorical.iter().find(|c| table.column(c).is_none()) {
        return Err(PipelineError::missing_column(missing));
    }
    let columns = table
        .into_columns()
        .into_iter()
        .map(|column| {
            if categorical.contains(&column.name) {
                to_categorical(column)
            } else {
                Ok(column)
            }
        })
        .collect::<Result<Vec<_>>>()?;
    Table::new(columns)
}

/// Разворачивает категориальные столбцы (кроме `target`) в индикаторы 0/1.
/// Некатегориальные столбцы идут первыми, целевой - последним
pub fn one_hot_encode(table: Table, target: &str) -> Result<Table> {
    let (table, target_column) = table.take_column(target)?;
    let (plain, categorical): (Vec<Column>, Vec<Column>) = table
        .into_columns()
        .into_iter()
        .partition(|c| !matches!(c.data, ColumnData::Categorical { .. }));

    let mut columns = plain;
    for column in categorical {
        let ColumnData::Categorical { levels, codes } = column.data else {
            continue;
        };
        for (level_idx, level) in levels.iter().enumerate() {
            let indicator = codes
                .iter()
                .map(|&code| Some(if code as usize == level_idx { 1.0 } else { 0.0 }))
                .collect();
            columns.push(Column::new(
                format!("{}_{}", column.name, level),
                ColumnData::Float(indicator),
            ));
        }
    }
    columns.push(target_column);
    Table::new(columns)
}

/// Отображает метки целевого столбца в {1, 0}
pub fn encode_target(column: Column, labels: &TargetLabels) -> Result<Column> {
    let Column { name, data } = column;
    let encoded = match &data {
        ColumnData::Categorical { levels, codes } => codes
            .iter()
            .enumerate()
            .map(|(row, &code)| labels.encode(&name, row, &levels[code as usize]).map(Some))
            .collect::<Result<Vec<_>>>()?,
        ColumnData::Text(values) => values
            .iter()
            .enumerate()
            .map(|(row, v)| match v {
                Some(label) => labels.encode(&name, row, label).map(Some),
                None => Err(PipelineError::domain(&name, row, "null target label")),
            })
            .collect::<Result<Vec<_>>>()?,
        ColumnData::Float(_) => {
            return Err(PipelineError::Schema {
                column: name,
                reason: "target column is already numeric".to_string(),
            })
        }
    };
    Ok(Column::new(name, ColumnData::Float(encoded)))
}

/// Обратное отображение {1, 0} -> метки
pub fn decode_target(column: &str, values: &[f64], labels: &TargetLabels) -> Result<Vec<String>> {
    values
        .iter()
        .enumerate()
        .map(|(row, &v)| {
            labels.decode(v).map(str::to_string).ok_or_else(|| {
                PipelineError::domain(column, row, format!("{} is not a binary label", v))
            })
        })
        .collect()
}

/// Категориальное кодирование целиком: приведение типов, one-hot,
/// целевая переменная в конце, повторная нормализация имён
pub fn encode_categoricals(
    table: Table,
    categorical: &[String],
    target: &str,
    labels: &TargetLabels,
) -> Result<Table> {
    let table = cast_categoricals(table, categorical)?;
    let expanded = one_hot_encode(table, target)?;
    let (rest, target_column) = expanded.take_column(target)?;
    let encoded = rest.push_column(encode_target(target_column, labels)?)?;
    Ok(normalize_column_names(encoded))
}

/// Натуральный логарифм. Все значения проверяются до преобразования
pub fn log_transform(table: Table, column: &str) -> Result<Table> {
    let values = table.require(column)?.dense_floats()?;
    if let Some((row, v)) = values.iter().enumerate().find(|(_, v)| !(v.is_finite() && **v > 0.0)) {
        return Err(PipelineError::domain(
            column,
            row,
            format!("log undefined for {}", v),
        ));
    }
    let logged = values.into_iter().map(f64::ln).collect();
    table.replace_column(Column::float(column, logged))
}
