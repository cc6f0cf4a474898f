//! Типы данных для конвейера оттока клиентов

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Роль столбца в наборе данных
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRole {
    Identifier,
    Categorical,
    Continuous,
    Target,
}

/// Значения столбца. `None` - маркер пропуска
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<Option<String>>),
    Float(Vec<Option<f64>>),
    Categorical { levels: Vec<String>, codes: Vec<u32> },
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(values) => values.len(),
            ColumnData::Float(values) => values.len(),
            ColumnData::Categorical { codes, .. } => codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        match self {
            ColumnData::Text(values) => values.iter().filter(|v| v.is_none()).count(),
            ColumnData::Float(values) => values.iter().filter(|v| v.is_none()).count(),
            ColumnData::Categorical { .. } => 0,
        }
    }

    /// Оставляет только строки, для которых `keep[i] == true`
    pub fn filter(self, keep: &[bool]) -> ColumnData {
        fn retain<T>(values: Vec<T>, keep: &[bool]) -> Vec<T> {
            values
                .into_iter()
                .zip(keep)
                .filter_map(|(v, &k)| k.then_some(v))
                .collect()
        }

        match self {
            ColumnData::Text(values) => ColumnData::Text(retain(values, keep)),
            ColumnData::Float(values) => ColumnData::Float(retain(values, keep)),
            ColumnData::Categorical { levels, codes } => ColumnData::Categorical {
                levels,
                codes: retain(codes, keep),
            },
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ColumnData::Text(_) => "text",
            ColumnData::Float(_) => "float",
            ColumnData::Categorical { .. } => "categorical",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn text<S: AsRef<str>>(name: &str, values: &[S]) -> Self {
        Self::new(
            name,
            ColumnData::Text(values.iter().map(|v| Some(v.as_ref().to_string())).collect()),
        )
    }

    pub fn float(name: &str, values: Vec<f64>) -> Self {
        Self::new(name, ColumnData::Float(values.into_iter().map(Some).collect()))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Числовые значения без пропусков
    pub fn dense_floats(&self) -> Result<Vec<f64>> {
        match &self.data {
            ColumnData::Float(values) => values
                .iter()
                .enumerate()
                .map(|(row, v)| {
                    v.ok_or_else(|| PipelineError::domain(&self.name, row, "unexpected null"))
                })
                .collect(),
            other => Err(PipelineError::Schema {
                column: self.name.clone(),
                reason: format!("expected float column, found {}", other.kind()),
            }),
        }
    }
}

/// Таблица записей: столбцы одинаковой длины
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let n_rows = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != n_rows) {
                return Err(PipelineError::Schema {
                    column: bad.name.clone(),
                    reason: format!("expected {} rows, found {}", n_rows, bad.len()),
                });
            }
        }
        Ok(Self { columns })
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn require(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| PipelineError::missing_column(name))
    }

    pub fn null_count(&self) -> usize {
        self.columns.iter().map(|c| c.data.null_count()).sum()
    }

    pub fn drop_column(mut self, name: &str) -> Result<Self> {
        let idx = self
            .position(name)
            .ok_or_else(|| PipelineError::missing_column(name))?;
        self.columns.remove(idx);
        Ok(self)
    }

    /// Извлекает столбец, возвращая оставшуюся таблицу
    pub fn take_column(mut self, name: &str) -> Result<(Self, Column)> {
        let idx = self
            .position(name)
            .ok_or_else(|| PipelineError::missing_column(name))?;
        let column = self.columns.remove(idx);
        Ok((self, column))
    }

    pub fn replace_column(mut self, column: Column) -> Result<Self> {
        let idx = self
            .position(&column.name)
            .ok_or_else(|| PipelineError::missing_column(&column.name))?;
        if column.len() != self.n_rows() {
            return Err(PipelineError::Schema {
                column: column.name,
                reason: format!("expected {} rows", self.n_rows()),
            });
        }
        self.columns[idx] = column;
        Ok(self)
    }

    pub fn push_column(mut self, column: Column) -> Result<Self> {
        if !self.columns.is_empty() && column.len() != self.n_rows() {
            return Err(PipelineError::Schema {
                column: column.name,
                reason: format!("expected {} rows", self.n_rows()),
            });
        }
        self.columns.push(column);
        Ok(self)
    }

    pub fn filter_rows(self, keep: &[bool]) -> Self {
        let columns = self
            .columns
            .into_iter()
            .map(|c| Column::new(c.name, c.data.filter(keep)))
            .collect();
        Self { columns }
    }

    pub fn rename_columns<F>(self, rename: F) -> Self
    where
        F: Fn(&str) -> String,
    {
        let columns = self
            .columns
            .into_iter()
            .map(|c| Column::new(rename(&c.name), c.data))
            .collect();
        Self { columns }
    }

    /// Плотная матрица признаков из всех столбцов, кроме `exclude`
    pub fn to_feature_matrix(&self, exclude: &str) -> Result<FeatureMatrix> {
        let selected: Vec<&Column> = self.columns.iter().filter(|c| c.name != exclude).collect();
        let n_rows = self.n_rows();
        let mut values = Array2::zeros((n_rows, selected.len()));
        for (j, column) in selected.iter().enumerate() {
            for (i, v) in column.dense_floats()?.into_iter().enumerate() {
                values[[i, j]] = v;
            }
        }
        Ok(FeatureMatrix {
            columns: selected.iter().map(|c| c.name.clone()).collect(),
            values,
        })
    }

    pub fn target_vector(&self, target: &str) -> Result<Array1<f64>> {
        Ok(Array1::from(self.require(target)?.dense_floats()?))
    }
}

/// Матрица признаков с именами столбцов
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if columns.len() != values.ncols() {
            return Err(PipelineError::Model(format!(
                "{} column names for {} matrix columns",
                columns.len(),
                values.ncols()
            )));
        }
        Ok(Self { columns, values })
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            Column::text("id", &["a", "b", "c"]),
            Column::float("x", vec![1.0, 2.0, 3.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_rejects_ragged_columns() {
        let result = Table::new(vec![
            Column::text("id", &["a", "b"]),
            Column::float("x", vec![1.0]),
        ]);
        assert!(matches!(result, Err(PipelineError::Schema { column, .. }) if column == "x"));
    }

    #[test]
    fn test_filter_rows_applies_to_every_column() {
        let table = sample().filter_rows(&[true, false, true]);
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.require("x").unwrap().dense_floats().unwrap(), vec![1.0, 3.0]);
        assert_eq!(
            table.require("id").unwrap().data,
            ColumnData::Text(vec![Some("a".into()), Some("c".into())])
        );
    }

    #[test]
    fn test_drop_missing_column_is_schema_error() {
        assert!(matches!(
            sample().drop_column("nope"),
            Err(PipelineError::Schema { .. })
        ));
    }

    #[test]
    fn test_feature_matrix_excludes_target() {
        let table = Table::new(vec![
            Column::float("a", vec![1.0, 2.0]),
            Column::float("b", vec![3.0, 4.0]),
            Column::float("y", vec![0.0, 1.0]),
        ])
        .unwrap();
        let matrix = table.to_feature_matrix("y").unwrap();
        assert_eq!(matrix.columns, vec!["a", "b"]);
        assert_eq!(matrix.values[[1, 1]], 4.0);
        assert_eq!(table.target_vector("y").unwrap().to_vec(), vec![0.0, 1.0]);
    }
}
