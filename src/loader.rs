//! Загрузка табличных данных из CSV

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::{PipelineError, Result};
use crate::types::{Column, ColumnData, Table};

/// Читает файл с заголовком. Все значения загружаются как текст
pub fn load_table(path: &Path, delimiter: u8) -> Result<Table> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let table = read_table(file, delimiter)?;

    tracing::info!(
        "Loaded {} rows x {} columns from {}",
        table.n_rows(),
        table.n_cols(),
        path.display()
    );
    Ok(table)
}

pub fn read_table<R: Read>(reader: R, delimiter: u8) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(PipelineError::Schema {
            column: String::new(),
            reason: "input has no header row".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for header in &headers {
        if !seen.insert(header.as_str()) {
            return Err(PipelineError::Schema {
                column: header.clone(),
                reason: "duplicate column in header".to_string(),
            });
        }
    }

    let mut values: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for result in rdr.records() {
        // Строки другой длины csv отклоняет сам (flexible = false)
        let record = result?;
        for (column, field) in values.iter_mut().zip(record.iter()) {
            column.push(Some(field.to_string()));
        }
    }

    let columns = headers
        .into_iter()
        .zip(values)
        .map(|(name, data)| Column::new(name, ColumnData::Text(data)))
        .collect();
    Table::new(columns)
}
