//! Нормализация имён столбцов

use crate::types::Table;

/// Нижний регистр, без скобок, без пробелов по краям, внутренние пробелы -> `_`.
///
/// Скобки удаляются до обрезки пробелов, иначе `"( a)"` после второго
/// применения давало бы другой результат.
pub fn normalize_column_name(name: &str) -> String {
    let lowered: String = name
        .to_lowercase()
        .chars()
        .filter(|c| *c != '(' && *c != ')')
        .collect();
    lowered.trim().replace(' ', "_")
}

pub fn normalize_column_names(table: Table) -> Table {
    table.rename_columns(normalize_column_name)
}
