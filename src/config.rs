//! Конфигурация запуска

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::models::network::NetworkConfig;
use crate::preprocessing::normalization::ScalingMode;
use crate::types::ColumnRole;

/// Описание столбцов набора данных (имена после нормализации)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnSchema {
    pub identifier: String,
    pub target: String,
    pub positive_label: String,
    pub negative_label: String,
    /// Столбец, в котором пустая строка означает пропуск
    pub sentinel_column: String,
    /// Столбец с сильной асимметрией, логарифмируется
    pub skewed_column: String,
    /// Категориальные столбцы, включая целевой
    pub categorical_columns: Vec<String>,
}

impl ChurnSchema {
    pub fn telco() -> Self {
        let categorical = [
            "gender",
            "seniorcitizen",
            "partner",
            "dependents",
            "tenure",
            "phoneservice",
            "multiplelines",
            "internetservice",
            "onlinesecurity",
            "onlinebackup",
            "deviceprotection",
            "techsupport",
            "streamingtv",
            "streamingmovies",
            "contract",
            "paperlessbilling",
            "paymentmethod",
            "churn",
        ];

        Self {
            identifier: "customerid".to_string(),
            target: "churn".to_string(),
            positive_label: "Yes".to_string(),
            negative_label: "No".to_string(),
            sentinel_column: "totalcharges".to_string(),
            skewed_column: "totalcharges".to_string(),
            categorical_columns: categorical.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn role_of(&self, column: &str) -> ColumnRole {
        if column == self.identifier {
            ColumnRole::Identifier
        } else if column == self.target {
            ColumnRole::Target
        } else if self.categorical_columns.iter().any(|c| c == column) {
            ColumnRole::Categorical
        } else {
            ColumnRole::Continuous
        }
    }
}

impl Default for ChurnSchema {
    fn default() -> Self {
        Self::telco()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    pub input_path: PathBuf,
    pub input_file: String,
    /// Каталог результатов относительно `input_path`
    pub output_path: String,
    pub output_file: String,
    /// true - заполнять пропуски средним, false - удалять строки
    pub impute_nan: bool,
    pub test_size: f64,
    pub dropout_rate: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub scaling: ScalingMode,
    #[serde(default)]
    pub schema: ChurnSchema,
    #[serde(default)]
    pub network: NetworkConfig,
}

fn default_seed() -> u64 {
    42
}

impl SolverConfig {
    pub fn new(
        input_path: impl Into<PathBuf>,
        input_file: impl Into<String>,
        output_path: impl Into<String>,
        output_file: impl Into<String>,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            input_file: input_file.into(),
            output_path: output_path.into(),
            output_file: output_file.into(),
            ..Self::default()
        }
    }

    pub fn with_impute_nan(mut self, impute_nan: bool) -> Self {
        self.impute_nan = impute_nan;
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_dropout_rate(mut self, dropout_rate: f64) -> Self {
        self.dropout_rate = dropout_rate;
        self
    }

    pub fn input_file_path(&self) -> PathBuf {
        self.input_path.join(&self.input_file)
    }

    pub fn output_dir(&self) -> PathBuf {
        let relative = self.output_path.trim_matches('/');
        if relative.is_empty() {
            self.input_path.clone()
        } else {
            self.input_path.join(relative)
        }
    }

    pub fn output_file_path(&self) -> PathBuf {
        self.output_dir().join(&self.output_file)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return Err(PipelineError::InvalidConfig(format!(
                "dropout_rate must be in [0, 1), got {}",
                self.dropout_rate
            )));
        }
        if Path::new(&self.output_file).components().count() != 1 {
            return Err(PipelineError::InvalidConfig(format!(
                "output_file must be a bare file name, got '{}'",
                self.output_file
            )));
        }
        self.network.validate()
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("Customer Churn with ANN/"),
            input_file: "Telco-Customer-Churn.csv".to_string(),
            output_path: "/output/".to_string(),
            output_file: "output.csv".to_string(),
            impute_nan: false,
            test_size: 0.2,
            dropout_rate: 0.2,
            seed: default_seed(),
            scaling: ScalingMode::default(),
            schema: ChurnSchema::default(),
            network: NetworkConfig::default(),
        }
    }
}
