//! Стандартизация признаков

#![allow(non_snake_case)]

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::types::FeatureMatrix;

/// Откуда берутся статистики для тестовой выборки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScalingMode {
    /// Каждая выборка стандартизируется по своим статистикам
    #[default]
    PerPartition,
    /// Статистики обучающей выборки применяются к обеим
    FitOnTrain,
}

pub struct DataNormalizer {
    mean: Option<Array1<f64>>,
    std: Option<Array1<f64>>,
    is_fitted: bool,
}

impl DataNormalizer {
    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, X: &Array2<f64>) -> Result<()> {
        if X.nrows() == 0 {
            return Err(PipelineError::Model("cannot fit scaler on empty matrix".to_string()));
        }

        // Среднее и стандартное отклонение (ddof = 0) по каждому признаку
        self.mean = X.mean_axis(Axis(0));
        let mut std = X.std_axis(Axis(0), 0.0);

        // Постоянный столбец: делитель 1
        for val in std.iter_mut() {
            if *val < 1e-10 {
                *val = 1.0;
            }
        }
        self.std = Some(std);

        self.is_fitted = true;
        Ok(())
    }

    pub fn transform(&self, X: &Array2<f64>) -> Result<Array2<f64>> {
        let (Some(mean), Some(std)) = (self.mean.as_ref(), self.std.as_ref()) else {
            return Err(PipelineError::Model("scaler not fitted".to_string()));
        };
        if X.ncols() != mean.len() {
            return Err(PipelineError::Model(format!(
                "scaler fitted on {} columns, got {}",
                mean.len(),
                X.ncols()
            )));
        }

        // (X - mean) / std
        Ok((X - &mean.view().insert_axis(Axis(0))) / &std.view().insert_axis(Axis(0)))
    }

    pub fn fit_transform(&mut self, X: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(X)?;
        self.transform(X)
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}

impl Default for DataNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Стандартизирует обе выборки и возвращает их с исходными именами столбцов
pub fn scale_partitions(
    train: &FeatureMatrix,
    test: &FeatureMatrix,
    mode: ScalingMode,
) -> Result<(FeatureMatrix, FeatureMatrix)> {
    let mut train_scaler = DataNormalizer::new();
    let train_scaled = train_scaler.fit_transform(&train.values)?;

    let test_scaled = match mode {
        ScalingMode::PerPartition => DataNormalizer::new().fit_transform(&test.values)?,
        ScalingMode::FitOnTrain => train_scaler.transform(&test.values)?,
    };

    Ok((
        FeatureMatrix::new(train.columns.clone(), train_scaled)?,
        FeatureMatrix::new(test.columns.clone(), test_scaled)?,
    ))
}
