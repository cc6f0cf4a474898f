//! Логистическая регрессия как базовая модель для сравнения

use linfa::prelude::*;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use ndarray::{Array1, Array2};

use crate::error::{PipelineError, Result};
use crate::metrics;

pub struct LogitBaseline {
    max_iterations: u64,
    alpha: f64,
    model: Option<FittedLogisticRegression<f64, bool>>,
}

impl LogitBaseline {
    pub fn new(max_iterations: u64, alpha: f64) -> Self {
        Self {
            max_iterations,
            alpha,
            model: None,
        }
    }

    pub fn fit(&mut self, x_train: &Array2<f64>, y_train: &Array1<f64>) -> Result<()> {
        if x_train.nrows() != y_train.len() {
            return Err(PipelineError::Baseline(format!(
                "{} feature rows but {} targets",
                x_train.nrows(),
                y_train.len()
            )));
        }

        let targets = y_train.mapv(|v| v >= metrics::DECISION_THRESHOLD);
        let dataset = Dataset::new(x_train.clone(), targets);

        let model = LogisticRegression::default()
            .alpha(self.alpha)
            .max_iterations(self.max_iterations)
            .fit(&dataset)
            .map_err(|e| PipelineError::Baseline(e.to_string()))?;

        self.model = Some(model);
        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| PipelineError::Baseline("model not fitted".to_string()))?;
        let labels: Array1<bool> = model.predict(x);
        Ok(labels.mapv(|l| if l { 1.0 } else { 0.0 }))
    }

    /// Точность на отложенной выборке
    pub fn score(&self, x_test: &Array2<f64>, y_test: &Array1<f64>) -> Result<f64> {
        let predicted = self.predict(x_test)?;
        Ok(metrics::accuracy(y_test, &predicted))
    }
}

impl Default for LogitBaseline {
    fn default() -> Self {
        Self::new(100, 1.0)
    }
}

/// Обучает базовую модель и возвращает её точность на тесте
pub fn baseline_accuracy(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<f64> {
    let mut baseline = LogitBaseline::default();
    baseline.fit(x_train, y_train)?;
    let score = baseline.score(x_test, y_test)?;
    tracing::info!("Logistic regression baseline accuracy: {:.4}", score);
    Ok(score)
}
