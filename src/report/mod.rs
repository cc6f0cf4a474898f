//! Отчёты: артефакты на диске и метрики в консоль.
//! Вызывается только после завершения конвейера и обучения

pub mod charts;
pub mod graph;

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::Array1;

use crate::error::{PipelineError, Result};
use crate::metrics::{self, ClassificationReport};
use crate::models::network::{ChurnNetwork, TrainingHistory};
use crate::preprocessing::encoding::{decode_target, TargetLabels};
use charts::{line_chart_svg, Series};

pub const GRAPH_FILE: &str = "computational_graph.dot";
pub const ACCURACY_CHART_FILE: &str = "Accuracy_History.svg";
pub const LOSS_CHART_FILE: &str = "Loss_History.svg";
pub const MODEL_FILE: &str = "model.json";

const TRAIN_COLOR: &str = "#1f77b4";
const VALIDATION_COLOR: &str = "#ff7f0e";

/// Создаёт каталог, если его нет. Повторный вызов безопасен
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| PipelineError::io(path, e))
}

fn write_file(path: PathBuf, contents: &str) -> Result<PathBuf> {
    fs::write(&path, contents).map_err(|e| PipelineError::io(&path, e))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(path)
}

pub struct Reporter {
    output_dir: PathBuf,
}

impl Reporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        ensure_dir(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn write_graph(&self, network: &ChurnNetwork) -> Result<PathBuf> {
        write_file(self.output_dir.join(GRAPH_FILE), &graph::computational_graph_dot(network))
    }

    /// Графики точности и потерь: обучение и валидация по эпохам
    pub fn write_training_curves(&self, history: &TrainingHistory) -> Result<(PathBuf, PathBuf)> {
        let accuracy = line_chart_svg(
            "Model Accuracy",
            "Accuracy",
            &[
                Series { label: "Train", values: &history.accuracy, color: TRAIN_COLOR },
                Series { label: "Test", values: &history.val_accuracy, color: VALIDATION_COLOR },
            ],
        );
        let loss = line_chart_svg(
            "Model Loss",
            "Loss",
            &[
                Series { label: "Train", values: &history.loss, color: TRAIN_COLOR },
                Series { label: "Test", values: &history.val_loss, color: VALIDATION_COLOR },
            ],
        );
        Ok((
            write_file(self.output_dir.join(ACCURACY_CHART_FILE), &accuracy)?,
            write_file(self.output_dir.join(LOSS_CHART_FILE), &loss)?,
        ))
    }

    pub fn save_model(&self, network: &ChurnNetwork) -> Result<PathBuf> {
        let path = self.output_dir.join(MODEL_FILE);
        network.save(&path)?;
        Ok(path)
    }

    /// Предсказания по тестовой выборке: исходная строка, вероятность, метки
    pub fn write_predictions(
        &self,
        file_name: &str,
        rows: &[usize],
        proba: &Array1<f64>,
        y_test: &Array1<f64>,
        labels: &TargetLabels,
    ) -> Result<PathBuf> {
        let predicted = metrics::predicted_classes(proba).to_vec();
        let predicted = decode_target("predicted", &predicted, labels)?;
        let actual = decode_target("actual", &y_test.to_vec(), labels)?;

        let path = self.output_dir.join(file_name);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(["row", "churn_probability", "predicted", "actual"])?;
        for (((row, p), pred), actual) in rows.iter().zip(proba).zip(&predicted).zip(&actual) {
            writer.write_record([
                row.to_string(),
                format!("{:.6}", p),
                pred.to_string(),
                actual.to_string(),
            ])?;
        }
        writer.flush().map_err(|e| PipelineError::io(&path, e))?;
        Ok(path)
    }
}

/// Метрики сети и базовой модели в консоль
pub fn print_evaluation(report: &ClassificationReport, baseline_accuracy: Option<f64>) {
    println!("Run finished at {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("Test loss: {}", report.loss);
    println!("Test accuracy: {}", report.accuracy);
    println!("AUC score: {}", report.auc);
    println!("{}", report.per_class);
    if let Some(score) = baseline_accuracy {
        println!("The accuracy of classification by logistic regression is {}", score);
    }
}
