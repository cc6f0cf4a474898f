//! Один запуск: загрузка, подготовка, обучение, оценка, отчёт

use std::path::PathBuf;

use crate::config::SolverConfig;
use crate::error::Result;
use crate::loader::load_table;
use crate::metrics::ClassificationReport;
use crate::models::logistic::baseline_accuracy;
use crate::models::network::{ChurnNetwork, Evaluation, TrainingHistory};
use crate::preprocessing::encoding::TargetLabels;
use crate::preprocessing::partition::Split;
use crate::preprocessing::pipeline::{prepare, PreparedData};
use crate::report::{self, Reporter};
use crate::types::Table;

#[derive(Debug, Clone)]
pub struct Artifacts {
    pub graph: PathBuf,
    pub accuracy_chart: PathBuf,
    pub loss_chart: PathBuf,
    pub model: PathBuf,
    pub predictions: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub n_rows: usize,
    pub feature_names: Vec<String>,
    pub history: TrainingHistory,
    pub evaluation: Evaluation,
    pub report: ClassificationReport,
    pub baseline_accuracy: f64,
    pub artifacts: Artifacts,
}

pub struct Solver {
    config: SolverConfig,
    reporter: Reporter,
    raw: Table,
}

impl Solver {
    /// Проверяет конфигурацию, создаёт каталог результатов и читает данные
    pub fn new(config: SolverConfig) -> Result<Self> {
        config.validate()?;
        let reporter = Reporter::new(config.output_dir())?;
        let raw = load_table(&config.input_file_path(), b',')?;
        Ok(Self { config, reporter, raw })
    }

    /// Запуск на уже загруженной таблице
    pub fn with_table(config: SolverConfig, raw: Table) -> Result<Self> {
        config.validate()?;
        let reporter = Reporter::new(config.output_dir())?;
        Ok(Self { config, reporter, raw })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn data_clean(&self, raw: Table) -> Result<PreparedData> {
        prepare(raw, &self.config)
    }

    pub fn model_define(&self, n_features: usize) -> Result<(ChurnNetwork, PathBuf)> {
        let network = ChurnNetwork::define(
            n_features,
            self.config.dropout_rate,
            self.config.network.clone(),
            self.config.seed,
        )?;
        println!("{}", network.summary());
        let graph = self.reporter.write_graph(&network)?;
        Ok((network, graph))
    }

    pub fn model_train(
        &self,
        network: &mut ChurnNetwork,
        split: &Split,
    ) -> Result<(TrainingHistory, PathBuf, PathBuf)> {
        let history = network.fit(&split.x_train.values, &split.y_train)?;
        let (accuracy_chart, loss_chart) = self.reporter.write_training_curves(&history)?;
        Ok((history, accuracy_chart, loss_chart))
    }

    pub fn model_evaluate(
        &self,
        network: &ChurnNetwork,
        split: &Split,
    ) -> Result<(Evaluation, ClassificationReport, PathBuf)> {
        let evaluation = network.evaluate(&split.x_test.values, &split.y_test)?;
        let proba = network.predict(&split.x_test.values)?;
        let report = ClassificationReport::calculate(&split.y_test, &proba);

        let schema = &self.config.schema;
        let labels = TargetLabels::new(&schema.positive_label, &schema.negative_label);
        let predictions = self.reporter.write_predictions(
            &self.config.output_file,
            &split.test_rows,
            &proba,
            &split.y_test,
            &labels,
        )?;
        Ok((evaluation, report, predictions))
    }

    pub fn exec(mut self) -> Result<RunSummary> {
        let raw = std::mem::take(&mut self.raw);
        let prepared = self.data_clean(raw)?;
        let split = &prepared.split;

        let (mut network, graph) = self.model_define(prepared.n_features())?;
        let (history, accuracy_chart, loss_chart) = self.model_train(&mut network, split)?;
        let (evaluation, test_report, predictions) = self.model_evaluate(&network, split)?;
        let model = self.reporter.save_model(&network)?;

        // Базовая модель на том же (стандартизированном) разбиении
        let baseline = baseline_accuracy(
            &split.x_train.values,
            &split.y_train,
            &split.x_test.values,
            &split.y_test,
        )?;

        report::print_evaluation(&test_report, Some(baseline));
        tracing::info!(
            "Run complete: test accuracy {:.4}, AUC {:.4}, baseline {:.4}; artifacts in {}",
            evaluation.accuracy,
            test_report.auc,
            baseline,
            self.reporter.output_dir().display()
        );

        Ok(RunSummary {
            n_rows: prepared.encoded.n_rows(),
            feature_names: prepared.feature_names().to_vec(),
            history,
            evaluation,
            report: test_report,
            baseline_accuracy: baseline,
            artifacts: Artifacts {
                graph,
                accuracy_chart,
                loss_chart,
                model,
                predictions,
            },
        })
    }
}
