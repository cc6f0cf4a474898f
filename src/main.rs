//! Запуск конвейера прогнозирования оттока

use anyhow::Context;

use churn_ml::{Solver, SolverConfig};

fn main() -> anyhow::Result<()> {
    // Инициализация логирования
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = SolverConfig::default().with_impute_nan(true);
    let input = config.input_file_path();

    let solver = Solver::new(config)
        .with_context(|| format!("failed to initialise run for {}", input.display()))?;
    let summary = solver.exec().context("churn pipeline failed")?;

    tracing::info!(
        "Processed {} rows, {} features",
        summary.n_rows,
        summary.feature_names.len()
    );
    Ok(())
}
