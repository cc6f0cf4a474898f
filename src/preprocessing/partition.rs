//! Разделение на обучающую и тестовую выборки

use ndarray::{Array1, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::error::{PipelineError, Result};
use crate::types::FeatureMatrix;

/// Результат разбиения. `*_rows` - исходные номера строк
#[derive(Debug, Clone)]
pub struct Split {
    pub x_train: FeatureMatrix,
    pub x_test: FeatureMatrix,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
    pub train_rows: Vec<usize>,
    pub test_rows: Vec<usize>,
}

/// Размеры выборок: тест = ceil(f * n), обучение - остальное
pub fn split_sizes(n_samples: usize, test_size: f64) -> Result<(usize, usize)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::InvalidConfig(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }
    let n_test = (test_size * n_samples as f64).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(PipelineError::InvalidConfig(format!(
            "test_size {} on {} rows leaves an empty partition",
            test_size, n_samples
        )));
    }
    Ok((n_train, n_test))
}

/// Случайное нестратифицированное разбиение, детерминированное по `seed`
pub fn train_test_split(
    x: &FeatureMatrix,
    y: &Array1<f64>,
    test_size: f64,
    seed: u64,
) -> Result<Split> {
    if x.nrows() != y.len() {
        return Err(PipelineError::Model(format!(
            "{} feature rows but {} targets",
            x.nrows(),
            y.len()
        )));
    }
    let (_, n_test) = split_sizes(x.nrows(), test_size)?;

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut permutation: Vec<usize> = (0..x.nrows()).collect();
    permutation.shuffle(&mut rng);

    let (test_rows, train_rows) = permutation.split_at(n_test);
    let (test_rows, train_rows) = (test_rows.to_vec(), train_rows.to_vec());

    tracing::info!(
        "Split {} rows into {} train / {} test (seed {})",
        x.nrows(),
        train_rows.len(),
        test_rows.len(),
        seed
    );

    Ok(Split {
        x_train: FeatureMatrix::new(x.columns.clone(), x.values.select(Axis(0), &train_rows))?,
        x_test: FeatureMatrix::new(x.columns.clone(), x.values.select(Axis(0), &test_rows))?,
        y_train: y.select(Axis(0), &train_rows),
        y_test: y.select(Axis(0), &test_rows),
        train_rows,
        test_rows,
    })
}
