//! Полносвязная сеть для предсказания оттока
//!
//! Dense(relu) + Dropout для каждого скрытого слоя, выход - один нейрон
//! с сигмоидой. Обучение: бинарная кросс-энтропия, Adam, мини-батчи.

#![allow(non_snake_case)]

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::metrics;

pub const MODEL_NAME: &str = "customer_churn_model";
pub const INPUT_NAME: &str = "churn_data";
pub const OUTPUT_NAME: &str = "classification";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub hidden_layers: Vec<usize>,
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    pub batch_size: usize,
    pub epochs: usize,
    /// Доля обучающих строк (с конца) для валидации
    pub validation_split: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![16, 16, 8],
            learning_rate: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            batch_size: 64,
            epochs: 10,
            validation_split: 0.2,
        }
    }
}

impl NetworkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.hidden_layers.is_empty() || self.hidden_layers.contains(&0) {
            return Err(PipelineError::InvalidConfig(
                "hidden_layers must be non-empty with positive sizes".to_string(),
            ));
        }
        if self.batch_size == 0 || self.epochs == 0 {
            return Err(PipelineError::InvalidConfig(
                "batch_size and epochs must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(PipelineError::InvalidConfig(format!(
                "validation_split must be in [0, 1), got {}",
                self.validation_split
            )));
        }
        if self.learning_rate <= 0.0 {
            return Err(PipelineError::InvalidConfig(
                "learning_rate must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    ReLU,
    Sigmoid,
}

impl Activation {
    fn apply(self, z: &Array2<f64>) -> Array2<f64> {
        match self {
            Activation::ReLU => z.mapv(|v| v.max(0.0)),
            Activation::Sigmoid => z.mapv(sigmoid),
        }
    }

    fn derivative(self, z: &Array2<f64>) -> Array2<f64> {
        match self {
            Activation::ReLU => z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Activation::Sigmoid => z.mapv(|v| {
                let s = sigmoid(v);
                s * (1.0 - s)
            }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Activation::ReLU => "relu",
            Activation::Sigmoid => "sigmoid",
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    pub name: String,
    /// (входы, выходы)
    pub weights: Array2<f64>,
    pub bias: Array1<f64>,
    pub activation: Activation,
}

impl DenseLayer {
    /// Glorot uniform, нулевое смещение
    fn new<R: Rng>(
        name: String,
        n_in: usize,
        n_out: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let limit = (6.0 / (n_in + n_out) as f64).sqrt();
        let weights = Array2::from_shape_fn((n_in, n_out), |_| rng.gen_range(-limit..limit));
        Self {
            name,
            weights,
            bias: Array1::zeros(n_out),
            activation,
        }
    }

    pub fn units(&self) -> usize {
        self.bias.len()
    }

    pub fn param_count(&self) -> usize {
        self.weights.len() + self.bias.len()
    }
}

/// Описание слоя для сводки и графа вычислений
#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    Input,
    Dense { activation: Activation },
    Dropout { rate: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub name: String,
    pub kind: LayerKind,
    pub input_dim: usize,
    pub output_dim: usize,
    pub params: usize,
}

impl LayerSpec {
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            LayerKind::Input => "InputLayer",
            LayerKind::Dense { .. } => "Dense",
            LayerKind::Dropout { .. } => "Dropout",
        }
    }
}

/// История обучения по эпохам
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub loss: Vec<f64>,
    pub accuracy: Vec<f64>,
    pub val_loss: Vec<f64>,
    pub val_accuracy: Vec<f64>,
}

impl TrainingHistory {
    pub fn epochs(&self) -> usize {
        self.loss.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub loss: f64,
    pub accuracy: f64,
}

/// Состояние Adam для одного слоя
struct AdamState {
    m_w: Array2<f64>,
    v_w: Array2<f64>,
    m_b: Array1<f64>,
    v_b: Array1<f64>,
}

impl AdamState {
    fn for_layer(layer: &DenseLayer) -> Self {
        Self {
            m_w: Array2::zeros(layer.weights.raw_dim()),
            v_w: Array2::zeros(layer.weights.raw_dim()),
            m_b: Array1::zeros(layer.bias.len()),
            v_b: Array1::zeros(layer.bias.len()),
        }
    }
}

struct ForwardCache {
    /// Входы каждого слоя (после dropout предыдущего)
    inputs: Vec<Array2<f64>>,
    z_values: Vec<Array2<f64>>,
    /// Маски dropout скрытых слоёв, уже масштабированные на 1 / keep
    masks: Vec<Option<Array2<f64>>>,
    output: Array2<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnNetwork {
    pub name: String,
    input_dim: usize,
    dropout_rate: f64,
    layers: Vec<DenseLayer>,
    config: NetworkConfig,
    seed: u64,
}

impl ChurnNetwork {
    /// Определяет архитектуру под `input_dim` закодированных признаков
    pub fn define(
        input_dim: usize,
        dropout_rate: f64,
        config: NetworkConfig,
        seed: u64,
    ) -> Result<Self> {
        config.validate()?;
        if input_dim == 0 {
            return Err(PipelineError::Model(
                "network needs at least one input feature".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&dropout_rate) {
            return Err(PipelineError::InvalidConfig(format!(
                "dropout_rate must be in [0, 1), got {}",
                dropout_rate
            )));
        }

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut layers = Vec::with_capacity(config.hidden_layers.len() + 1);
        let mut n_in = input_dim;
        for (i, &units) in config.hidden_layers.iter().enumerate() {
            let name = format!("hidden_{}", i + 1);
            layers.push(DenseLayer::new(name, n_in, units, Activation::ReLU, &mut rng));
            n_in = units;
        }
        let output = OUTPUT_NAME.to_string();
        layers.push(DenseLayer::new(output, n_in, 1, Activation::Sigmoid, &mut rng));

        Ok(Self {
            name: MODEL_NAME.to_string(),
            input_dim,
            dropout_rate,
            layers,
            config,
            seed,
        })
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    pub fn param_count(&self) -> usize {
        self.layers.iter().map(DenseLayer::param_count).sum()
    }

    pub fn layer_specs(&self) -> Vec<LayerSpec> {
        let mut specs = vec![LayerSpec {
            name: INPUT_NAME.to_string(),
            kind: LayerKind::Input,
            input_dim: self.input_dim,
            output_dim: self.input_dim,
            params: 0,
        }];
        let n_hidden = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            specs.push(LayerSpec {
                name: layer.name.clone(),
                kind: LayerKind::Dense { activation: layer.activation },
                input_dim: layer.weights.nrows(),
                output_dim: layer.units(),
                params: layer.param_count(),
            });
            if i < n_hidden {
                specs.push(LayerSpec {
                    name: format!("dropout_{}", i + 1),
                    kind: LayerKind::Dropout { rate: self.dropout_rate },
                    input_dim: layer.units(),
                    output_dim: layer.units(),
                    params: 0,
                });
            }
        }
        specs
    }

    /// Текстовая сводка слоёв
    pub fn summary(&self) -> String {
        let mut s = format!("Model: \"{}\"\n", self.name);
        s.push_str(&format!("{:<30}{:<20}{:>10}\n", "Layer (type)", "Output Shape", "Param #"));
        s.push_str(&format!("{}\n", "=".repeat(60)));
        for spec in self.layer_specs() {
            s.push_str(&format!(
                "{:<30}{:<20}{:>10}\n",
                format!("{} ({})", spec.name, spec.type_name()),
                format!("(None, {})", spec.output_dim),
                spec.params
            ));
        }
        s.push_str(&format!("{}\n", "=".repeat(60)));
        s.push_str(&format!("Total params: {}\n", self.param_count()));
        s
    }

    fn check_shape(&self, X: &Array2<f64>) -> Result<()> {
        if X.ncols() != self.input_dim {
            return Err(PipelineError::Model(format!(
                "shape mismatch: network expects {} features, got {}",
                self.input_dim,
                X.ncols()
            )));
        }
        Ok(())
    }

    fn forward<R: Rng>(&self, X: &Array2<f64>, mut dropout_rng: Option<&mut R>) -> ForwardCache {
        let n_hidden = self.layers.len() - 1;
        let keep = 1.0 - self.dropout_rate;

        let mut inputs = Vec::with_capacity(self.layers.len());
        let mut z_values = Vec::with_capacity(self.layers.len());
        let mut masks = Vec::with_capacity(n_hidden);
        let mut current = X.clone();

        for (i, layer) in self.layers.iter().enumerate() {
            let z = current.dot(&layer.weights) + &layer.bias;
            let mut a = layer.activation.apply(&z);

            if i < n_hidden {
                let mask = match dropout_rng.as_deref_mut() {
                    Some(rng) if self.dropout_rate > 0.0 => {
                        let mask = Array2::from_shape_fn(a.raw_dim(), |_| {
                            if rng.gen::<f64>() < self.dropout_rate { 0.0 } else { 1.0 / keep }
                        });
                        a = &a * &mask;
                        Some(mask)
                    }
                    _ => None,
                };
                masks.push(mask);
            }

            inputs.push(current);
            z_values.push(z);
            current = a;
        }

        ForwardCache {
            inputs,
            z_values,
            masks,
            output: current,
        }
    }

    /// Градиенты (dW, db) по каждому слою
    fn backward(&self, cache: &ForwardCache, y: &Array1<f64>) -> Vec<(Array2<f64>, Array1<f64>)> {
        let n = y.len() as f64;
        let y_col = y.view().insert_axis(Axis(1));

        // Сигмоида + кросс-энтропия: dL/dz = p - y
        let mut delta = (&cache.output - &y_col) / n;
        let mut gradients = Vec::with_capacity(self.layers.len());

        for i in (0..self.layers.len()).rev() {
            let grad_w = cache.inputs[i].t().dot(&delta);
            let grad_b = delta.sum_axis(Axis(0));
            gradients.push((grad_w, grad_b));

            if i > 0 {
                let prev = &self.layers[i - 1];
                let mut upstream = delta.dot(&self.layers[i].weights.t());
                if let Some(mask) = &cache.masks[i - 1] {
                    upstream = upstream * mask;
                }
                delta = upstream * prev.activation.derivative(&cache.z_values[i - 1]);
            }
        }

        gradients.reverse();
        gradients
    }

    fn adam_step(
        &mut self,
        states: &mut [AdamState],
        gradients: Vec<(Array2<f64>, Array1<f64>)>,
        t: i32,
    ) {
        let NetworkConfig { learning_rate, beta1, beta2, epsilon, .. } = self.config;
        let correction1 = 1.0 - beta1.powi(t);
        let correction2 = 1.0 - beta2.powi(t);

        let updates = self.layers.iter_mut().zip(states.iter_mut()).zip(gradients);
        for ((layer, state), (grad_w, grad_b)) in updates {
            state.m_w = &state.m_w * beta1 + &grad_w * (1.0 - beta1);
            state.v_w = &state.v_w * beta2 + &grad_w.mapv(|g| g * g) * (1.0 - beta2);
            state.m_b = &state.m_b * beta1 + &grad_b * (1.0 - beta1);
            state.v_b = &state.v_b * beta2 + &grad_b.mapv(|g| g * g) * (1.0 - beta2);

            ndarray::Zip::from(&mut layer.weights)
                .and(&state.m_w)
                .and(&state.v_w)
                .for_each(|w, &m, &v| {
                    *w -= learning_rate * (m / correction1) / ((v / correction2).sqrt() + epsilon);
                });
            ndarray::Zip::from(&mut layer.bias)
                .and(&state.m_b)
                .and(&state.v_b)
                .for_each(|b, &m, &v| {
                    *b -= learning_rate * (m / correction1) / ((v / correction2).sqrt() + epsilon);
                });
        }
    }

    /// Обучение. Последние `validation_split` строк используются для валидации
    pub fn fit(&mut self, X: &Array2<f64>, y: &Array1<f64>) -> Result<TrainingHistory> {
        self.check_shape(X)?;
        if X.nrows() != y.len() {
            return Err(PipelineError::Model(format!(
                "{} feature rows but {} targets",
                X.nrows(),
                y.len()
            )));
        }

        let n_train = ((X.nrows() as f64) * (1.0 - self.config.validation_split)) as usize;
        if n_train == 0 {
            return Err(PipelineError::Model("no rows left for training".to_string()));
        }
        let train_idx: Vec<usize> = (0..n_train).collect();
        let val_idx: Vec<usize> = (n_train..X.nrows()).collect();
        let X_val = X.select(Axis(0), &val_idx);
        let y_val = y.select(Axis(0), &val_idx);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed.wrapping_add(1));
        let mut states: Vec<AdamState> = self.layers.iter().map(AdamState::for_layer).collect();
        let mut history = TrainingHistory::default();
        let mut step = 0i32;

        for epoch in 0..self.config.epochs {
            let mut order = train_idx.clone();
            order.shuffle(&mut rng);

            let mut loss_sum = 0.0;
            let mut correct = 0.0;
            for batch in order.chunks(self.config.batch_size) {
                let X_batch = X.select(Axis(0), batch);
                let y_batch = y.select(Axis(0), batch);

                let cache = self.forward(&X_batch, Some(&mut rng));
                let proba = cache.output.column(0).to_owned();
                loss_sum += metrics::binary_cross_entropy(&y_batch, &proba) * batch.len() as f64;
                let predicted = metrics::predicted_classes(&proba);
                correct += metrics::accuracy(&y_batch, &predicted) * batch.len() as f64;

                let gradients = self.backward(&cache, &y_batch);
                step += 1;
                self.adam_step(&mut states, gradients, step);
            }

            history.loss.push(loss_sum / n_train as f64);
            history.accuracy.push(correct / n_train as f64);

            if !val_idx.is_empty() {
                let val = self.evaluate(&X_val, &y_val)?;
                history.val_loss.push(val.loss);
                history.val_accuracy.push(val.accuracy);
            }

            tracing::debug!(
                "Epoch {}/{}: loss {:.4}, accuracy {:.4}, val_loss {:?}",
                epoch + 1,
                self.config.epochs,
                history.loss[epoch],
                history.accuracy[epoch],
                history.val_loss.last()
            );
        }

        tracing::info!(
            "Trained {} for {} epochs on {} rows ({} validation)",
            self.name,
            self.config.epochs,
            n_train,
            val_idx.len()
        );
        Ok(history)
    }

    /// Вероятность оттока для каждой строки
    pub fn predict(&self, X: &Array2<f64>) -> Result<Array1<f64>> {
        self.check_shape(X)?;
        let cache = self.forward::<Xoshiro256PlusPlus>(X, None);
        Ok(cache.output.column(0).to_owned())
    }

    pub fn evaluate(&self, X: &Array2<f64>, y: &Array1<f64>) -> Result<Evaluation> {
        let proba = self.predict(X)?;
        if proba.len() != y.len() {
            return Err(PipelineError::Model(format!(
                "{} predictions but {} targets",
                proba.len(),
                y.len()
            )));
        }
        Ok(Evaluation {
            loss: metrics::binary_cross_entropy(y, &proba),
            accuracy: metrics::accuracy(y, &metrics::predicted_classes(&proba)),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}
