/// ML модели

pub mod logistic;
pub mod network;

pub use logistic::{baseline_accuracy, LogitBaseline};
pub use network::{ChurnNetwork, Evaluation, NetworkConfig, TrainingHistory};
