//! Метрики бинарной классификации

use std::cmp::Ordering;
use std::fmt;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Порог вероятности для класса 1
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Отсечение вероятностей для логарифма
const PROBA_EPSILON: f64 = 1e-7;

/// 1, если вероятность строго больше порога
pub fn predicted_classes(proba: &Array1<f64>) -> Array1<f64> {
    proba.mapv(|p| if p > DECISION_THRESHOLD { 1.0 } else { 0.0 })
}

pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (*t >= &DECISION_THRESHOLD) == (*p >= &DECISION_THRESHOLD))
        .count();
    correct as f64 / y_true.len() as f64
}

/// Бинарная кросс-энтропия (log loss)
pub fn binary_cross_entropy(y_true: &Array1<f64>, y_proba: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    -y_true
        .iter()
        .zip(y_proba.iter())
        .map(|(&t, &p)| {
            let p = p.clamp(PROBA_EPSILON, 1.0 - PROBA_EPSILON);
            t * p.ln() + (1.0 - t) * (1.0 - p).ln()
        })
        .sum::<f64>()
        / y_true.len() as f64
}

/// Площадь под ROC-кривой (трапеции, одинаковые оценки группируются)
pub fn roc_auc(y_true: &Array1<f64>, y_proba: &Array1<f64>) -> f64 {
    let mut pairs: Vec<(f64, bool)> = y_proba
        .iter()
        .zip(y_true.iter())
        .map(|(&p, &t)| (p, t >= DECISION_THRESHOLD))
        .collect();
    pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    let n_pos = pairs.iter().filter(|(_, t)| *t).count() as f64;
    let n_neg = pairs.len() as f64 - n_pos;
    if n_pos == 0.0 || n_neg == 0.0 {
        return 0.5;
    }

    let (mut tp, mut fp) = (0.0, 0.0);
    let (mut tpr_prev, mut fpr_prev) = (0.0, 0.0);
    let mut auc = 0.0;

    let mut i = 0;
    while i < pairs.len() {
        let score = pairs[i].0;
        while i < pairs.len() && pairs[i].0 == score {
            if pairs[i].1 {
                tp += 1.0;
            } else {
                fp += 1.0;
            }
            i += 1;
        }
        let (tpr, fpr) = (tp / n_pos, fp / n_neg);
        auc += (fpr - fpr_prev) * (tpr + tpr_prev) / 2.0;
        tpr_prev = tpr;
        fpr_prev = fpr;
    }
    auc
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let mut cm = Self::default();
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t >= DECISION_THRESHOLD, p >= DECISION_THRESHOLD) {
                (true, true) => cm.tp += 1,
                (false, false) => cm.tn += 1,
                (false, true) => cm.fp += 1,
                (true, false) => cm.fn_ += 1,
            }
        }
        cm
    }
}

/// Precision, recall, F1 и support по классам [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecisionRecallF1 {
    pub precision: [f64; 2],
    pub recall: [f64; 2],
    pub f1: [f64; 2],
    pub support: [usize; 2],
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

pub fn precision_recall_fscore_support(
    y_true: &Array1<f64>,
    y_pred: &Array1<f64>,
) -> PrecisionRecallF1 {
    let cm = ConfusionMatrix::from_predictions(y_true, y_pred);

    // Класс 0 - отрицательный: его "истинные положительные" - это tn
    let precision = [ratio(cm.tn, cm.tn + cm.fn_), ratio(cm.tp, cm.tp + cm.fp)];
    let recall = [ratio(cm.tn, cm.tn + cm.fp), ratio(cm.tp, cm.tp + cm.fn_)];

    PrecisionRecallF1 {
        precision,
        recall,
        f1: [f1(precision[0], recall[0]), f1(precision[1], recall[1])],
        support: [cm.tn + cm.fp, cm.tp + cm.fn_],
    }
}

impl fmt::Display for PrecisionRecallF1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(precision=[{:.8}, {:.8}], recall=[{:.8}, {:.8}], f1=[{:.8}, {:.8}], support=[{}, {}])",
            self.precision[0],
            self.precision[1],
            self.recall[0],
            self.recall[1],
            self.f1[0],
            self.f1[1],
            self.support[0],
            self.support[1]
        )
    }
}

/// Итоговые метрики сети на тестовой выборке
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub loss: f64,
    pub accuracy: f64,
    pub auc: f64,
    pub per_class: PrecisionRecallF1,
    pub confusion_matrix: ConfusionMatrix,
}

impl ClassificationReport {
    pub fn calculate(y_true: &Array1<f64>, y_proba: &Array1<f64>) -> Self {
        let y_pred = predicted_classes(y_proba);
        Self {
            loss: binary_cross_entropy(y_true, y_proba),
            accuracy: accuracy(y_true, &y_pred),
            auc: roc_auc(y_true, y_proba),
            per_class: precision_recall_fscore_support(y_true, &y_pred),
            confusion_matrix: ConfusionMatrix::from_predictions(y_true, &y_pred),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_auc_perfect_and_inverted() {
        let y = array![0.0, 0.0, 1.0, 1.0];
        assert!((roc_auc(&y, &array![0.1, 0.2, 0.8, 0.9]) - 1.0).abs() < 1e-12);
        assert!(roc_auc(&y, &array![0.9, 0.8, 0.2, 0.1]).abs() < 1e-12);
    }

    #[test]
    fn test_auc_with_ties() {
        // Все оценки равны - диагональ
        let y = array![0.0, 1.0, 0.0, 1.0];
        assert!((roc_auc(&y, &array![0.5, 0.5, 0.5, 0.5]) - 0.5).abs() < 1e-12);
        // один положительный ниже одного отрицательного: 3 из 4 пар верны
        let y = array![0.0, 0.0, 1.0, 1.0];
        assert!((roc_auc(&y, &array![0.1, 0.6, 0.4, 0.9]) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_auc_single_class() {
        assert_eq!(roc_auc(&array![1.0, 1.0], &array![0.2, 0.9]), 0.5);
    }

    #[test]
    fn test_per_class_scores() {
        let y_true = array![1.0, 0.0, 1.0, 1.0, 0.0, 0.0];
        let y_pred = array![1.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        let prf = precision_recall_fscore_support(&y_true, &y_pred);

        for class in 0..2 {
            assert!((prf.precision[class] - 2.0 / 3.0).abs() < 1e-12);
            assert!((prf.recall[class] - 2.0 / 3.0).abs() < 1e-12);
            assert!((prf.f1[class] - 2.0 / 3.0).abs() < 1e-12);
        }
        assert_eq!(prf.support, [3, 3]);
    }

    #[test]
    fn test_zero_division_yields_zero() {
        let prf = precision_recall_fscore_support(&array![0.0, 0.0], &array![0.0, 0.0]);
        assert_eq!(prf.precision[1], 0.0);
        assert_eq!(prf.recall[1], 0.0);
        assert_eq!(prf.f1[1], 0.0);
        assert_eq!(prf.precision[0], 1.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        assert_eq!(predicted_classes(&array![0.5, 0.50001, 0.2]), array![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_log_loss_clips() {
        let loss = binary_cross_entropy(&array![1.0, 0.0], &array![1.0, 0.0]);
        assert!(loss.is_finite() && loss < 1e-6);
        let loss = binary_cross_entropy(&array![1.0], &array![0.5]);
        assert!((loss - std::f64::consts::LN_2).abs() < 1e-12);
    }

    #[test]
    fn test_report_accuracy() {
        let report = ClassificationReport::calculate(
            &array![1.0, 0.0, 1.0, 0.0],
            &array![0.9, 0.1, 0.3, 0.6],
        );
        assert!((report.accuracy - 0.5).abs() < 1e-12);
        assert_eq!(report.confusion_matrix.tp, 1);
        assert_eq!(report.confusion_matrix.fp, 1);
    }
}
