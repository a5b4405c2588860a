//! Tree backend: gradient-boosted shallow regression trees, one independent
//! ensemble per selected feature.
//!
//! Hyperparameters are fixed: depth-2 trees, learning rate 0.03, 100 boosting
//! rounds, squared-error objective, no row or column subsampling. Split
//! search is exhaustive and greedy over sorted thresholds, so repeated fits
//! on identical inputs are bit-identical. The per-feature loop is a rayon map
//! over disjoint output rows; each feature's boosting itself runs on one
//! thread.

use crate::data::FeatureMatrix;
use crate::model::Diagnostics;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;

const MAX_DEPTH: usize = 2;
const LEARNING_RATE: f64 = 0.03;
const BOOSTING_ROUNDS: usize = 100;
/// Gains at or below this threshold do not justify a split.
const MIN_SPLIT_GAIN: f64 = 1e-12;

enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn evaluate(&self, sample: ArrayView1<'_, f64>) -> f64 {
        match self {
            Node::Leaf(value) => *value,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if sample[*feature] <= *threshold {
                    left.evaluate(sample)
                } else {
                    right.evaluate(sample)
                }
            }
        }
    }
}

/// Grows one regression tree on the given residuals by greedy variance
/// reduction.
fn grow(x: ArrayView2<'_, f64>, rows: &[usize], target: &Array1<f64>, depth: usize) -> Node {
    let total: f64 = rows.iter().map(|&r| target[r]).sum();
    let mean = total / rows.len() as f64;
    if depth == MAX_DEPTH || rows.len() < 2 {
        return Node::Leaf(mean);
    }
    match best_split(x, rows, target, total) {
        None => Node::Leaf(mean),
        Some((feature, threshold)) => {
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
                rows.iter().partition(|&&r| x[(r, feature)] <= threshold);
            Node::Split {
                feature,
                threshold,
                left: Box::new(grow(x, &left_rows, target, depth + 1)),
                right: Box::new(grow(x, &right_rows, target, depth + 1)),
            }
        }
    }
}

/// Exhaustive split search: thresholds are midpoints between distinct
/// adjacent sorted values, scored by sum-of-squares reduction. Ties keep the
/// first candidate found (lowest feature index, then lowest threshold), which
/// makes the search deterministic.
fn best_split(
    x: ArrayView2<'_, f64>,
    rows: &[usize],
    target: &Array1<f64>,
    total: f64,
) -> Option<(usize, f64)> {
    let n = rows.len() as f64;
    let base_score = total * total / n;
    let mut best: Option<(f64, usize, f64)> = None;
    let mut order = rows.to_vec();
    for feature in 0..x.ncols() {
        order.sort_unstable_by(|&a, &b| x[(a, feature)].total_cmp(&x[(b, feature)]));
        let mut left_sum = 0.0;
        for (k, &row) in order[..order.len() - 1].iter().enumerate() {
            left_sum += target[row];
            let here = x[(row, feature)];
            let next = x[(order[k + 1], feature)];
            if next <= here {
                // tied values admit no threshold between them
                continue;
            }
            let left_n = (k + 1) as f64;
            let right_sum = total - left_sum;
            let gain =
                left_sum * left_sum / left_n + right_sum * right_sum / (n - left_n) - base_score;
            if gain > MIN_SPLIT_GAIN && best.is_none_or(|(g, _, _)| gain > g) {
                best = Some((gain, feature, 0.5 * (here + next)));
            }
        }
    }
    best.map(|(_, feature, threshold)| (feature, threshold))
}

/// Boosts one feature: fits the ensemble on the reference samples and
/// accumulates predictions for the enhanced samples round by round.
/// Returns the predicted row and the final-round training RMSE.
fn boost_feature(
    x_ref: ArrayView2<'_, f64>,
    x_enh: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
) -> (Array1<f64>, f64) {
    let n_ref = x_ref.nrows();
    let base = y.mean().unwrap_or(0.0);
    let mut fit_ref = Array1::from_elem(n_ref, base);
    let mut fit_enh = Array1::from_elem(x_enh.nrows(), base);
    let rows: Vec<usize> = (0..n_ref).collect();

    for _ in 0..BOOSTING_ROUNDS {
        let residual = &y.to_owned() - &fit_ref;
        let tree = grow(x_ref, &rows, &residual, 0);
        for (r, fitted) in fit_ref.iter_mut().enumerate() {
            *fitted += LEARNING_RATE * tree.evaluate(x_ref.row(r));
        }
        for (s, predicted) in fit_enh.iter_mut().enumerate() {
            *predicted += LEARNING_RATE * tree.evaluate(x_enh.row(s));
        }
    }

    let mse = y
        .iter()
        .zip(fit_ref.iter())
        .map(|(obs, fitted)| (obs - fitted).powi(2))
        .sum::<f64>()
        / n_ref as f64;
    (fit_enh, mse.sqrt())
}

pub(crate) fn fit_and_predict(
    x_ref: ArrayView2<'_, f64>,
    x_enh: ArrayView2<'_, f64>,
    y_ref: &FeatureMatrix,
) -> (Array2<f64>, Diagnostics) {
    let p = y_ref.n_features();
    let fits: Vec<(usize, Array1<f64>, f64)> = (0..p)
        .into_par_iter()
        .map(|i| {
            let (row, rmse) = boost_feature(x_ref, x_enh, y_ref.values.row(i));
            (i, row, rmse)
        })
        .collect();

    let mut values = Array2::zeros((p, x_enh.nrows()));
    let mut diagnostics = Diagnostics::with_capacity(p);
    for (i, row, rmse) in fits {
        values.row_mut(i).assign(&row);
        diagnostics.insert(y_ref.feature_names[i].clone(), rmse);
    }
    (values, diagnostics)
}
