//! Seeded train/test partitioning.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{FitError, Result};
use crate::task::Targets;

/// Row-indexable collections the splitter can partition.
pub trait Rows: Sized {
    fn n_rows(&self) -> usize;
    fn select(&self, indices: &[usize]) -> Self;
}

impl<T: Clone> Rows for Vec<T> {
    fn n_rows(&self) -> usize {
        self.len()
    }

    fn select(&self, indices: &[usize]) -> Self {
        indices.iter().map(|&i| self[i].clone()).collect()
    }
}

impl Rows for Targets {
    fn n_rows(&self) -> usize {
        self.len()
    }

    fn select(&self, indices: &[usize]) -> Self {
        Targets::select(self, indices)
    }
}

#[derive(Debug, Clone)]
pub struct Split<X, Y> {
    pub x_train: X,
    pub x_test: X,
    pub y_train: Y,
    pub y_test: Y,
}

/// Train and test index lists for `n` rows.
///
/// The train size is `clamp(round(train_fraction * n), 1, n - 1)`, so both
/// sides are non-empty for any fraction.
pub fn split_indices(n: usize, train_fraction: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if n < 2 {
        return Err(FitError::InsufficientData { needed: 2, got: n });
    }
    let fraction = if train_fraction.is_finite() { train_fraction } else { 0.0 };
    let k = ((fraction * n as f64).round().max(0.0) as usize).clamp(1, n - 1);

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let test = order.split_off(k);
    Ok((order, test))
}

pub fn train_test_split<X: Rows, Y: Rows>(
    x: &X,
    y: &Y,
    train_fraction: f64,
    seed: u64,
) -> Result<Split<X, Y>> {
    if x.n_rows() != y.n_rows() {
        return Err(FitError::Data(format!(
            "feature rows ({}) and target rows ({}) differ",
            x.n_rows(),
            y.n_rows()
        )));
    }
    let (train, test) = split_indices(x.n_rows(), train_fraction, seed)?;
    Ok(Split {
        x_train: x.select(&train),
        x_test: x.select(&test),
        y_train: y.select(&train),
        y_test: y.select(&test),
    })
}
