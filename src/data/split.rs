use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::error::{AnalysisError, Result};

/// Disjoint train/holdout row indices, each sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most recent holdout row.
    pub fn last_test(&self) -> Option<usize> {
        self.test.last().copied()
    }
}

/// Seeded random split: `floor(n * train_fraction)` rows go to training.
pub fn split_indices(n: usize, train_fraction: f64, seed: u64) -> Result<Partition> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(AnalysisError::InvalidParameter(format!(
            "train fraction must be in (0, 1), got {}",
            train_fraction
        )));
    }
    let n_train = ((n as f64) * train_fraction).floor() as usize;
    if n_train == 0 || n_train == n {
        return Err(AnalysisError::InsufficientData {
            what: "train/test split".to_string(),
            needed: 2,
            got: n,
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut rng);

    let mut train = order[..n_train].to_vec();
    let mut test = order[n_train..].to_vec();
    train.sort_unstable();
    test.sort_unstable();
    Ok(Partition { train, test })
}
