//! Deterministic stand-in for the reference oil dataset, used by tests and by
//! `--synthetic` runs when no CSV is at hand.

use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::Normal;

use crate::data::{analysis_columns, Dataset, COVARIATES};
use crate::error::{AnalysisError, Result};

// (level, loading on the common factor, idiosyncratic step sd)
const COVARIATE_SHAPE: [(f64, f64, f64); 9] = [
    (7.0, 1.6, 0.030), // BDIY_log
    (7.4, 0.5, 0.010), // SPX_log
    (4.4, -0.3, 0.004), // DX1_log
    (7.1, 0.4, 0.009), // GC1_log
    (1.0, 0.9, 0.008), // HO1_log
    (3.9, 0.8, 0.006), // USCI_log
    (3.6, 0.6, 0.009), // GNR_log
    (7.9, 0.0, 0.000), // SHCOMP_log
    (8.7, 0.4, 0.009), // FTSE_log
];

pub fn generate(n: usize, seed: u64) -> Result<Dataset> {
    if n < 2 {
        return Err(AnalysisError::InsufficientData {
            what: "synthetic dataset".to_string(),
            needed: 2,
            got: n,
        });
    }
    let std_normal =
        Normal::new(0.0, 1.0).map_err(|e| AnalysisError::InvalidParameter(e.to_string()))?;
    let mut rng = StdRng::seed_from_u64(seed);

    // One extra leading day so the lag column is defined for every row.
    let len = n + 1;
    let mut factor = vec![0.0; len];
    for t in 1..len {
        factor[t] = factor[t - 1] + 0.012 * std_normal.sample(&mut rng);
    }

    let mut covariates: Vec<Vec<f64>> = Vec::with_capacity(COVARIATES.len());
    for &(level, loading, step_sd) in COVARIATE_SHAPE.iter() {
        let mut own = 0.0;
        let mut col = Vec::with_capacity(len);
        for f in &factor {
            if step_sd > 0.0 {
                own += step_sd * std_normal.sample(&mut rng);
                col.push(level + loading * f + own);
            } else {
                // Stationary noise, unrelated to the factor.
                col.push(level + 0.02 * std_normal.sample(&mut rng));
            }
        }
        covariates.push(col);
    }

    let ho1 = &covariates[4];
    let mut price = Vec::with_capacity(len);
    for t in 0..len {
        let z = std_normal.sample(&mut rng);
        // Sinh-arcsinh distortion gives the noise skew and heavy tails.
        let eps = ((z.asinh() + 0.15) / 0.8).sinh() * 0.01;
        price.push(4.2 + 0.9 * factor[t] + 0.25 * (ho1[t] - 1.0) + eps);
    }

    let response = price[1..].to_vec();
    let lag = price[..n].to_vec();
    let mut columns = vec![response, lag];
    columns.extend(covariates.into_iter().map(|c| c[1..].to_vec()));

    Dataset::new(
        analysis_columns().iter().map(|s| s.to_string()).collect(),
        columns,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{LAG, RESPONSE};

    #[test]
    fn lag_column_is_shifted_response() {
        let ds = generate(50, 7).unwrap();
        let y = ds.column(RESPONSE).unwrap();
        let lag = ds.column(LAG).unwrap();
        for t in 1..50 {
            assert!((lag[t] - y[t - 1]).abs() < 1e-12);
        }
    }

    #[test]
    fn same_seed_same_data() {
        let a = generate(30, 11).unwrap();
        let b = generate(30, 11).unwrap();
        assert_eq!(a.response().unwrap(), b.response().unwrap());
    }
}
