//! Principal component analysis via symmetric eigendecomposition
//!
//! The covariance matrix of the centered input is decomposed exactly, so the
//! fit is deterministic without a seed. Each component's sign is fixed so
//! that its largest-magnitude loading is positive.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, Axis};
use trackmap_common::{Error, Result};

/// Fitted PCA model
#[derive(Debug, Clone)]
pub struct Pca {
    mean: Array1<f64>,
    /// One row per component, one column per input feature
    components: Array2<f64>,
    explained_variance: Vec<f64>,
}

impl Pca {
    /// Fit up to `n_components` components on `x` (rows are samples)
    ///
    /// The number of fitted components is capped at the number of rows and
    /// of columns.
    pub fn fit(x: &Array2<f64>, n_components: usize) -> Result<Self> {
        let (n, p) = x.dim();
        if n == 0 || p == 0 {
            return Err(Error::InvalidInput(format!(
                "cannot fit PCA on a {}x{} matrix",
                n, p
            )));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| Error::Internal("mean of empty axis".to_string()))?;
        let centered = x - &mean;
        let denom = (n.max(2) - 1) as f64;
        let cov = centered.t().dot(&centered) / denom;

        let matrix = DMatrix::from_fn(p, p, |i, j| cov[[i, j]]);
        let eigen = SymmetricEigen::new(matrix);

        let mut order: Vec<usize> = (0..p).collect();
        order.sort_by(|&a, &b| {
            eigen.eigenvalues[b]
                .total_cmp(&eigen.eigenvalues[a])
                .then(a.cmp(&b))
        });

        let k = n_components.min(n).min(p);
        let mut components = Array2::<f64>::zeros((k, p));
        let mut explained_variance = Vec::with_capacity(k);
        for (c, &idx) in order.iter().take(k).enumerate() {
            let vector = eigen.eigenvectors.column(idx);
            let pivot = vector
                .iter()
                .copied()
                .max_by(|a, b| a.abs().total_cmp(&b.abs()))
                .unwrap_or(0.0);
            let sign = if pivot < 0.0 { -1.0 } else { 1.0 };
            for j in 0..p {
                components[[c, j]] = sign * vector[j];
            }
            explained_variance.push(eigen.eigenvalues[idx].max(0.0));
        }

        Ok(Self {
            mean,
            components,
            explained_variance,
        })
    }

    /// Project `x` onto the fitted components
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            return Err(Error::InvalidInput(format!(
                "PCA fitted on {} features, got {}",
                self.mean.len(),
                x.ncols()
            )));
        }
        Ok((x - &self.mean).dot(&self.components.t()))
    }

    pub fn components(&self) -> &Array2<f64> {
        &self.components
    }

    /// Variance along each component, largest first
    pub fn explained_variance(&self) -> &[f64] {
        &self.explained_variance
    }
}
