//! K-means clustering with k-means++ seeding
//!
//! Lloyd iterations over a dense `f64` matrix. All randomness comes from a
//! ChaCha stream seeded from [`KMeansConfig::seed`], so identical input and
//! seed produce identical labels on every platform.

use ndarray::{Array2, ArrayView1, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;
use trackmap_common::{Error, Result};

/// K-means parameters
#[derive(Debug, Clone)]
pub struct KMeansConfig {
    /// Number of clusters
    pub k: usize,
    /// Maximum Lloyd iterations per restart
    pub max_iters: usize,
    /// Convergence threshold on total squared centroid shift, relative to the
    /// mean per-column variance of the input
    pub tol: f64,
    pub seed: u64,
    /// Number of seeded restarts; the lowest-inertia fit is kept
    pub n_init: usize,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 5,
            max_iters: 300,
            tol: 1e-4,
            seed: 42,
            n_init: 10,
        }
    }
}

/// Fitted k-means model
#[derive(Debug, Clone)]
pub struct KMeansModel {
    centroids: Array2<f64>,
    labels: Vec<usize>,
    inertia: f64,
    iterations: usize,
}

impl KMeansModel {
    /// Cluster id for each training row
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Sum of squared distances from each row to its centroid
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    /// Lloyd iterations used by the winning restart
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Nearest-centroid ids for new rows
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        if x.ncols() != self.centroids.ncols() {
            return Err(Error::InvalidInput(format!(
                "model fitted on {} features, got {}",
                self.centroids.ncols(),
                x.ncols()
            )));
        }
        Ok(x.rows()
            .into_iter()
            .map(|row| nearest_centroid(row, &self.centroids).0)
            .collect())
    }
}

/// K-means estimator
#[derive(Debug, Clone, Default)]
pub struct KMeans {
    config: KMeansConfig,
}

impl KMeans {
    pub fn new(config: KMeansConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }

    /// Fit on `x` (rows are samples)
    pub fn fit(&self, x: &Array2<f64>) -> Result<KMeansModel> {
        let KMeansConfig {
            k,
            max_iters,
            tol,
            seed,
            n_init,
        } = self.config;

        if k == 0 {
            return Err(Error::InvalidInput("cluster count must be at least 1".to_string()));
        }
        if x.nrows() < k {
            return Err(Error::InvalidInput(format!(
                "cannot form {} clusters from {} rows",
                k,
                x.nrows()
            )));
        }
        if x.ncols() == 0 {
            return Err(Error::InvalidInput("no feature columns to cluster".to_string()));
        }

        let tol_abs = tol * x.var_axis(Axis(0), 0.0).mean().unwrap_or(0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut best: Option<KMeansModel> = None;
        for run in 0..n_init.max(1) {
            let init = kmeans_plus_plus(x, k, &mut rng);
            let model = lloyd(x, init, max_iters.max(1), tol_abs);
            debug!(
                "k-means restart {}: inertia {:.4} after {} iterations",
                run, model.inertia, model.iterations
            );

            let better = match &best {
                Some(current) => model.inertia < current.inertia,
                None => true,
            };
            if better {
                best = Some(model);
            }
        }

        best.ok_or_else(|| Error::Internal("k-means produced no model".to_string()))
    }
}

/// Pick `k` initial centroids, each drawn with probability proportional to
/// its squared distance from the nearest centroid already chosen
fn kmeans_plus_plus(x: &Array2<f64>, k: usize, rng: &mut ChaCha8Rng) -> Array2<f64> {
    let n = x.nrows();
    let mut centroids = Array2::<f64>::zeros((k, x.ncols()));

    let first = rng.gen_range(0..n);
    centroids.row_mut(0).assign(&x.row(first));

    let mut closest: Vec<f64> = x
        .rows()
        .into_iter()
        .map(|row| squared_distance(row, centroids.row(0)))
        .collect();

    for c in 1..k {
        let total: f64 = closest.iter().sum();
        let chosen = if total <= 0.0 {
            // Every remaining point coincides with a centroid
            rng.gen_range(0..n)
        } else {
            let threshold = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            let mut pick = n - 1;
            for (i, d) in closest.iter().enumerate() {
                cumulative += d;
                if cumulative > threshold {
                    pick = i;
                    break;
                }
            }
            pick
        };

        centroids.row_mut(c).assign(&x.row(chosen));
        for (i, row) in x.rows().into_iter().enumerate() {
            let d = squared_distance(row, centroids.row(c));
            if d < closest[i] {
                closest[i] = d;
            }
        }
    }

    centroids
}

/// Lloyd iterations from the given initial centroids
fn lloyd(x: &Array2<f64>, mut centroids: Array2<f64>, max_iters: usize, tol_abs: f64) -> KMeansModel {
    let n = x.nrows();
    let k = centroids.nrows();
    let mut labels = vec![0usize; n];
    let mut iterations = 0;

    for _ in 0..max_iters {
        iterations += 1;

        let mut distances = vec![0.0f64; n];
        for (i, row) in x.rows().into_iter().enumerate() {
            let (label, d) = nearest_centroid(row, &centroids);
            labels[i] = label;
            distances[i] = d;
        }

        let mut sums = Array2::<f64>::zeros(centroids.dim());
        let mut counts = vec![0usize; k];
        for (i, row) in x.rows().into_iter().enumerate() {
            let mut sum = sums.row_mut(labels[i]);
            sum += &row;
            counts[labels[i]] += 1;
        }

        let mut updated = centroids.clone();
        for c in 0..k {
            if counts[c] > 0 {
                let mean = &sums.row(c) / counts[c] as f64;
                updated.row_mut(c).assign(&mean);
            } else {
                // Relocate an empty cluster onto the worst-fitting point
                let far = distances
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                updated.row_mut(c).assign(&x.row(far));
                distances[far] = 0.0;
            }
        }

        let shift: f64 = (&updated - &centroids).mapv(|v| v * v).sum();
        centroids = updated;
        if shift <= tol_abs {
            break;
        }
    }

    let mut inertia = 0.0;
    for (i, row) in x.rows().into_iter().enumerate() {
        let (label, d) = nearest_centroid(row, &centroids);
        labels[i] = label;
        inertia += d;
    }

    KMeansModel {
        centroids,
        labels,
        inertia,
        iterations,
    }
}

/// Index of and squared distance to the nearest centroid; ties go to the
/// lower index
fn nearest_centroid(row: ArrayView1<f64>, centroids: &Array2<f64>) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, centroid) in centroids.rows().into_iter().enumerate() {
        let d = squared_distance(row, centroid);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
