//! Two-component projection of a filtered selection, cached on disk
//!
//! A request consults [`ProjectionCache`] first. On a miss (or an unreadable
//! cache) the selection is zero-filled, standardized on its own rows, reduced
//! with a 2-component [`Pca`] and written back to the cache.

pub mod cache;
pub mod pca;

pub use cache::{CacheKey, CacheOutcome, ProjectionCache};
pub use pca::Pca;

use cache::Lookup;
use ndarray::Array2;
use tracing::{debug, warn};
use trackmap_common::{AudioFeature, Dataset, Error, MissingValues, Result, StandardScaler};

/// PC1/PC2 coordinates, one pair per selected row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub pc1: Vec<f64>,
    pub pc2: Vec<f64>,
}

impl Projection {
    pub fn len(&self) -> usize {
        self.pc1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pc1.is_empty()
    }

    /// Coordinates of the i-th selected row
    pub fn point(&self, i: usize) -> Option<(f64, f64)> {
        Some((*self.pc1.get(i)?, *self.pc2.get(i)?))
    }
}

/// Projection plus how it was obtained
#[derive(Debug, Clone)]
pub struct ProjectionResult {
    pub projection: Projection,
    pub outcome: CacheOutcome,
}

/// Project `rows` of `dataset` over `features`, reusing the cache when valid
///
/// A failed cache write is logged and does not fail the request.
pub fn project(
    dataset: &Dataset,
    rows: &[usize],
    features: &[AudioFeature],
    cache: &ProjectionCache,
) -> Result<ProjectionResult> {
    if features.is_empty() {
        return Err(Error::InvalidInput(
            "projection needs at least one feature".to_string(),
        ));
    }

    let x = selection_matrix(dataset, rows, features)?;
    let key = CacheKey::new(rows, features, &x);
    let _guard = cache.lock();

    let outcome = match cache.lookup(&key) {
        Lookup::Hit(projection) => {
            debug!("Projection cache hit ({} rows)", projection.len());
            return Ok(ProjectionResult {
                projection,
                outcome: CacheOutcome::Hit,
            });
        }
        Lookup::Miss => CacheOutcome::Miss,
        Lookup::ReadError(reason) => {
            warn!(
                "Projection cache {} unreadable, recomputing: {}",
                cache.path().display(),
                reason
            );
            CacheOutcome::ReadError(reason)
        }
    };

    let projection = project_matrix(&x)?;
    if let Err(e) = cache.store(&key, &projection) {
        warn!(
            "Failed to write projection cache {}: {}",
            cache.path().display(),
            e
        );
    }
    debug!("Projection computed ({} rows, {})", projection.len(), outcome.as_str());

    Ok(ProjectionResult {
        projection,
        outcome,
    })
}

/// Fit and apply the projection without touching the cache
///
/// Missing cells count as zero. With fewer than two fittable components the
/// second axis is all zeros.
pub fn compute_projection(
    dataset: &Dataset,
    rows: &[usize],
    features: &[AudioFeature],
) -> Result<Projection> {
    let x = selection_matrix(dataset, rows, features)?;
    project_matrix(&x)
}

/// Zero-filled feature matrix of the selected rows
fn selection_matrix(
    dataset: &Dataset,
    rows: &[usize],
    features: &[AudioFeature],
) -> Result<Array2<f64>> {
    let columns: Vec<&str> = features.iter().map(|f| f.column_name()).collect();
    dataset.feature_matrix_for_rows(rows, &columns, MissingValues::ZeroFill)
}

fn project_matrix(x: &Array2<f64>) -> Result<Projection> {
    if x.nrows() == 0 {
        return Ok(Projection::default());
    }

    let scaled = StandardScaler::fit_transform(x)?;

    let pca = Pca::fit(&scaled, 2)?;
    let t = pca.transform(&scaled)?;

    let pc1 = t.column(0).to_vec();
    let pc2 = if t.ncols() > 1 {
        t.column(1).to_vec()
    } else {
        vec![0.0; x.nrows()]
    };

    Ok(Projection { pc1, pc2 })
}
