//! Channel statistics and the eigen-decomposition of their covariance.
use super::options::WctOptions;
use crate::image::{FeatureMap, FeatureView};
use nalgebra::{DMatrix, DVector, SymmetricEigen};

/// Per-channel mean and the centred `C × N` sample matrix of a feature map.
#[derive(Clone, Debug)]
pub struct ChannelStats {
    pub mean: DVector<f32>,
    pub centered: DMatrix<f32>,
}

impl ChannelStats {
    pub fn from_map(map: &FeatureMap) -> Self {
        let means = map.channel_means();
        let mut data = map.data.clone();
        for px in data.chunks_exact_mut(map.c.max(1)) {
            for (v, m) in px.iter_mut().zip(&means) {
                *v -= m;
            }
        }
        // Channel-last storage is already column-major `C × N`.
        let centered = DMatrix::from_vec(map.c, map.pixel_count(), data);
        Self {
            mean: DVector::from_vec(means),
            centered,
        }
    }

    pub fn channels(&self) -> usize {
        self.centered.nrows()
    }

    pub fn samples(&self) -> usize {
        self.centered.ncols()
    }

    /// Unbiased sample covariance `Xc Xcᵀ / (N − 1)`, promoted to f64.
    pub fn covariance(&self) -> DMatrix<f64> {
        let denom = self.samples().saturating_sub(1).max(1) as f32;
        let cov = (&self.centered * self.centered.transpose()) / denom;
        cov.map(|v| v as f64)
    }
}

/// Symmetric eigen-decomposition with the floor already applied.
#[derive(Clone, Debug)]
pub struct CovarianceEigen {
    pub eigenvalues: DVector<f64>,
    pub eigenvectors: DMatrix<f64>,
    floor: f64,
}

impl CovarianceEigen {
    pub fn decompose(mut cov: DMatrix<f64>, options: &WctOptions) -> Self {
        if options.ridge > 0.0 {
            for i in 0..cov.nrows() {
                cov[(i, i)] += options.ridge;
            }
        }
        let eig = SymmetricEigen::new(cov);
        Self {
            eigenvalues: eig.eigenvalues,
            eigenvectors: eig.eigenvectors,
            floor: options.eigen_floor.max(0.0),
        }
    }

    /// Number of eigenvalues above the floor.
    pub fn rank(&self) -> usize {
        self.eigenvalues.iter().filter(|&&l| l > self.floor).count()
    }

    /// `E diag(f(λ)) Eᵀ` over retained eigenpairs.
    fn spectral(&self, f: impl Fn(f64) -> f64) -> DMatrix<f64> {
        let mut scaled = self.eigenvectors.clone();
        for (i, mut col) in scaled.column_iter_mut().enumerate() {
            let l = self.eigenvalues[i];
            let s = if l > self.floor { f(l) } else { 0.0 };
            col *= s;
        }
        scaled * self.eigenvectors.transpose()
    }

    /// Maps centred samples to decorrelated, unit-variance samples.
    pub fn whitening(&self) -> DMatrix<f64> {
        self.spectral(|l| 1.0 / l.sqrt())
    }

    /// Maps unit-variance samples to samples with this covariance.
    pub fn coloring(&self) -> DMatrix<f64> {
        self.spectral(f64::sqrt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitening_inverts_coloring_on_full_rank() {
        let cov = DMatrix::from_row_slice(3, 3, &[4.0, 1.0, 0.5, 1.0, 3.0, 0.2, 0.5, 0.2, 2.0]);
        let eig = CovarianceEigen::decompose(cov.clone(), &WctOptions::default());
        assert_eq!(eig.rank(), 3);
        let id = eig.coloring() * eig.whitening();
        assert!((id - DMatrix::identity(3, 3)).abs().max() < 1e-10);
        let back = eig.coloring() * eig.coloring();
        assert!((back - cov).abs().max() < 1e-10);
    }

    #[test]
    fn singular_covariance_is_truncated_not_inverted() {
        // Rank one: second channel is twice the first.
        let cov = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let eig = CovarianceEigen::decompose(cov, &WctOptions::default());
        assert_eq!(eig.rank(), 1);
        let w = eig.whitening();
        assert!(w.iter().all(|v| v.is_finite()));
        assert!(w.abs().max() < 1.0);
    }

    #[test]
    fn ridge_restores_full_rank() {
        let cov = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        let options = WctOptions::default().with_ridge(1e-3);
        assert_eq!(CovarianceEigen::decompose(cov, &options).rank(), 2);
    }

    #[test]
    fn stats_centre_each_channel() {
        let mut map = FeatureMap::new(1, 4, 2);
        map.data.copy_from_slice(&[1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0]);
        let stats = ChannelStats::from_map(&map);
        assert_eq!(stats.mean.as_slice(), &[2.5, 25.0]);
        assert_eq!(stats.centered.shape(), (2, 4));
        assert!((stats.centered[(1, 0)] + 15.0).abs() < 1e-6);
        let cov = stats.covariance();
        assert!((cov[(0, 0)] - 5.0 / 3.0).abs() < 1e-5);
        assert!((cov[(0, 1)] - 50.0 / 3.0).abs() < 1e-4);
    }
}
