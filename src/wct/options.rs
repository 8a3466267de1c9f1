use serde::{Deserialize, Serialize};

/// Numeric knobs of the whitening and coloring transform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WctOptions {
    /// Eigenvalues `<= eigen_floor` are excluded from whitening/coloring.
    pub eigen_floor: f64,
    /// Added to the covariance diagonal before decomposition.
    pub ridge: f64,
}

impl Default for WctOptions {
    fn default() -> Self {
        Self {
            eigen_floor: 1e-5,
            ridge: 0.0,
        }
    }
}

impl WctOptions {
    pub fn with_eigen_floor(mut self, eigen_floor: f64) -> Self {
        self.eigen_floor = eigen_floor;
        self
    }

    pub fn with_ridge(mut self, ridge: f64) -> Self {
        self.ridge = ridge;
        self
    }
}
