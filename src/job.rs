//! Job grid: clustering methods, pollution percentages, and the directory
//! naming convention shared by detection and evaluation.

use errors::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Upper bound (inclusive) of a pollution percentage.
pub const MAX_POLLUTION: u32 = 100;

/// Upper bound (inclusive) of the default pollution sweep.
pub const DEFAULT_MAX_POLLUTION: u32 = 40;

/// Suffix appended to an image directory to name its outlier directory.
pub const OUTLIER_SUFFIX: &str = "outlier";

/// Clustering methods understood by the external classifier.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub enum Method {
    /// K-means clustering.
    #[serde(rename = "kmeans")]
    KMeans,

    /// BIRCH clustering.
    #[serde(rename = "birch")]
    Birch,

    /// Gaussian mixture model.
    #[serde(rename = "gaussian_mixture")]
    GaussianMixture,

    /// Agglomerative (hierarchical) clustering.
    #[serde(rename = "agglomerative_clustering")]
    AgglomerativeClustering,
}

impl Method {
    /// All methods, in the order the default sweep uses.
    pub const ALL: [Method; 4] = [
        Method::KMeans,
        Method::Birch,
        Method::GaussianMixture,
        Method::AgglomerativeClustering,
    ];

    /// The identifier passed to the classifier and written to reports.
    pub fn as_str(&self) -> &'static str {
        match *self {
            Method::KMeans => "kmeans",
            Method::Birch => "birch",
            Method::GaussianMixture => "gaussian_mixture",
            Method::AgglomerativeClustering => "agglomerative_clustering",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Method> {
        Method::ALL
            .iter()
            .find(|m| m.as_str() == s)
            .cloned()
            .ok_or_else(|| {
                ErrorKind::InvalidConfig(format!("unknown clustering method {:?}", s)).into()
            })
    }
}

/// Returns a fresh copy of the default method list.
pub fn default_methods() -> Vec<Method> {
    Method::ALL.to_vec()
}

/// Returns a fresh copy of the default pollution sweep (0 to 40, inclusive).
pub fn default_pollutions() -> Vec<u32> {
    (0..DEFAULT_MAX_POLLUTION + 1).collect()
}

/// One cell of the grid: a clustering method with a pollution percentage.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct JobSpec {
    /// Clustering method.
    pub method: Method,

    /// Assumed outlier share, in percent.
    pub pollution: u32,
}

impl JobSpec {
    /// Creates a new `JobSpec`.
    pub fn new(m: Method, p: u32) -> Self {
        JobSpec {
            method: m,
            pollution: p,
        }
    }

    /// Gets the directory holding the images the classifier keeps (inliers).
    pub fn derive_inlier_dir<P: AsRef<Path>>(&self, base: P) -> PathBuf {
        let suffix = format!("-{}-{}", self.method, self.pollution);
        with_suffix(base.as_ref(), &suffix)
    }

    /// Gets the directory the classifier relocates outliers into.
    pub fn derive_outlier_dir<P: AsRef<Path>>(&self, base: P) -> PathBuf {
        let inlier = self.derive_inlier_dir(base);
        with_suffix(&inlier, &format!("-{}", OUTLIER_SUFFIX))
    }
}

impl fmt::Display for JobSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.method, self.pollution)
    }
}

/// Appends `suffix` to the last path component (`a/b` -> `a/b-suffix`).
/// Trailing separators on `base` are dropped first.
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut s = base.components().as_path().as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

/// Returns the full grid of jobs, methods in the outer loop and pollutions in
/// the inner loop.
pub fn enumerate_jobs<'a>(
    methods: &'a [Method],
    pollutions: &'a [u32],
) -> impl Iterator<Item = JobSpec> + 'a {
    iproduct!(methods.iter(), pollutions.iter()).map(|(&m, &p)| JobSpec::new(m, p))
}
