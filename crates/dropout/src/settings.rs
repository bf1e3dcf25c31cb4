//! Run configuration.

use std::path::PathBuf;

/// Snapshot timestamp of the cached dataset.
pub const DEFAULT_CUTOFF: &str = "2014-08-01_22-00-47";

/// Locations and knobs shared by every routine of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory of cached arrays and dumped models.
    pub cache_dir: PathBuf,
    /// Directory holding `enrollment_test.csv`.
    pub data_dir: PathBuf,
    /// Directory submissions are written to.
    pub submission_dir: PathBuf,
    /// Dataset cutoff embedded in cache keys.
    pub cutoff: String,
    /// Seed for every random draw.
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            data_dir: PathBuf::from("data"),
            submission_dir: PathBuf::from("submission"),
            cutoff: DEFAULT_CUTOFF.to_string(),
            seed: 0,
        }
    }
}

impl Settings {
    pub fn enrollment_test_path(&self) -> PathBuf {
        self.data_dir.join("enrollment_test.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_published_layout() {
        let settings = Settings::default();
        assert_eq!(settings.cache_dir, PathBuf::from("cache"));
        assert_eq!(settings.submission_dir, PathBuf::from("submission"));
        assert_eq!(settings.cutoff, "2014-08-01_22-00-47");
        assert_eq!(
            settings.enrollment_test_path(),
            PathBuf::from("data").join("enrollment_test.csv")
        );
    }
}
