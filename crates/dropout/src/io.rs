//! Dataset loading: cached training/test matrices and test enrollment ids.

use std::io::Read;
use std::path::Path;

use log::debug;
use ndarray::{Array1, Array2};
use serde::Deserialize;

use crate::cache::{test_x_key, train_x_key, train_y_key, Cache};
use crate::error::ModelError;
use crate::types::{Dataset, TestSet};

/// Load the cached training matrix and labels for `cutoff`.
pub fn load_training(cache: &Cache, cutoff: &str) -> Result<Dataset, ModelError> {
    let features: Array2<f64> = cache.fetch(&train_x_key(cutoff))?;
    let labels: Array1<f64> = cache.fetch(&train_y_key(cutoff))?;
    let dataset = Dataset::new(features, labels)?;
    debug!(
        target: cache.log_target(),
        "training data: {} rows, {} features",
        dataset.n_rows(),
        dataset.n_features()
    );
    Ok(dataset)
}

#[derive(Debug, Deserialize)]
struct EnrollmentRecord {
    enrollment_id: i64,
}

/// Read the `enrollment_id` column of a CSV file with a header row.
pub fn load_enrollment_ids(path: &Path) -> Result<Vec<i64>, ModelError> {
    let file = std::fs::File::open(path)?;
    load_enrollment_ids_from_reader(file)
}

/// Read enrollment ids from any CSV reader. Columns other than
/// `enrollment_id` are ignored.
pub fn load_enrollment_ids_from_reader(reader: impl Read) -> Result<Vec<i64>, ModelError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut ids = Vec::new();
    for record in rdr.deserialize() {
        let record: EnrollmentRecord = record?;
        ids.push(record.enrollment_id);
    }
    Ok(ids)
}

/// Load the cached test matrix and the ids aligned with its rows.
pub fn load_test_set(cache: &Cache, cutoff: &str, ids_path: &Path) -> Result<TestSet, ModelError> {
    let features: Array2<f64> = cache.fetch(&test_x_key(cutoff))?;
    let ids = load_enrollment_ids(ids_path)?;
    TestSet::new(ids, features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn enrollment_ids_ignore_extra_columns() {
        let data = "username,enrollment_id,course_id\nalice,7,c1\nbob,13,c2\n";
        let ids = load_enrollment_ids_from_reader(data.as_bytes()).unwrap();
        assert_eq!(ids, vec![7, 13]);
    }

    #[test]
    fn missing_enrollment_column_is_a_csv_error() {
        let data = "username,course_id\nalice,c1\n";
        let err = load_enrollment_ids_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ModelError::Csv(_)));
    }

    #[test]
    fn training_set_comes_from_cutoff_keys() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path());
        let cutoff = "2014-08-01_22-00-47";
        cache
            .dump(&array![[1.0, 2.0], [3.0, 4.0]], &train_x_key(cutoff))
            .unwrap();
        cache.dump(&array![0.0, 1.0], &train_y_key(cutoff)).unwrap();

        let data = load_training(&cache, cutoff).unwrap();
        assert_eq!(data.n_rows(), 2);
        assert_eq!(data.n_features(), 2);
        assert!(load_training(&cache, "other").is_err());
    }

    #[test]
    fn misaligned_training_labels_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path());
        cache.dump(&array![[1.0], [2.0]], &train_x_key("c")).unwrap();
        cache.dump(&array![0.0, 1.0, 1.0], &train_y_key("c")).unwrap();
        assert!(matches!(
            load_training(&cache, "c"),
            Err(ModelError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_set_pairs_ids_with_rows() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path());
        cache
            .dump(&array![[0.5], [1.5]], &test_x_key("c"))
            .unwrap();
        let ids_path = dir.path().join("enrollment_test.csv");
        std::fs::write(&ids_path, "enrollment_id\n7\n13\n").unwrap();

        let test = load_test_set(&cache, "c", &ids_path).unwrap();
        assert_eq!(test.ids, vec![7, 13]);
        assert_eq!(test.features.nrows(), 2);
    }
}
