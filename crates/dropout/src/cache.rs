//! Keyed on-disk store for arrays and fitted artifacts.
//!
//! Every entry is a single bincode-encoded file under the cache directory.
//! Dataset keys embed the cutoff timestamp of the snapshot they came from,
//! e.g. `train_X_before_2014-08-01_22-00-47.pkl`. Missing entries are an
//! error; nothing is regenerated here.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ModelError;
use crate::LOG_TARGET;

/// Cache key of the training feature matrix for `cutoff`.
pub fn train_x_key(cutoff: &str) -> String {
    format!("train_X_before_{}.pkl", cutoff)
}

/// Cache key of the training label vector for `cutoff`.
pub fn train_y_key(cutoff: &str) -> String {
    format!("train_y_before_{}.pkl", cutoff)
}

/// Cache key of the test feature matrix for `cutoff`.
pub fn test_x_key(cutoff: &str) -> String {
    format!("test_X_before_{}.pkl", cutoff)
}

/// A directory of cached values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cache {
    dir: PathBuf,
    log_target: &'static str,
}

impl Cache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            log_target: LOG_TARGET,
        }
    }

    /// Emit this cache's records under `target`.
    pub fn with_log_target(self, target: &'static str) -> Self {
        Self {
            log_target: target,
            ..self
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn log_target(&self) -> &'static str {
        self.log_target
    }

    /// File backing `key`.
    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Decode the value stored under `key`.
    pub fn fetch<T: DeserializeOwned>(&self, key: &str) -> Result<T, ModelError> {
        let path = self.path(key);
        debug!(target: self.log_target, "loading {}", path.display());
        let file = File::open(&path)?;
        fetch_from_reader(BufReader::new(file))
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn dump<T: Serialize + ?Sized>(&self, value: &T, key: &str) -> Result<PathBuf, ModelError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        dump_to_writer(&mut writer, value)?;
        writer.flush()?;
        debug!(target: self.log_target, "dumped {}", path.display());
        Ok(path)
    }
}

/// Decode a cached value from any reader.
pub fn fetch_from_reader<T: DeserializeOwned>(reader: impl Read) -> Result<T, ModelError> {
    Ok(bincode::deserialize_from(reader)?)
}

/// Encode a value to any writer.
pub fn dump_to_writer<T: Serialize + ?Sized>(
    writer: impl Write,
    value: &T,
) -> Result<(), ModelError> {
    bincode::serialize_into(writer, value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array2};

    #[test]
    fn keys_embed_the_cutoff() {
        let cutoff = "2014-08-01_22-00-47";
        assert_eq!(train_x_key(cutoff), "train_X_before_2014-08-01_22-00-47.pkl");
        assert_eq!(train_y_key(cutoff), "train_y_before_2014-08-01_22-00-47.pkl");
        assert_eq!(test_x_key(cutoff), "test_X_before_2014-08-01_22-00-47.pkl");
    }

    #[test]
    fn dump_then_fetch_returns_the_same_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path().join("nested"));
        let x = array![[1.0, 2.5], [-3.0, 0.0]];

        let path = cache.dump(&x, "m.pkl").unwrap();
        assert_eq!(path, dir.path().join("nested").join("m.pkl"));

        let back: Array2<f64> = cache.fetch("m.pkl").unwrap();
        assert_eq!(back, x);
    }

    #[test]
    fn dump_overwrites_existing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path());
        cache.dump(&array![1.0, 2.0, 3.0], "y.pkl").unwrap();
        cache.dump(&array![4.0], "y.pkl").unwrap();
        let back: Array1<f64> = cache.fetch("y.pkl").unwrap();
        assert_eq!(back, array![4.0]);
    }

    #[test]
    fn log_target_defaults_to_modeling_and_can_be_replaced() {
        let cache = Cache::new("cache");
        assert_eq!(cache.log_target(), "modeling");
        let cache = cache.with_log_target("other");
        assert_eq!(cache.log_target(), "other");
        assert_eq!(cache.dir(), Path::new("cache"));
    }

    #[test]
    fn missing_entry_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path());
        let err = cache.fetch::<Array1<f64>>("absent.pkl").unwrap_err();
        assert!(matches!(err, ModelError::Io(_)));
    }

    #[test]
    fn corrupt_entry_is_a_codec_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.pkl"), b"\x01").unwrap();
        let cache = Cache::new(dir.path());
        let err = cache.fetch::<Array2<f64>>("bad.pkl").unwrap_err();
        assert!(matches!(err, ModelError::Codec(_)));
    }
}
