//! Submission files: one `<enrollment_id>,<probability>` line per test row.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::error::ModelError;
use crate::estimator::ProbabilisticClassifier;
use crate::io::load_test_set;
use crate::routines::RunContext;

/// Suffix marking a file that has been produced but not uploaded yet.
pub const PENDING_SUFFIX: &str = ".not-submitted.csv";

/// Normalize a submission name into a path under `dir`.
///
/// `dir` is prefixed unless the name already starts with it, and
/// [`PENDING_SUFFIX`] is appended unless the name already ends in `.csv`.
/// Prefixes are compared by path component, so a trailing separator on
/// `dir` makes no difference.
pub fn resolve_path(dir: &Path, name: &str) -> PathBuf {
    let resolved = if Path::new(name).starts_with(dir) {
        PathBuf::from(name)
    } else {
        dir.join(name)
    };
    if name.ends_with(".csv") {
        return resolved;
    }
    let mut file = resolved.into_os_string();
    file.push(PENDING_SUFFIX);
    PathBuf::from(file)
}

/// Write `ids` and `probabilities` row by row, replacing any existing file.
///
/// Probabilities are printed with six decimals. The parent directory is
/// created when missing. A length mismatch is rejected before the file is
/// touched.
pub fn write_submission(path: &Path, ids: &[i64], probabilities: &[f64]) -> Result<(), ModelError> {
    if ids.len() != probabilities.len() {
        return Err(ModelError::ShapeMismatch {
            context: "enrollment ids vs predictions",
            expected: ids.len(),
            found: probabilities.len(),
        });
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);
    write_submission_to_writer(&mut w, ids, probabilities)?;
    w.flush()?;
    Ok(())
}

/// Format submission lines into any writer.
pub fn write_submission_to_writer(
    mut w: impl Write,
    ids: &[i64],
    probabilities: &[f64],
) -> Result<(), ModelError> {
    for (id, p) in ids.iter().zip(probabilities.iter()) {
        writeln!(w, "{},{:.6}", id, p)?;
    }
    Ok(())
}

/// Predict the cached test set with `model` and write submission `name`.
///
/// Returns the path that was written.
pub fn to_submission<M>(ctx: &RunContext, model: &M, name: &str) -> Result<PathBuf, ModelError>
where
    M: ProbabilisticClassifier + ?Sized,
{
    let settings = &ctx.settings;
    let test = load_test_set(&ctx.cache, &settings.cutoff, &settings.enrollment_test_path())?;
    let probabilities = model.predict_proba(test.features.view())?;
    let path = resolve_path(&settings.submission_dir, name);
    write_submission(&path, &test.ids, &probabilities.to_vec())?;
    info!(target: ctx.log_target, "submission written to {}", path.display());
    Ok(path)
}
