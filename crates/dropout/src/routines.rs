//! Named training routines and the registry that dispatches them.
//!
//! Each routine loads the cached training data, fits its model, dumps the
//! fitted artifacts to the cache and writes a submission file. Routines
//! receive a [`RunContext`] instead of reaching for globals.

use std::collections::BTreeMap;
use std::io::Write;

use log::{debug, info};

use crate::cache::Cache;
use crate::calibration::CalibratedClassifierCv;
use crate::error::ModelError;
use crate::estimator::{Fit, Transform};
use crate::io::load_training;
use crate::logistic::LogisticRegressionCv;
use crate::metrics::auc_score;
use crate::pipeline::{Classifier, Pipeline, Step};
use crate::rfe::Rfe;
use crate::scale::StandardScaler;
use crate::search::{RandomizedSearchCv, SearchResult};
use crate::settings::Settings;
use crate::submission::to_submission;
use crate::svc::LinearSvcModel;
use crate::types::{CalibrationMethod, LinearSvc};

pub use crate::LOG_TARGET;

/// Number of columns kept by feature elimination in `svc_1`.
pub const SVC_1_FEATURES: usize = 21;

/// Everything a routine needs from the outside world.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub settings: Settings,
    pub cache: Cache,
    /// Target passed to every `log` macro call.
    pub log_target: &'static str,
}

impl RunContext {
    pub fn new(settings: Settings) -> Self {
        Self::with_log_target(settings, LOG_TARGET)
    }

    /// Context whose routines, cache and loaders log under `target`.
    pub fn with_log_target(settings: Settings, target: &'static str) -> Self {
        let cache = Cache::new(settings.cache_dir.clone()).with_log_target(target);
        Self {
            settings,
            cache,
            log_target: target,
        }
    }
}

/// Cross-validated logistic regression.
///
/// Dumps `lr.LogisticRegressionCV` and writes submission `lr_0618_xxx`.
pub fn lr(ctx: &RunContext) -> Result<(), ModelError> {
    let target = ctx.log_target;
    debug!(target: target, "lr");

    let data = load_training(&ctx.cache, &ctx.settings.cutoff)?;
    let (x, y) = (data.features.view(), data.labels.view());

    let model = LogisticRegressionCv::default().fit(x, y)?;
    for (c, score) in model.cs.iter().zip(model.scores.iter()) {
        debug!(target: target, "C: {:e}, mean AUC: {:.6}", c, score);
    }
    debug!(target: target, "Best C: {}", model.best_c);
    info!(target: target, "E_in: {}", auc_score(&model, x, y)?);

    ctx.cache.dump(&model, "lr.LogisticRegressionCV")?;
    to_submission(ctx, &model, "lr_0618_xxx")?;
    Ok(())
}

/// Standardized linear SVM with feature elimination and isotonic
/// calibration.
///
/// Dumps `raw_data.SVC`, `feature_selection.RFE.21`, `new_data.SVC` and
/// `new_data.CalibratedClassifierCV.isotonic`, then writes submission
/// `svc_1_0620_01` from the composed pipeline.
pub fn svc_1(ctx: &RunContext) -> Result<(), ModelError> {
    let target = ctx.log_target;
    debug!(target: target, "svc_1");

    let data = load_training(&ctx.cache, &ctx.settings.cutoff)?;
    let y = data.labels.view();
    let base = LinearSvc {
        seed: ctx.settings.seed,
        ..LinearSvc::default()
    };

    let (raw_scaler, x_scaled) = StandardScaler::fit_transform(data.features.view())?;

    let raw_search =
        RandomizedSearchCv::new(base.clone(), ctx.settings.seed).fit(x_scaled.view(), y)?;
    ctx.cache.dump(&raw_search.best_estimator, "raw_data.SVC")?;
    log_search(target, &raw_search, "Best score");

    let rfe = Rfe::new(SVC_1_FEATURES).fit(&raw_search.best_params, x_scaled.view(), y)?;
    ctx.cache
        .dump(&rfe, &format!("feature_selection.RFE.{}", SVC_1_FEATURES))?;
    debug!(
        target: target,
        "Selected features: {:?}",
        rfe.selection.selected()
    );

    let x_pruned = rfe.selection.transform(x_scaled.view())?;
    let (new_scaler, x_new) = StandardScaler::fit_transform(x_pruned.view())?;

    let new_search = RandomizedSearchCv::new(base, ctx.settings.seed).fit(x_new.view(), y)?;
    log_search(target, &new_search, "Best score (E_val)");
    ctx.cache.dump(&new_search.best_estimator, "new_data.SVC")?;

    let isotonic =
        CalibratedClassifierCv::new(new_search.best_params.clone(), CalibrationMethod::Isotonic)
            .fit(x_new.view(), y)?;
    ctx.cache
        .dump(&isotonic, "new_data.CalibratedClassifierCV.isotonic")?;
    info!(
        target: target,
        "E_in (isotonic): {:.6}",
        auc_score(&isotonic, x_new.view(), y)?
    );

    let pipeline = Pipeline::new(Classifier::CalibratedSvc(isotonic))
        .then("scale_raw", Step::Standardize(raw_scaler))
        .then("rfe", Step::SelectFeatures(rfe.selection))
        .then("scale_new", Step::Standardize(new_scaler));
    to_submission(ctx, &pipeline, "svc_1_0620_01")?;
    Ok(())
}

fn log_search(target: &str, search: &SearchResult<LinearSvc, LinearSvcModel>, label: &str) {
    let scores: Vec<String> = search
        .grid_scores
        .iter()
        .map(|s| format!("(C={:.6}, mean={:.6})", s.c, s.mean))
        .collect();
    debug!(target: target, "Grid scores: [{}]", scores.join(", "));
    debug!(target: target, "{}: {}", label, search.best_score);
    debug!(target: target, "Best params: {{'C': {}}}", search.best_c);
}

/// A routine callable by name.
pub type Routine = Box<dyn Fn(&RunContext) -> Result<(), ModelError>>;

/// Fixed mapping from routine names to routines.
#[derive(Default)]
pub struct Registry {
    routines: BTreeMap<String, Routine>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `lr` and `svc_1`.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("lr", lr);
        registry.register("svc_1", svc_1);
        registry
    }

    pub fn register<F>(&mut self, name: &str, routine: F)
    where
        F: Fn(&RunContext) -> Result<(), ModelError> + 'static,
    {
        self.routines.insert(name.to_string(), Box::new(routine));
    }

    pub fn names(&self) -> Vec<&str> {
        self.routines.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.routines.contains_key(name)
    }

    /// Run each named routine in order.
    ///
    /// Unknown names are reported to `diagnostics` as
    /// `function '<name>' not found` and skipped. The first routine error
    /// stops the dispatch and is returned. On success returns the names
    /// that ran.
    pub fn dispatch<S: AsRef<str>>(
        &self,
        names: &[S],
        ctx: &RunContext,
        diagnostics: &mut dyn Write,
    ) -> Result<Vec<String>, ModelError> {
        let mut ran = Vec::new();
        for name in names {
            let name = name.as_ref();
            match self.routines.get(name) {
                Some(routine) => {
                    routine(ctx)?;
                    ran.push(name.to_string());
                }
                None => {
                    writeln!(diagnostics, "function '{}' not found", name)?;
                }
            }
        }
        Ok(ran)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn context() -> RunContext {
        RunContext::new(Settings::default())
    }

    #[test]
    fn standard_registry_knows_both_routines() {
        let registry = Registry::standard();
        assert_eq!(registry.names(), vec!["lr", "svc_1"]);
        assert!(!registry.contains("svc_2"));
    }

    #[test]
    fn unknown_name_is_reported_and_skipped() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut registry = Registry::new();
        registry.register("count", move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        let mut diagnostics: Vec<u8> = Vec::new();
        let ran = registry
            .dispatch(&["count", "nope"], &context(), &mut diagnostics)
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(ran, vec!["count".to_string()]);
        assert_eq!(
            String::from_utf8(diagnostics).unwrap(),
            "function 'nope' not found\n"
        );
    }

    #[test]
    fn routines_run_in_requested_order() {
        let order = Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut registry = Registry::new();
        for name in ["a", "b"] {
            let order = Rc::clone(&order);
            registry.register(name, move |_| {
                order.borrow_mut().push(name);
                Ok(())
            });
        }
        let mut sink: Vec<u8> = Vec::new();
        registry
            .dispatch(&["b", "a", "b"], &context(), &mut sink)
            .unwrap();
        assert_eq!(*order.borrow(), vec!["b", "a", "b"]);
    }

    #[test]
    fn routine_error_stops_dispatch() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut registry = Registry::new();
        registry.register("fail", |_| Err(ModelError::InvalidInput("boom".into())));
        registry.register("count", move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        let mut sink: Vec<u8> = Vec::new();
        let err = registry
            .dispatch(&["fail", "count"], &context(), &mut sink)
            .unwrap_err();
        assert!(format!("{}", err).contains("boom"));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn routines_see_the_context_settings() {
        let seen = Rc::new(Cell::new(0u64));
        let probe = Rc::clone(&seen);
        let mut registry = Registry::new();
        registry.register("probe", move |ctx| {
            probe.set(ctx.settings.seed);
            Ok(())
        });
        let ctx = RunContext::new(Settings {
            seed: 42,
            ..Settings::default()
        });
        registry
            .dispatch(&["probe"], &ctx, &mut std::io::sink())
            .unwrap();
        assert_eq!(seen.get(), 42);
        assert_eq!(ctx.log_target, "modeling");
    }

    #[test]
    fn context_hands_its_log_target_to_the_cache() {
        let ctx = RunContext::with_log_target(Settings::default(), "tuning");
        assert_eq!(ctx.log_target, "tuning");
        assert_eq!(ctx.cache.log_target(), "tuning");
        assert_eq!(context().cache.log_target(), LOG_TARGET);
    }

    #[test]
    fn missing_cache_makes_lr_fail() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::new(Settings {
            cache_dir: dir.path().to_path_buf(),
            ..Settings::default()
        });
        assert!(matches!(lr(&ctx), Err(ModelError::Io(_))));
    }
}
