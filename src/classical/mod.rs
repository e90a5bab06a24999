//! One-shot-fit estimators: trees, forests, neighbours, naive Bayes,
//! kernel machines and boosted trees.

pub mod binned;
pub mod boosting;
pub mod forest;
pub mod knn;
pub mod naive_bayes;
pub mod svm;
pub mod tree;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Hyperparams;
use crate::error::{FitError, Result};
use crate::task::{ModelChoice, Targets, TaskKind, TaskSpec};
use crate::train::predictor::{class_scores, Predictor, Scores};

use self::binned::BinnedRegressor;
use self::boosting::{BoostParams, GradientBoostingClassifier, GradientBoostingRegressor};
use self::forest::{ForestParams, RandomForestClassifier, RandomForestRegressor};
use self::knn::{KnnClassifier, KnnRegressor};
use self::naive_bayes::GaussianNb;
use self::svm::{Gamma, Kernel, Svc, Svr, SvmParams};
use self::tree::{DecisionTree, TreeParams};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Classical hyperparameters after defaults are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassicalParams {
    pub seed: u64,
    pub n_estimators: Option<usize>,
    pub max_depth: Option<usize>,
    pub n_neighbors: usize,
    pub var_smoothing: f64,
    pub c: f64,
    pub kernel: String,
    pub gamma: Gamma,
    pub degree: usize,
    pub epsilon: f64,
    pub max_iter: usize,
    pub learning_rate: f64,
    pub nb_reg_bins: usize,
}

impl ClassicalParams {
    pub fn from_hyperparams(hp: &Hyperparams) -> Result<ClassicalParams> {
        let c = hp.f64_or("C", 1.0);
        if c.is_nan() || c <= 0.0 {
            return Err(FitError::InvalidConfig(format!("C must be positive, got {c}")));
        }
        Ok(ClassicalParams {
            seed: hp.opt_usize("seed").map_or(42, |s| s as u64),
            n_estimators: hp.opt_usize("n_estimators").filter(|&n| n > 0),
            max_depth: hp.opt_usize("max_depth").filter(|&d| d > 0),
            n_neighbors: hp.usize_or("n_neighbors", 7).max(1),
            var_smoothing: hp.f64_or("var_smoothing", 1e-9),
            c,
            kernel: hp.str_or("kernel", "rbf"),
            gamma: Gamma::parse(&hp.str_or("gamma", "scale"))?,
            degree: hp.usize_or("degree", 3),
            epsilon: hp.f64_or("epsilon", 0.1).max(0.0),
            max_iter: hp.usize_or("max_iter", SvmParams::default().max_iter).max(1),
            learning_rate: hp.f64_or("learning_rate", 0.1),
            nb_reg_bins: hp.usize_or("nb_reg_bins", 10).max(2),
        })
    }

    fn tree(&self) -> TreeParams {
        TreeParams { max_depth: self.max_depth, seed: self.seed, ..TreeParams::default() }
    }

    fn forest(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators.unwrap_or(200),
            max_depth: self.max_depth,
            seed: self.seed,
        }
    }

    fn boost(&self) -> BoostParams {
        BoostParams {
            n_estimators: self.n_estimators.unwrap_or(100),
            learning_rate: self.learning_rate,
            max_depth: self.max_depth.unwrap_or(3),
            seed: self.seed,
        }
    }

    fn svm(&self) -> SvmParams {
        SvmParams { c: self.c, epsilon: self.epsilon, max_iter: self.max_iter, ..SvmParams::default() }
    }
}

// ---------------------------------------------------------------------------
// Estimators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Classifier {
    Tree { tree: DecisionTree, n_classes: usize },
    Forest(RandomForestClassifier),
    Knn(KnnClassifier),
    NaiveBayes(GaussianNb),
    Svm(Svc),
    Boosting(GradientBoostingClassifier),
}

impl Classifier {
    pub fn fit(
        choice: ModelChoice,
        params: &ClassicalParams,
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
    ) -> Result<Classifier> {
        Ok(match choice {
            ModelChoice::DtCls => Classifier::Tree {
                tree: DecisionTree::fit_classifier(x, y, n_classes, params.tree()),
                n_classes,
            },
            ModelChoice::RfCls => Classifier::Forest(RandomForestClassifier::fit(x, y, n_classes, params.forest())),
            ModelChoice::KnnCls => Classifier::Knn(KnnClassifier::fit(x, y, n_classes, params.n_neighbors)),
            ModelChoice::NbCls => Classifier::NaiveBayes(GaussianNb::fit(x, y, n_classes, params.var_smoothing)),
            ModelChoice::SvmCls => {
                let kernel = Kernel::from_name(&params.kernel, params.gamma, params.degree, x)?;
                Classifier::Svm(Svc::fit(kernel, x, y, n_classes, &params.svm()))
            }
            ModelChoice::GbCls => {
                Classifier::Boosting(GradientBoostingClassifier::fit(x, y, n_classes, params.boost()))
            }
            other => return Err(FitError::UnsupportedModel(format!("{other} is not a classical classifier"))),
        })
    }

    /// Class probabilities, one row per input row.
    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Vec<Vec<f64>> {
        match self {
            Classifier::Tree { tree, n_classes } => x
                .iter()
                .map(|row| {
                    let mut p = tree.predict_row(row).to_vec();
                    p.resize(*n_classes, 0.0);
                    p
                })
                .collect(),
            Classifier::Forest(m) => m.predict_proba(x),
            Classifier::Knn(m) => m.predict_proba(x),
            Classifier::NaiveBayes(m) => m.predict_proba(x),
            Classifier::Svm(m) => m.predict_proba(x),
            Classifier::Boosting(m) => m.predict_proba(x),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Regressor {
    Tree(DecisionTree),
    Forest(RandomForestRegressor),
    Knn(KnnRegressor),
    Binned(BinnedRegressor),
    Svm(Svr),
    Boosting(GradientBoostingRegressor),
}

impl Regressor {
    pub fn fit(choice: ModelChoice, params: &ClassicalParams, x: &[Vec<f64>], y: &[f64]) -> Result<Regressor> {
        Ok(match choice {
            ModelChoice::DtReg => Regressor::Tree(DecisionTree::fit_regressor(x, y, params.tree())),
            ModelChoice::RfReg => Regressor::Forest(RandomForestRegressor::fit(x, y, params.forest())),
            ModelChoice::KnnReg => Regressor::Knn(KnnRegressor::fit(x, y, params.n_neighbors)),
            ModelChoice::NbReg => {
                Regressor::Binned(BinnedRegressor::fit(x, y, params.nb_reg_bins, params.var_smoothing))
            }
            ModelChoice::SvmReg => {
                let kernel = Kernel::from_name(&params.kernel, params.gamma, params.degree, x)?;
                Regressor::Svm(Svr::fit(kernel, x, y, &params.svm()))
            }
            ModelChoice::GbReg => Regressor::Boosting(GradientBoostingRegressor::fit(x, y, params.boost())),
            other => return Err(FitError::UnsupportedModel(format!("{other} is not a classical regressor"))),
        })
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        match self {
            Regressor::Tree(t) => x.iter().map(|row| t.predict_value(row)).collect(),
            Regressor::Forest(m) => m.predict(x),
            Regressor::Knn(m) => m.predict(x),
            Regressor::Binned(m) => m.predict(x),
            Regressor::Svm(m) => m.predict(x),
            Regressor::Boosting(m) => m.predict(x),
        }
    }
}

/// One binary classifier per label column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneVsRest {
    estimators: Vec<Classifier>,
}

impl OneVsRest {
    pub fn fit(choice: ModelChoice, params: &ClassicalParams, x: &[Vec<f64>], y: &[Vec<u8>]) -> Result<OneVsRest> {
        let n_labels = y.first().map_or(0, Vec::len);
        let estimators = (0..n_labels)
            .map(|l| {
                let column: Vec<usize> = y.iter().map(|row| usize::from(row[l])).collect();
                Classifier::fit(choice, params, x, &column, 2)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(OneVsRest { estimators })
    }

    /// Per-label probability of the positive class.
    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let per_label: Vec<Vec<Vec<f64>>> = self.estimators.iter().map(|e| e.predict_proba(x)).collect();
        (0..x.len())
            .map(|i| per_label.iter().map(|p| p[i].get(1).copied().unwrap_or(0.0)).collect())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "state", rename_all = "snake_case")]
pub enum Estimator {
    Classifier(Classifier),
    Regressor(Regressor),
    OneVsRest(OneVsRest),
}

/// A fitted classical estimator and the task it solves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicalModel {
    pub choice: ModelChoice,
    pub task: TaskSpec,
    pub estimator: Estimator,
}

impl ClassicalModel {
    /// Fits `choice` on the training rows. Multilabel targets are wrapped
    /// in one-vs-rest.
    pub fn fit(
        choice: ModelChoice,
        params: &ClassicalParams,
        task: &TaskSpec,
        x: &[Vec<f64>],
        y: &Targets,
    ) -> Result<ClassicalModel> {
        let estimator = match (task.kind, y) {
            (TaskKind::Regression, Targets::Values(v)) => Estimator::Regressor(Regressor::fit(choice, params, x, v)?),
            (TaskKind::MultilabelClassification, Targets::Indicators(rows)) => {
                debug!(labels = task.num_classes, "wrapping estimator in one-vs-rest");
                Estimator::OneVsRest(OneVsRest::fit(choice, params, x, rows)?)
            }
            (TaskKind::BinaryClassification | TaskKind::MulticlassClassification, Targets::Classes(c)) => {
                Estimator::Classifier(Classifier::fit(choice, params, x, c, task.num_classes.max(2))?)
            }
            (kind, _) => {
                return Err(FitError::Data(format!("targets do not match a {} task", kind.as_str())));
            }
        };
        Ok(ClassicalModel { choice, task: task.clone(), estimator })
    }
}

impl Predictor for ClassicalModel {
    fn task(&self) -> &TaskSpec {
        &self.task
    }

    fn predict_scores(&self, x: &[Vec<f64>]) -> Scores {
        match &self.estimator {
            Estimator::Regressor(r) => Scores::Regression(r.predict(x)),
            Estimator::Classifier(c) => class_scores(self.task.kind, c.predict_proba(x)),
            Estimator::OneVsRest(o) => Scores::Multilabel(o.predict_proba(x)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> (Vec<Vec<f64>>, Vec<usize>) {
        let x: Vec<Vec<f64>> = (0..24)
            .map(|i| {
                let c = if i % 2 == 0 { -2.0 } else { 2.0 };
                vec![c + (i as f64) * 0.01, c - (i as f64) * 0.01]
            })
            .collect();
        let y = (0..24).map(|i| i % 2).collect();
        (x, y)
    }

    fn binary_task() -> TaskSpec {
        TaskSpec {
            kind: TaskKind::BinaryClassification,
            feature_dim: 2,
            num_classes: 2,
            class_names: vec!["no".into(), "yes".into()],
        }
    }

    #[test]
    fn defaults_follow_hyperparams() {
        let p = ClassicalParams::from_hyperparams(&Hyperparams::default()).unwrap();
        assert_eq!(p.seed, 42);
        assert_eq!(p.n_neighbors, 7);
        assert_eq!(p.forest().n_estimators, 200);
        assert_eq!(p.boost().n_estimators, 100);
        assert_eq!(p.gamma, Gamma::Scale);

        let hp = Hyperparams::default().with("n_estimators", 5).with("gamma", "auto");
        let p = ClassicalParams::from_hyperparams(&hp).unwrap();
        assert_eq!(p.forest().n_estimators, 5);
        assert_eq!(p.gamma, Gamma::Auto);
    }

    #[test]
    fn every_classifier_separates_blobs() {
        let (x, y) = two_blobs();
        let params = ClassicalParams::from_hyperparams(&Hyperparams::default().with("n_estimators", 20)).unwrap();
        let task = binary_task();
        for choice in [
            ModelChoice::DtCls,
            ModelChoice::RfCls,
            ModelChoice::KnnCls,
            ModelChoice::NbCls,
            ModelChoice::SvmCls,
            ModelChoice::GbCls,
        ] {
            let model = ClassicalModel::fit(choice, &params, &task, &x, &Targets::Classes(y.clone())).unwrap();
            assert_eq!(model.predict(&x), Targets::Classes(y.clone()), "{choice}");
        }
    }

    #[test]
    fn one_vs_rest_predicts_each_label() {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![(i % 4) as f64 * 3.0]).collect();
        let y: Vec<Vec<u8>> = (0..20).map(|i| vec![u8::from(i % 4 >= 2), u8::from(i % 2 == 1)]).collect();
        let task = TaskSpec {
            kind: TaskKind::MultilabelClassification,
            feature_dim: 1,
            num_classes: 2,
            class_names: vec!["a".into(), "b".into()],
        };
        let params = ClassicalParams::from_hyperparams(&Hyperparams::default()).unwrap();
        let model = ClassicalModel::fit(ModelChoice::DtCls, &params, &task, &x, &Targets::Indicators(y.clone())).unwrap();
        assert_eq!(model.predict(&x), Targets::Indicators(y));
    }

    #[test]
    fn one_vs_rest_gives_one_probability_per_label() {
        let x: Vec<Vec<f64>> = (0..24).map(|i| vec![(i % 4) as f64, (i % 3) as f64]).collect();
        let y: Vec<Vec<u8>> = (0..24)
            .map(|i| vec![u8::from(i % 4 >= 2), u8::from(i % 3 == 0), u8::from(i % 2 == 0)])
            .collect();
        let params = ClassicalParams::from_hyperparams(&Hyperparams::default().with("n_estimators", 5)).unwrap();
        for choice in [ModelChoice::RfCls, ModelChoice::KnnCls, ModelChoice::NbCls, ModelChoice::SvmCls] {
            let ovr = OneVsRest::fit(choice, &params, &x, &y).unwrap();
            let proba = ovr.predict_proba(&x);
            assert_eq!(proba.len(), 24, "{choice}");
            assert!(proba.iter().all(|row| row.len() == 3), "{choice}");
            assert!(proba.iter().flatten().all(|p| (0.0..=1.0).contains(p)), "{choice}");
        }
    }

    #[test]
    fn gradient_models_are_rejected() {
        let params = ClassicalParams::from_hyperparams(&Hyperparams::default()).unwrap();
        let x = vec![vec![0.0], vec![1.0]];
        let err = Regressor::fit(ModelChoice::LinReg, &params, &x, &[0.0, 1.0]).unwrap_err();
        assert!(matches!(err, FitError::UnsupportedModel(_)));
    }

    #[test]
    fn model_survives_a_json_round_trip() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let y = Targets::Values((0..10).map(|i| i as f64 * 2.0).collect());
        let params = ClassicalParams::from_hyperparams(&Hyperparams::default()).unwrap();
        let model = ClassicalModel::fit(ModelChoice::KnnReg, &params, &TaskSpec::regression(1), &x, &y).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let back: ClassicalModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back.predict_scores(&x), model.predict_scores(&x));
    }
}
