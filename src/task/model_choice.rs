use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// Metric family a model belongs to. Fixed by the model, never by the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Family {
    Regression,
    Classification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backend {
    /// Iterative minibatch training of a linear model or MLP.
    Gradient,
    /// One-shot fit of a tree, neighbour, Bayes, kernel or ensemble model.
    Classical,
}

/// Closed set of model identifiers accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModelChoice {
    LinReg,
    Ridge,
    Lasso,
    MlpReg,
    LogReg,
    MlpCls,
    DtCls,
    RfCls,
    KnnCls,
    NbCls,
    SvmCls,
    GbCls,
    DtReg,
    RfReg,
    KnnReg,
    NbReg,
    SvmReg,
    GbReg,
}

impl ModelChoice {
    pub const ALL: [ModelChoice; 18] = [
        ModelChoice::LinReg,
        ModelChoice::Ridge,
        ModelChoice::Lasso,
        ModelChoice::MlpReg,
        ModelChoice::LogReg,
        ModelChoice::MlpCls,
        ModelChoice::DtCls,
        ModelChoice::RfCls,
        ModelChoice::KnnCls,
        ModelChoice::NbCls,
        ModelChoice::SvmCls,
        ModelChoice::GbCls,
        ModelChoice::DtReg,
        ModelChoice::RfReg,
        ModelChoice::KnnReg,
        ModelChoice::NbReg,
        ModelChoice::SvmReg,
        ModelChoice::GbReg,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelChoice::LinReg => "linreg",
            ModelChoice::Ridge => "ridge",
            ModelChoice::Lasso => "lasso",
            ModelChoice::MlpReg => "mlp_reg",
            ModelChoice::LogReg => "logreg",
            ModelChoice::MlpCls => "mlp_cls",
            ModelChoice::DtCls => "dt_cls",
            ModelChoice::RfCls => "rf_cls",
            ModelChoice::KnnCls => "knn_cls",
            ModelChoice::NbCls => "nb_cls",
            ModelChoice::SvmCls => "svm_cls",
            ModelChoice::GbCls => "gb_cls",
            ModelChoice::DtReg => "dt_reg",
            ModelChoice::RfReg => "rf_reg",
            ModelChoice::KnnReg => "knn_reg",
            ModelChoice::NbReg => "nb_reg",
            ModelChoice::SvmReg => "svm_reg",
            ModelChoice::GbReg => "gb_reg",
        }
    }

    pub fn family(&self) -> Family {
        match self {
            ModelChoice::LinReg
            | ModelChoice::Ridge
            | ModelChoice::Lasso
            | ModelChoice::MlpReg
            | ModelChoice::DtReg
            | ModelChoice::RfReg
            | ModelChoice::KnnReg
            | ModelChoice::NbReg
            | ModelChoice::SvmReg
            | ModelChoice::GbReg => Family::Regression,
            _ => Family::Classification,
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            ModelChoice::LinReg
            | ModelChoice::Ridge
            | ModelChoice::Lasso
            | ModelChoice::MlpReg
            | ModelChoice::LogReg
            | ModelChoice::MlpCls => Backend::Gradient,
            _ => Backend::Classical,
        }
    }
}

impl FromStr for ModelChoice {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ModelChoice::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| FitError::UnsupportedModel(s.trim().to_string()))
    }
}

impl TryFrom<String> for ModelChoice {
    type Error = FitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModelChoice> for String {
    fn from(m: ModelChoice) -> String {
        m.as_str().to_string()
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
