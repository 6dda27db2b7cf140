//! Session error types.

use crate::keygen::CurveKey;

/// Errors raised by registry, axis and session operations.
///
/// Every operation validates before it mutates, so any of these leaves the
/// session exactly as it was (apart from a burned candidate key, see
/// [`KeyGenerator`](crate::keygen::KeyGenerator)).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlotError {
    /// A formula placeholder names no existing curve.
    #[error("{name} is an invalid variable name. Available: {available:?}")]
    UnknownVariable {
        /// The placeholder as written.
        name: String,
        /// Keys that were available at the time.
        available: Vec<String>,
    },

    /// A formula references the curve it defines.
    #[error("{0} is recursive")]
    SelfReference(String),

    /// Admitting the formula would close a loop in the dependency graph.
    #[error("There was a recursive dependency somewhere")]
    CyclicDependency,

    /// A placeholder-free expression failed to parse or evaluate.
    #[error("{0}")]
    Syntax(String),

    /// Another axis already uses this name.
    #[error("axis name '{0}' is already in use")]
    DuplicateAxisName(String),

    #[error("invalid axis name '{0}'")]
    InvalidAxisName(String),

    /// The registry and axis collection disagree about where something lives.
    #[error("structural lookup failed: {0}")]
    StructuralLookup(String),

    #[error("curve not found: {0}")]
    CurveNotFound(String),

    #[error("axis not found: {0}")]
    AxisNotFound(String),

    #[error("Formula must start with 'f://'. Example: f://{{PV1}}+2 (got '{0}')")]
    MissingFormulaPrefix(String),

    /// A formula edit for this curve is already scheduled.
    #[error("an edit of {0} is already pending")]
    EditPending(CurveKey),

    #[error("no sample value for {0}")]
    MissingSample(CurveKey),

    #[error("evaluation failed: {0}")]
    Evaluation(String),

    #[error("invalid layout: {0}")]
    Layout(String),
}

impl PlotError {
    /// Creates a [`PlotError::StructuralLookup`] and records it at debug
    /// level; it indicates the registry and axes drifted apart.
    pub fn structural(what: impl Into<String>) -> Self {
        let what = what.into();
        tracing::debug!(%what, "structural lookup failure");
        Self::StructuralLookup(what)
    }

    /// Returns `true` for errors caused by formula content rather than by
    /// session topology.
    pub fn is_formula_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownVariable { .. }
                | Self::SelfReference(_)
                | Self::CyclicDependency
                | Self::Syntax(_)
                | Self::MissingFormulaPrefix(_)
        )
    }
}

/// Convenience alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, PlotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = PlotError::UnknownVariable {
            name: "PV99".into(),
            available: vec!["PV1".into(), "PV2".into()],
        };
        assert_eq!(
            err.to_string(),
            r#"PV99 is an invalid variable name. Available: ["PV1", "PV2"]"#
        );
        assert_eq!(PlotError::SelfReference("X".into()).to_string(), "X is recursive");
        assert_eq!(
            PlotError::MissingFormulaPrefix("1+1".into()).to_string(),
            "Formula must start with 'f://'. Example: f://{PV1}+2 (got '1+1')"
        );
    }

    #[test]
    fn classification() {
        assert!(PlotError::CyclicDependency.is_formula_error());
        assert!(!PlotError::structural("axis 3 missing").is_formula_error());
    }
}
