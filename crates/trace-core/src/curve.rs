//! Curve descriptors.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use trace_formula::Formula;

use crate::axis::AxisId;
use crate::color::Color;
use crate::keygen::CurveKey;

/// Data-source flags given to newly created curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveDefaults {
    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(default)]
    pub use_live_data: bool,

    #[serde(default = "default_true")]
    pub use_archive_data: bool,
}

impl Default for CurveDefaults {
    fn default() -> Self {
        Self {
            active: true,
            use_live_data: false,
            use_archive_data: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// What a curve plots.
#[derive(Debug, Clone, PartialEq)]
pub enum CurveKind {
    /// A raw series addressed by name.
    Direct { address: String },

    /// A series derived from other curves.
    Formula {
        formula: Formula,
        /// Keys referenced by the formula, resolved when it was admitted.
        dependencies: BTreeSet<CurveKey>,
    },
}

/// A curve registered in a session.
///
/// `key`, `axis`, `color` and `kind` change only through
/// [`CurveRegistry`](crate::registry::CurveRegistry) so that the registry and
/// the axis collection stay consistent.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    key: CurveKey,
    pub(crate) axis: AxisId,
    color: Color,
    pub(crate) kind: CurveKind,
    pub(crate) edit_pending: bool,

    pub active: bool,
    pub use_live_data: bool,
    pub use_archive_data: bool,
}

impl Curve {
    pub(crate) fn new(
        key: CurveKey,
        axis: AxisId,
        color: Color,
        kind: CurveKind,
        defaults: CurveDefaults,
    ) -> Self {
        Self {
            key,
            axis,
            color,
            kind,
            edit_pending: false,
            active: defaults.active,
            use_live_data: defaults.use_live_data,
            use_archive_data: defaults.use_archive_data,
        }
    }

    pub fn key(&self) -> CurveKey {
        self.key
    }

    pub fn axis(&self) -> AxisId {
        self.axis
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn kind(&self) -> &CurveKind {
        &self.kind
    }

    /// Address for direct curves, full `f://` text for formula curves.
    pub fn text(&self) -> &str {
        match &self.kind {
            CurveKind::Direct { address } => address,
            CurveKind::Formula { formula, .. } => formula.text(),
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self.kind, CurveKind::Formula { .. })
    }

    pub fn formula(&self) -> Option<&Formula> {
        match &self.kind {
            CurveKind::Formula { formula, .. } => Some(formula),
            CurveKind::Direct { .. } => None,
        }
    }

    /// Formula dependencies; `None` for direct curves.
    pub fn dependencies(&self) -> Option<&BTreeSet<CurveKey>> {
        match &self.kind {
            CurveKind::Formula { dependencies, .. } => Some(dependencies),
            CurveKind::Direct { .. } => None,
        }
    }

    /// Whether a deferred formula replacement is waiting to commit.
    pub fn edit_pending(&self) -> bool {
        self.edit_pending
    }

    /// Copy the data-source flags from another curve.
    pub(crate) fn inherit_flags(&mut self, other: &Curve) {
        self.active = other.active;
        self.use_live_data = other.use_live_data;
        self.use_archive_data = other.use_archive_data;
    }
}
