//! Saved plot layouts.
//!
//! A [`Layout`] is a plain serde snapshot of a session: axes in display
//! order, each with its curves in list order, plus the key counter.
//! Restoring re-validates the whole graph, so a hand-edited file cannot
//! smuggle in a cycle or a reference to a curve that does not exist.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use trace_formula::{Formula, extract_variables, is_formula};

use crate::color::Color;
use crate::curve::{CurveDefaults, CurveKind};
use crate::dependency::would_cycle;
use crate::error::{PlotError, Result};
use crate::keygen::CurveKey;
use crate::session::{PlotSession, SessionOptions};
use crate::surface::PlotSurface;

/// On-disk form of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub saved_at: DateTime<Utc>,
    /// Number of the next key to issue.
    pub next_key: u64,
    #[serde(default)]
    pub axes: Vec<AxisLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisLayout {
    pub name: String,
    #[serde(default = "default_true")]
    pub auto_range: bool,
    #[serde(default)]
    pub min: f64,
    #[serde(default = "default_max")]
    pub max: f64,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub curves: Vec<CurveLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveLayout {
    pub key: CurveKey,
    /// Address, or `f://` formula text.
    pub text: String,
    pub color: Color,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub live: bool,
    #[serde(default = "default_true")]
    pub archive: bool,
}

fn default_true() -> bool {
    true
}

fn default_max() -> f64 {
    1.0
}

impl Layout {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .map_err(|e| PlotError::Layout(format!("reading {}: {}", path.display(), e)))?;
        serde_json::from_str(&data)
            .map_err(|e| PlotError::Layout(format!("parsing {}: {}", path.display(), e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)
            .map_err(|e| PlotError::Layout(format!("serializing layout: {}", e)))?;
        fs::write(path, data + "\n")
            .map_err(|e| PlotError::Layout(format!("writing {}: {}", path.display(), e)))
    }
}

impl<S: PlotSurface> PlotSession<S> {
    /// Snapshot the session.
    pub fn to_layout(&self) -> Layout {
        let axes = self
            .axes
            .iter()
            .map(|axis| AxisLayout {
                name: axis.name().to_string(),
                auto_range: axis.auto_range,
                min: axis.min_range,
                max: axis.max_range,
                visible: axis.visible(),
                curves: axis
                    .curves()
                    .iter()
                    .filter_map(|k| self.registry.get(*k))
                    .map(|c| CurveLayout {
                        key: c.key(),
                        text: c.text().to_string(),
                        color: c.color(),
                        active: c.active,
                        live: c.use_live_data,
                        archive: c.use_archive_data,
                    })
                    .collect(),
            })
            .collect();
        Layout {
            saved_at: Utc::now(),
            next_key: self.registry.next_key().number(),
            axes,
        }
    }

    /// Rebuild a session from a layout on the given surface.
    pub fn from_layout_with_surface(layout: &Layout, options: SessionOptions, surface: S) -> Result<Self> {
        let mut session = Self::with_surface(options, surface);

        // First pass: every axis and curve, with dependencies taken from the
        // placeholders as written.
        for axis_layout in &layout.axes {
            let id = session
                .axes
                .add_axis(Some(&axis_layout.name))
                .map_err(|e| PlotError::Layout(e.to_string()))?;
            if axis_layout.auto_range {
                session.axes.set_auto_range(id, true)?;
            } else {
                session.axes.set_range(id, axis_layout.min, axis_layout.max)?;
            }
            session.axes.set_visible(id, axis_layout.visible)?;

            for c in &axis_layout.curves {
                let kind = if is_formula(&c.text) {
                    let formula = Formula::parse(&c.text)
                        .map_err(|e| PlotError::Layout(format!("{}: {}", c.key, e)))?;
                    let dependencies = extract_variables(&c.text)
                        .iter()
                        .map(|name| {
                            CurveKey::parse(name).ok_or_else(|| {
                                PlotError::Layout(format!("{} references '{}', which is not a key", c.key, name))
                            })
                        })
                        .collect::<Result<BTreeSet<_>>>()?;
                    CurveKind::Formula {
                        formula,
                        dependencies,
                    }
                } else {
                    CurveKind::Direct {
                        address: c.text.clone(),
                    }
                };
                let flags = CurveDefaults {
                    active: c.active,
                    use_live_data: c.live,
                    use_archive_data: c.archive,
                };
                session
                    .registry
                    .restore(&mut session.axes, id, c.key, c.color, kind, flags)?;
            }
        }

        // Second pass: the graph as a whole. A reference to a key that was
        // issued and later deleted is a dangling formula and is kept; one to a
        // key never issued is corrupt.
        let issued = layout.next_key.max(session.registry.next_key().number());
        for curve in session.registry.iter() {
            let Some(deps) = curve.dependencies() else {
                continue;
            };
            if let Some(unissued) = deps
                .iter()
                .find(|d| !session.registry.contains(**d) && d.number() >= issued)
            {
                return Err(PlotError::Layout(format!(
                    "{} references {}, which was never issued",
                    curve.key(),
                    unissued
                )));
            }
            if would_cycle(&curve.key().to_string(), deps, &session.registry) {
                return Err(PlotError::Layout(format!(
                    "{} is part of a dependency cycle",
                    curve.key()
                )));
            }
        }

        session.registry.resume_keys_at(layout.next_key);
        session.show_all()?;
        debug!(
            axes = session.axes.len(),
            curves = session.registry.len(),
            "restored layout"
        );
        Ok(session)
    }
}

impl<S: PlotSurface + Default> PlotSession<S> {
    pub fn from_layout(layout: &Layout, options: SessionOptions) -> Result<Self> {
        Self::from_layout_with_surface(layout, options, S::default())
    }
}
