//! Axes and the ordered curve lists they own.

use std::fmt;

use tracing::info;

use crate::error::{PlotError, Result};
use crate::keygen::CurveKey;

/// Default prefix for auto-named axes.
pub const DEFAULT_AXIS_PREFIX: &str = "Y-Axis";

/// Stable identifier of an axis. Names are mutable; ids are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AxisId(u32);

impl AxisId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "axis#{}", self.0)
    }
}

/// A vertical scale owning an ordered list of curves.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    id: AxisId,
    name: String,
    curves: Vec<CurveKey>,
    pub auto_range: bool,
    pub min_range: f64,
    pub max_range: f64,
    visible: bool,
}

impl Axis {
    fn new(id: AxisId, name: String) -> Self {
        Self {
            id,
            name,
            curves: Vec::new(),
            auto_range: true,
            min_range: 0.0,
            max_range: 1.0,
            visible: true,
        }
    }

    pub fn id(&self) -> AxisId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Curve keys in list order.
    pub fn curves(&self) -> &[CurveKey] {
        &self.curves
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn position_of(&self, key: CurveKey) -> Option<usize> {
        self.curves.iter().position(|k| *k == key)
    }
}

/// All axes of a plot, in display order.
///
/// Curve membership is changed only by the registry, which keeps each curve's
/// own `axis` field in step with the lists kept here.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisCollection {
    axes: Vec<Axis>,
    next_id: u32,
    prefix: String,
}

impl AxisCollection {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            axes: Vec::new(),
            next_id: 1,
            prefix: prefix.into(),
        }
    }

    // -- Lookup ------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Axis> {
        self.axes.iter()
    }

    pub fn get(&self, id: AxisId) -> Option<&Axis> {
        self.axes.iter().find(|a| a.id == id)
    }

    fn get_mut(&mut self, id: AxisId) -> Result<&mut Axis> {
        self.axes
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| PlotError::AxisNotFound(id.to_string()))
    }

    pub fn by_name(&self, name: &str) -> Option<&Axis> {
        self.axes.iter().find(|a| a.name == name)
    }

    /// Resolve an axis name to its id.
    pub fn id_of(&self, name: &str) -> Result<AxisId> {
        self.by_name(name)
            .map(|a| a.id)
            .ok_or_else(|| PlotError::AxisNotFound(name.to_string()))
    }

    /// The last axis in display order, where new curves go by default.
    pub fn last_id(&self) -> Option<AxisId> {
        self.axes.last().map(|a| a.id)
    }

    // -- Axis lifecycle ----------------------------------------------------

    /// Add an empty axis at the end.
    ///
    /// Without a name (or with a blank one) the axis is called
    /// `"<prefix> <n>"` for the smallest `n >= 1` not already taken.
    pub fn add_axis(&mut self, name: Option<&str>) -> Result<AxisId> {
        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => {
                if self.by_name(n).is_some() {
                    return Err(PlotError::DuplicateAxisName(n.to_string()));
                }
                n.to_string()
            }
            None => self.auto_name(),
        };
        let id = AxisId(self.next_id);
        self.next_id += 1;
        info!(%id, %name, "adding axis");
        self.axes.push(Axis::new(id, name));
        Ok(id)
    }

    fn auto_name(&self) -> String {
        (1..)
            .map(|n| format!("{} {}", self.prefix, n))
            .find(|candidate| self.by_name(candidate).is_none())
            .unwrap_or_default()
    }

    /// Remove an axis, returning it with the curve keys it still owned.
    ///
    /// Callers are responsible for retiring those curves; see
    /// [`PlotSession::remove_axis`](crate::session::PlotSession::remove_axis).
    pub(crate) fn remove_axis(&mut self, id: AxisId) -> Result<Axis> {
        let index = self
            .axes
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| PlotError::AxisNotFound(id.to_string()))?;
        let axis = self.axes.remove(index);
        info!(%id, name = %axis.name, "removed axis");
        Ok(axis)
    }

    /// Rename an axis. Names must stay unique across all live axes.
    pub fn rename_axis(&mut self, id: AxisId, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlotError::InvalidAxisName(name.to_string()));
        }
        if let Some(other) = self.by_name(name) {
            if other.id != id {
                return Err(PlotError::DuplicateAxisName(name.to_string()));
            }
        }
        self.get_mut(id)?.name = name.to_string();
        Ok(())
    }

    // -- Display state -----------------------------------------------------

    /// Set a manual range; this turns auto-range off.
    pub fn set_range(&mut self, id: AxisId, min: f64, max: f64) -> Result<()> {
        let axis = self.get_mut(id)?;
        axis.min_range = min;
        axis.max_range = max;
        axis.auto_range = false;
        Ok(())
    }

    pub fn set_auto_range(&mut self, id: AxisId, auto: bool) -> Result<()> {
        self.get_mut(id)?.auto_range = auto;
        Ok(())
    }

    pub(crate) fn set_visible(&mut self, id: AxisId, visible: bool) -> Result<()> {
        self.get_mut(id)?.visible = visible;
        Ok(())
    }

    // -- Curve membership --------------------------------------------------

    /// Insert `key` at `position` (clamped), or at the end when `None`.
    pub(crate) fn attach(
        &mut self,
        id: AxisId,
        key: CurveKey,
        position: Option<usize>,
    ) -> Result<usize> {
        let axis = self.get_mut(id)?;
        let at = position.unwrap_or(axis.curves.len()).min(axis.curves.len());
        axis.curves.insert(at, key);
        Ok(at)
    }

    /// Remove `key` from an axis, returning the position it held.
    pub(crate) fn detach(&mut self, id: AxisId, key: CurveKey) -> Result<usize> {
        let axis = self.get_mut(id)?;
        let at = axis
            .position_of(key)
            .ok_or_else(|| PlotError::structural(format!("{} is not listed on {}", key, id)))?;
        axis.curves.remove(at);
        Ok(at)
    }

    /// Swap the key at `position` for `key`, returning the key it replaced.
    pub(crate) fn replace_at(&mut self, id: AxisId, position: usize, key: CurveKey) -> Result<CurveKey> {
        let axis = self.get_mut(id)?;
        let slot = axis
            .curves
            .get_mut(position)
            .ok_or_else(|| PlotError::structural(format!("{} has no slot {}", id, position)))?;
        Ok(std::mem::replace(slot, key))
    }

    /// Move `key` from one axis to another (or within one axis).
    ///
    /// The key is detached before it is attached, so at no point does it
    /// appear twice. Returns the position it landed at.
    pub(crate) fn move_curve(
        &mut self,
        key: CurveKey,
        from: AxisId,
        to: AxisId,
        position: Option<usize>,
    ) -> Result<usize> {
        // Validate both ends before touching either list.
        self.get(to)
            .ok_or_else(|| PlotError::AxisNotFound(to.to_string()))?;
        let source = self
            .get(from)
            .ok_or_else(|| PlotError::AxisNotFound(from.to_string()))?;
        if source.position_of(key).is_none() {
            return Err(PlotError::structural(format!(
                "{} is not listed on {}",
                key, from
            )));
        }

        self.detach(from, key)?;
        self.attach(to, key, position)
    }
}

impl Default for AxisCollection {
    fn default() -> Self {
        Self::new(DEFAULT_AXIS_PREFIX)
    }
}
