//! The plotting session: registry, axes, surface and deferred edits.
//!
//! [`PlotSession`] is the composition root. It owns the [`CurveRegistry`],
//! the [`AxisCollection`] and a [`PlotSurface`], and is the only place that
//! keeps the three in step. Formula edits go through a two-phase protocol:
//! [`PlotSession::edit_curve`] validates synchronously and queues a
//! [`ReplacePlan`]; [`PlotSession::run_due`] (or [`PlotSession::settle`])
//! commits it later, outside the caller's stack.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};
use trace_formula::is_formula;

use crate::axis::{AxisCollection, AxisId, DEFAULT_AXIS_PREFIX};
use crate::color::{Color, ColorAssigner, DEFAULT_PALETTE};
use crate::curve::{Curve, CurveDefaults};
use crate::error::{PlotError, Result};
use crate::keygen::CurveKey;
use crate::registry::{CurveRegistry, DanglingPolicy, Removal, ReplacePlan, Replacement};
use crate::schedule::TaskQueue;
use crate::surface::{PlotSurface, RecordingSurface, SeriesDescriptor, SeriesHandle};

/// Default delay before a scheduled formula replacement commits.
pub const DEFAULT_EDIT_DELAY: Duration = Duration::from_millis(10);

/// Session-wide settings, usually built from the loaded configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub edit_delay: Duration,
    pub axis_prefix: String,
    pub on_delete: DanglingPolicy,
    pub curve_defaults: CurveDefaults,
    /// Replaces the built-in palette when set.
    pub palette: Option<Vec<Color>>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            edit_delay: DEFAULT_EDIT_DELAY,
            axis_prefix: DEFAULT_AXIS_PREFIX.to_string(),
            on_delete: DanglingPolicy::default(),
            curve_defaults: CurveDefaults::default(),
            palette: None,
        }
    }
}

impl SessionOptions {
    fn color_assigner(&self) -> ColorAssigner {
        ColorAssigner::new(self.palette.clone().unwrap_or_else(|| DEFAULT_PALETTE.to_vec()))
    }
}

/// What [`PlotSession::edit_curve`] did with the submitted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The text matched the curve's current text.
    Unchanged,
    /// A direct curve's address was changed in place.
    AddressChanged,
    /// A formula replacement passed validation and was queued.
    Scheduled,
}

/// Outcome of one committed formula replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitReport {
    pub old_key: CurveKey,
    pub result: Result<Replacement>,
}

/// A plot under construction.
pub struct PlotSession<S: PlotSurface = RecordingSurface> {
    pub(crate) registry: CurveRegistry,
    pub(crate) axes: AxisCollection,
    surface: S,
    handles: HashMap<CurveKey, SeriesHandle>,
    queue: TaskQueue<ReplacePlan>,
    pub(crate) options: SessionOptions,
}

impl<S: PlotSurface + Default> PlotSession<S> {
    pub fn new(options: SessionOptions) -> Self {
        Self::with_surface(options, S::default())
    }
}

impl<S: PlotSurface> PlotSession<S> {
    pub fn with_surface(options: SessionOptions, surface: S) -> Self {
        Self {
            registry: CurveRegistry::new(options.color_assigner(), options.curve_defaults),
            axes: AxisCollection::new(options.axis_prefix.clone()),
            surface,
            handles: HashMap::new(),
            queue: TaskQueue::new(options.edit_delay),
            options,
        }
    }

    // -- Accessors ---------------------------------------------------------

    pub fn registry(&self) -> &CurveRegistry {
        &self.registry
    }

    pub fn axes(&self) -> &AxisCollection {
        &self.axes
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn curve(&self, key: CurveKey) -> Option<&Curve> {
        self.registry.get(key)
    }

    /// Resolve a spelled key (`PV3`) to a live curve.
    pub fn resolve(&self, name: &str) -> Result<CurveKey> {
        self.registry.resolve(name)
    }

    pub fn axis_id(&self, name: &str) -> Result<AxisId> {
        self.axes.id_of(name)
    }

    /// Number of queued formula replacements.
    pub fn pending_edits(&self) -> usize {
        self.queue.len()
    }

    // -- Surface bookkeeping -----------------------------------------------

    fn descriptor(&self, key: CurveKey) -> Result<SeriesDescriptor> {
        let curve = self
            .registry
            .get(key)
            .ok_or_else(|| PlotError::structural(format!("{} has no curve", key)))?;
        let axis = self
            .axes
            .get(curve.axis())
            .ok_or_else(|| PlotError::structural(format!("{} has no axis {}", key, curve.axis())))?;
        Ok(SeriesDescriptor {
            key,
            name: curve.text().to_string(),
            axis_name: axis.name().to_string(),
            color: curve.color(),
            active: curve.active,
            use_live_data: curve.use_live_data,
            use_archive_data: curve.use_archive_data,
        })
    }

    fn show(&mut self, key: CurveKey) -> Result<()> {
        let descriptor = self.descriptor(key)?;
        let handle = self.surface.add_series(descriptor);
        self.handles.insert(key, handle);
        Ok(())
    }

    fn hide(&mut self, key: CurveKey) {
        if let Some(handle) = self.handles.remove(&key) {
            self.surface.remove_series(handle);
        }
    }

    fn refresh(&mut self, key: CurveKey) -> Result<()> {
        let descriptor = self.descriptor(key)?;
        let handle = match self.handles.get(&key) {
            Some(handle) => self.surface.update_series(*handle, descriptor),
            None => self.surface.add_series(descriptor),
        };
        self.handles.insert(key, handle);
        Ok(())
    }

    fn refresh_axis(&mut self, id: AxisId) -> Result<()> {
        let keys = self
            .axes
            .get(id)
            .map(|a| a.curves().to_vec())
            .unwrap_or_default();
        for key in keys {
            self.refresh(key)?;
        }
        Ok(())
    }

    // -- Axes --------------------------------------------------------------

    pub fn add_axis(&mut self, name: Option<&str>) -> Result<AxisId> {
        self.axes.add_axis(name)
    }

    /// Close an axis, deleting every curve it still owns.
    pub fn remove_axis(&mut self, name: &str) -> Result<Removal> {
        let id = self.axes.id_of(name)?;
        let keys = self
            .axes
            .get(id)
            .map(|a| a.curves().to_vec())
            .unwrap_or_default();
        let removal = self
            .registry
            .delete_many(&mut self.axes, &keys, self.options.on_delete)?;
        self.axes.remove_axis(id)?;
        for key in &removal.removed {
            self.hide(*key);
        }
        Ok(removal)
    }

    pub fn rename_axis(&mut self, name: &str, new_name: &str) -> Result<()> {
        let id = self.axes.id_of(name)?;
        self.axes.rename_axis(id, new_name)?;
        self.refresh_axis(id)
    }

    /// Set a manual range. This turns auto-range off.
    pub fn set_range(&mut self, name: &str, min: f64, max: f64) -> Result<()> {
        let id = self.axes.id_of(name)?;
        self.axes.set_range(id, min, max)
    }

    pub fn set_auto_range(&mut self, name: &str, auto: bool) -> Result<()> {
        let id = self.axes.id_of(name)?;
        self.axes.set_auto_range(id, auto)
    }

    /// Show or hide an axis. Every curve on it follows as `active`.
    pub fn set_axis_visible(&mut self, name: &str, visible: bool) -> Result<()> {
        let id = self.axes.id_of(name)?;
        self.axes.set_visible(id, visible)?;
        let keys = self
            .axes
            .get(id)
            .map(|a| a.curves().to_vec())
            .unwrap_or_default();
        for key in &keys {
            self.registry.curve_mut(*key)?.active = visible;
        }
        self.refresh_axis(id)
    }

    // -- Curves ------------------------------------------------------------

    /// Add a direct or formula series to the last axis, creating an axis
    /// first if there is none.
    pub fn add_series(&mut self, text: &str) -> Result<CurveKey> {
        match self.axes.last_id() {
            Some(axis) => self.add_to(axis, text),
            None => {
                let axis = self.axes.add_axis(None)?;
                let result = self.add_to(axis, text);
                if result.is_err() {
                    // Leave no empty axis behind for a rejected series.
                    self.axes.remove_axis(axis)?;
                }
                result
            }
        }
    }

    /// Add a series to a named axis.
    pub fn add_series_to(&mut self, axis_name: &str, text: &str) -> Result<CurveKey> {
        let axis = self.axes.id_of(axis_name)?;
        self.add_to(axis, text)
    }

    /// Add several series, such as the results of a catalog search.
    ///
    /// Each item is added independently; one failure does not stop the rest.
    pub fn add_many<I, T>(&mut self, axis_name: Option<&str>, items: I) -> Vec<(String, Result<CurveKey>)>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        items
            .into_iter()
            .map(|item| {
                let text = item.as_ref().trim().to_string();
                let result = match axis_name {
                    Some(name) => self.add_series_to(name, &text),
                    None => self.add_series(&text),
                };
                (text, result)
            })
            .collect()
    }

    fn add_to(&mut self, axis: AxisId, text: &str) -> Result<CurveKey> {
        let key = if is_formula(text) {
            self.registry
                .create_formula(&mut self.axes, axis, None, text)?
        } else {
            self.registry.create_direct(&mut self.axes, axis, text)?
        };
        self.show(key)?;
        Ok(key)
    }

    /// Delete a curve. Dependents follow the configured [`DanglingPolicy`].
    pub fn delete(&mut self, key: CurveKey) -> Result<Removal> {
        let removal = self
            .registry
            .delete(&mut self.axes, key, self.options.on_delete)?;
        for key in &removal.removed {
            self.hide(*key);
        }
        Ok(removal)
    }

    /// Move a curve to another axis (or reorder it within its own).
    pub fn move_curve(&mut self, key: CurveKey, axis_name: &str, position: Option<usize>) -> Result<usize> {
        let to = self.axes.id_of(axis_name)?;
        let at = self
            .registry
            .move_curve(&mut self.axes, key, to, position)?;
        self.refresh(key)?;
        Ok(at)
    }

    pub fn set_active(&mut self, key: CurveKey, active: bool) -> Result<()> {
        self.registry.curve_mut(key)?.active = active;
        self.refresh(key)
    }

    pub fn set_live_data(&mut self, key: CurveKey, live: bool) -> Result<()> {
        self.registry.curve_mut(key)?.use_live_data = live;
        self.refresh(key)
    }

    pub fn set_archive_data(&mut self, key: CurveKey, archive: bool) -> Result<()> {
        self.registry.curve_mut(key)?.use_archive_data = archive;
        self.refresh(key)
    }

    // -- Edits -------------------------------------------------------------

    /// Apply edited row text to a curve.
    ///
    /// `f://` text is a formula edit and is deferred. On a direct curve it
    /// turns the curve into a formula under a new key. Plain text changes a
    /// direct curve's address immediately and is rejected for formulas.
    pub fn edit_curve(&mut self, key: CurveKey, text: &str, now: Instant) -> Result<EditOutcome> {
        let text = text.trim();
        if is_formula(text) {
            return self.submit_formula_edit(key, text, now);
        }
        let changed = self.registry.set_address(key, text)?;
        if !changed {
            return Ok(EditOutcome::Unchanged);
        }
        self.refresh(key)?;
        Ok(EditOutcome::AddressChanged)
    }

    /// Validate a formula edit now and queue its commit.
    ///
    /// Validation errors are returned immediately and nothing is queued.
    /// While a commit is queued the curve refuses further edits.
    pub fn submit_formula_edit(&mut self, key: CurveKey, text: &str, now: Instant) -> Result<EditOutcome> {
        let curve = self
            .registry
            .get(key)
            .ok_or_else(|| PlotError::CurveNotFound(key.to_string()))?;
        if curve.edit_pending() {
            return Err(PlotError::EditPending(key));
        }
        let Some(plan) = self.registry.plan_replace(key, text)? else {
            return Ok(EditOutcome::Unchanged);
        };
        self.registry.set_edit_pending(key, true);
        debug!(%key, formula = %text, delay = ?self.queue.delay(), "scheduled formula replacement");
        self.queue.schedule(now, plan);
        Ok(EditOutcome::Scheduled)
    }

    /// Commit every queued replacement that is due at `now`.
    pub fn run_due(&mut self, now: Instant) -> Vec<CommitReport> {
        let mut reports = Vec::new();
        while let Some(plan) = self.queue.pop_due(now) {
            reports.push(self.commit(plan));
        }
        reports
    }

    /// Block until the queue is empty, committing each replacement once it
    /// is due.
    pub fn settle(&mut self) -> Vec<CommitReport> {
        let mut reports = Vec::new();
        while let Some(deadline) = self.queue.next_deadline() {
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            }
            reports.extend(self.run_due(Instant::now().max(deadline)));
        }
        reports
    }

    fn commit(&mut self, plan: ReplacePlan) -> CommitReport {
        let old_key = plan.old_key;
        let mut session = PendingRelease {
            session: self,
            key: old_key,
        };
        let result = session.apply_replace(&plan);
        if let Err(err) = &result {
            info!(key = %old_key, error = %err, "formula replacement failed; curve kept");
        }
        CommitReport { old_key, result }
    }

    fn apply_replace(&mut self, plan: &ReplacePlan) -> Result<Replacement> {
        let replacement = self.registry.commit_replace(&mut self.axes, plan)?;
        if let Replacement::Replaced { new_key, .. } = &replacement {
            self.hide(plan.old_key);
            self.show(*new_key)?;
        }
        Ok(replacement)
    }

    // -- Evaluation --------------------------------------------------------

    pub fn evaluate(&self, key: CurveKey, samples: &HashMap<CurveKey, f64>) -> Result<f64> {
        self.registry.evaluate(key, samples)
    }

    /// Register surface series for every curve, in axis order. Used after a
    /// session is rebuilt from a layout.
    pub(crate) fn show_all(&mut self) -> Result<()> {
        let keys: Vec<CurveKey> = self
            .axes
            .iter()
            .flat_map(|a| a.curves().iter().copied())
            .collect();
        for key in keys {
            self.show(key)?;
        }
        Ok(())
    }
}

/// Clears a curve's `edit_pending` flag when dropped, whichever way the
/// commit exits.
struct PendingRelease<'a, S: PlotSurface> {
    session: &'a mut PlotSession<S>,
    key: CurveKey,
}

impl<S: PlotSurface> Deref for PendingRelease<'_, S> {
    type Target = PlotSession<S>;

    fn deref(&self) -> &Self::Target {
        self.session
    }
}

impl<S: PlotSurface> DerefMut for PendingRelease<'_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session
    }
}

impl<S: PlotSurface> Drop for PendingRelease<'_, S> {
    fn drop(&mut self) {
        self.session.registry.set_edit_pending(self.key, false);
    }
}
