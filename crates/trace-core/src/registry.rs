//! The curve registry: creation, validation, replacement and removal.
//!
//! The registry owns every [`Curve`] by key and keeps the per-axis curve
//! lists in an [`AxisCollection`] in step with each curve's `axis` field. The
//! axis collection is passed in explicitly by the owning session.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use trace_formula::{Formula, extract_variables, is_formula, strip_prefix, validate_bare_expression};

use crate::axis::{AxisCollection, AxisId};
use crate::color::{Color, ColorAssigner};
use crate::curve::{Curve, CurveDefaults, CurveKind};
use crate::dependency::{DependencyLookup, dependents_of, would_cycle};
use crate::error::{PlotError, Result};
use crate::keygen::{CurveKey, KeyGenerator};

/// What happens to formulas that reference a deleted curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DanglingPolicy {
    /// Leave dependents in place; they fail on their next edit or evaluation.
    #[default]
    Keep,
    /// Delete dependents too, transitively.
    Cascade,
}

impl std::str::FromStr for DanglingPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "cascade" => Ok(Self::Cascade),
            _ => Err(format!("invalid dangling policy '{}' (expected keep or cascade)", s)),
        }
    }
}

/// Which caller is validating, which decides how a bad bare expression reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPath {
    Create,
    Edit,
}

/// Result of [`CurveRegistry::delete`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Removal {
    /// Keys removed, the requested key first.
    pub removed: Vec<CurveKey>,
    /// Formulas left referencing a removed key.
    pub dangling: Vec<CurveKey>,
}

/// A formula replacement that passed validation and waits to be committed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacePlan {
    pub old_key: CurveKey,
    pub text: String,
}

/// Result of committing a [`ReplacePlan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// The text matched the current formula; nothing changed.
    Unchanged,
    Replaced {
        new_key: CurveKey,
        /// Formulas still referencing the retired key.
        dangling: Vec<CurveKey>,
    },
}

/// Owns all curves of a session.
#[derive(Debug, Clone)]
pub struct CurveRegistry {
    curves: BTreeMap<CurveKey, Curve>,
    keys: KeyGenerator,
    colors: ColorAssigner,
    defaults: CurveDefaults,
}

impl CurveRegistry {
    pub fn new(colors: ColorAssigner, defaults: CurveDefaults) -> Self {
        Self {
            curves: BTreeMap::new(),
            keys: KeyGenerator::new(),
            colors,
            defaults,
        }
    }

    // -- Lookup ------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn get(&self, key: CurveKey) -> Option<&Curve> {
        self.curves.get(&key)
    }

    pub fn contains(&self, key: CurveKey) -> bool {
        self.curves.contains_key(&key)
    }

    /// Curves in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Curve> {
        self.curves.values()
    }

    /// Look up a curve by its spelled key.
    pub fn resolve(&self, name: &str) -> Result<CurveKey> {
        CurveKey::parse(name)
            .filter(|k| self.contains(*k))
            .ok_or_else(|| PlotError::CurveNotFound(name.to_string()))
    }

    /// Keys that a formula may currently reference, in issuance order.
    pub fn available_keys(&self) -> Vec<String> {
        self.curves.keys().map(|k| k.to_string()).collect()
    }

    /// The key the next creation will be given.
    pub fn next_key(&self) -> CurveKey {
        self.keys.peek()
    }

    /// Formula curves paired with each missing key they reference.
    pub fn dangling(&self) -> Vec<(CurveKey, CurveKey)> {
        let mut found = Vec::new();
        for (key, deps) in self.formula_edges() {
            for dep in deps {
                if !self.curves.contains_key(dep) {
                    found.push((key, *dep));
                }
            }
        }
        found
    }

    pub(crate) fn curve_mut(&mut self, key: CurveKey) -> Result<&mut Curve> {
        self.curves
            .get_mut(&key)
            .ok_or_else(|| PlotError::CurveNotFound(key.to_string()))
    }

    fn require_axis(axes: &AxisCollection, axis: AxisId) -> Result<()> {
        axes.get(axis)
            .map(|_| ())
            .ok_or_else(|| PlotError::AxisNotFound(axis.to_string()))
    }

    // -- Validation --------------------------------------------------------

    /// Validate formula text for a curve identified as `row_name`.
    ///
    /// Returns the compiled formula and its resolved dependencies. Nothing is
    /// mutated.
    pub fn validate_formula(
        &self,
        row_name: &str,
        text: &str,
        path: ValidationPath,
    ) -> Result<(Formula, BTreeSet<CurveKey>)> {
        if !is_formula(text) {
            return Err(PlotError::MissingFormulaPrefix(text.to_string()));
        }

        let variables = extract_variables(text);
        let mut dependencies = BTreeSet::new();
        for name in &variables {
            if name == row_name {
                return Err(PlotError::SelfReference(name.clone()));
            }
            match CurveKey::parse(name).filter(|k| self.contains(*k)) {
                Some(key) => {
                    dependencies.insert(key);
                }
                None => {
                    return Err(PlotError::UnknownVariable {
                        name: name.clone(),
                        available: self.available_keys(),
                    });
                }
            }
        }

        if would_cycle(row_name, &dependencies, self) {
            return Err(PlotError::CyclicDependency);
        }

        if variables.is_empty() {
            let body = strip_prefix(text).map_err(|e| PlotError::Syntax(e.to_string()))?;
            if validate_bare_expression(body).is_err() {
                return Err(PlotError::Syntax(match path {
                    ValidationPath::Create => "Invalid Input".to_string(),
                    ValidationPath::Edit => format!("Invalid expression: {}", body),
                }));
            }
        }

        let formula = Formula::parse(text).map_err(|e| PlotError::Syntax(e.to_string()))?;
        Ok((formula, dependencies))
    }

    // -- Creation ----------------------------------------------------------

    /// Create a direct curve at the end of `axis`.
    pub fn create_direct(
        &mut self,
        axes: &mut AxisCollection,
        axis: AxisId,
        address: &str,
    ) -> Result<CurveKey> {
        Self::require_axis(axes, axis)?;
        let key = self.keys.next_key();
        let kind = CurveKind::Direct {
            address: address.to_string(),
        };
        self.insert_new(axes, axis, key, kind, None)?;
        info!(%key, %address, "created direct curve");
        Ok(key)
    }

    /// Create a formula curve at the end of `axis`.
    ///
    /// The candidate key is allocated before validation and is burned if
    /// validation fails. `row_name` defaults to that key and is the identity
    /// checked for self-reference and cycles.
    pub fn create_formula(
        &mut self,
        axes: &mut AxisCollection,
        axis: AxisId,
        row_name: Option<&str>,
        text: &str,
    ) -> Result<CurveKey> {
        Self::require_axis(axes, axis)?;
        let key = self.keys.next_key();
        let row_name = row_name.map(str::to_string).unwrap_or_else(|| key.to_string());

        let (formula, dependencies) = self.validate_formula(&row_name, text, ValidationPath::Create)?;
        let kind = CurveKind::Formula {
            formula,
            dependencies,
        };
        self.insert_new(axes, axis, key, kind, None)?;
        info!(%key, formula = %text, "created formula curve");
        Ok(key)
    }

    fn insert_new(
        &mut self,
        axes: &mut AxisCollection,
        axis: AxisId,
        key: CurveKey,
        kind: CurveKind,
        position: Option<usize>,
    ) -> Result<()> {
        let color = self.colors.for_index(self.curves.len());
        let mut curve = Curve::new(key, axis, color, kind, self.defaults);
        if let Some(a) = axes.get(axis) {
            curve.active = curve.active && a.visible();
        }
        axes.attach(axis, key, position)?;
        self.curves.insert(key, curve);
        Ok(())
    }

    // -- Removal -----------------------------------------------------------

    /// Delete a curve and, under [`DanglingPolicy::Cascade`], everything that
    /// depends on it.
    pub fn delete(
        &mut self,
        axes: &mut AxisCollection,
        key: CurveKey,
        policy: DanglingPolicy,
    ) -> Result<Removal> {
        if !self.contains(key) {
            return Err(PlotError::CurveNotFound(key.to_string()));
        }

        let mut doomed = vec![key];
        if policy == DanglingPolicy::Cascade {
            let dependents = dependents_of(&BTreeSet::from([key]), self.formula_edges());
            doomed.extend(dependents);
        }
        self.retire(axes, &doomed)?;

        let dangling = self.referencing(&doomed);
        if !dangling.is_empty() {
            warn!(
                removed = %key,
                dependents = ?dangling.iter().map(|k| k.to_string()).collect::<Vec<_>>(),
                "deletion left dangling formula references"
            );
        }
        Ok(Removal {
            removed: doomed,
            dangling,
        })
    }

    /// Remove every curve on an axis that is being closed, plus (under
    /// cascade) their dependents elsewhere.
    pub(crate) fn delete_many(
        &mut self,
        axes: &mut AxisCollection,
        keys: &[CurveKey],
        policy: DanglingPolicy,
    ) -> Result<Removal> {
        let mut doomed: Vec<CurveKey> = keys.iter().copied().filter(|k| self.contains(*k)).collect();
        if policy == DanglingPolicy::Cascade {
            let roots: BTreeSet<CurveKey> = doomed.iter().copied().collect();
            doomed.extend(dependents_of(&roots, self.formula_edges()));
        }
        self.retire(axes, &doomed)?;
        let dangling = self.referencing(&doomed);
        if !dangling.is_empty() {
            warn!(count = dangling.len(), "axis removal left dangling formula references");
        }
        Ok(Removal {
            removed: doomed,
            dangling,
        })
    }

    /// Detach and drop `keys`, after checking every one of them is where the
    /// registry thinks it is.
    fn retire(&mut self, axes: &mut AxisCollection, keys: &[CurveKey]) -> Result<()> {
        for key in keys {
            let curve = self
                .curves
                .get(key)
                .ok_or_else(|| PlotError::structural(format!("{} vanished during removal", key)))?;
            let listed = axes
                .get(curve.axis)
                .and_then(|a| a.position_of(*key))
                .is_some();
            if !listed {
                return Err(PlotError::structural(format!(
                    "{} is not listed on {}",
                    key, curve.axis
                )));
            }
        }
        for key in keys {
            if let Some(curve) = self.curves.remove(key) {
                axes.detach(curve.axis, *key)?;
                info!(%key, "removed curve");
            }
        }
        Ok(())
    }

    fn formula_edges(&self) -> impl Iterator<Item = (CurveKey, &BTreeSet<CurveKey>)> + Clone {
        self.curves
            .values()
            .filter_map(|c| c.dependencies().map(|d| (c.key(), d)))
    }

    /// Live formulas that reference any of `keys`.
    fn referencing(&self, keys: &[CurveKey]) -> Vec<CurveKey> {
        self.formula_edges()
            .filter(|(_, deps)| keys.iter().any(|k| deps.contains(k)))
            .map(|(k, _)| k)
            .collect()
    }

    // -- Replacement -------------------------------------------------------

    /// Validate a formula edit of `old` without mutating anything.
    ///
    /// `old` may be a direct curve; it becomes a formula curve on commit.
    /// Returns `None` when `text` equals the current text.
    pub fn plan_replace(&self, old: CurveKey, text: &str) -> Result<Option<ReplacePlan>> {
        let curve = self
            .get(old)
            .ok_or_else(|| PlotError::CurveNotFound(old.to_string()))?;
        if curve.text() == text {
            return Ok(None);
        }
        self.validate_formula(&old.to_string(), text, ValidationPath::Edit)?;
        Ok(Some(ReplacePlan {
            old_key: old,
            text: text.to_string(),
        }))
    }

    /// Commit a planned replacement.
    ///
    /// Validation runs again against the current graph. On success the old
    /// curve is retired and a new one, with a fresh key, takes its position in
    /// the same axis and inherits its flags. Dependents of the old key are
    /// never touched.
    pub fn commit_replace(&mut self, axes: &mut AxisCollection, plan: &ReplacePlan) -> Result<Replacement> {
        let old = plan.old_key;
        let text = plan.text.as_str();
        let previous = self
            .curves
            .get(&old)
            .cloned()
            .ok_or_else(|| PlotError::CurveNotFound(old.to_string()))?;
        if previous.text() == text {
            return Ok(Replacement::Unchanged);
        }
        let (formula, dependencies) =
            self.validate_formula(&old.to_string(), text, ValidationPath::Edit)?;

        let axis = previous.axis;
        let position = axes
            .get(axis)
            .and_then(|a| a.position_of(old))
            .ok_or_else(|| PlotError::structural(format!("{} is not listed on {}", old, axis)))?;

        let new_key = self.keys.next_key();
        let color = self.colors.for_index(self.curves.len() - 1);
        let mut curve = Curve::new(
            new_key,
            axis,
            color,
            CurveKind::Formula {
                formula,
                dependencies,
            },
            self.defaults,
        );
        curve.inherit_flags(&previous);

        axes.replace_at(axis, position, new_key)?;
        self.curves.remove(&old);
        self.curves.insert(new_key, curve);
        info!(%old, %new_key, formula = %text, "replaced formula curve");

        let dangling = self.referencing(&[old]);
        if !dangling.is_empty() {
            warn!(
                retired = %old,
                dependents = ?dangling.iter().map(|k| k.to_string()).collect::<Vec<_>>(),
                "replacement left dangling formula references"
            );
        }
        Ok(Replacement::Replaced { new_key, dangling })
    }

    /// Validate and commit in one step.
    pub fn replace(&mut self, axes: &mut AxisCollection, old: CurveKey, text: &str) -> Result<Replacement> {
        match self.plan_replace(old, text)? {
            None => Ok(Replacement::Unchanged),
            Some(plan) => self.commit_replace(axes, &plan),
        }
    }

    // -- Moves and flags ---------------------------------------------------

    /// Move a curve to `to`, at `position` or the end. The curve adopts the
    /// target axis's visibility.
    pub fn move_curve(
        &mut self,
        axes: &mut AxisCollection,
        key: CurveKey,
        to: AxisId,
        position: Option<usize>,
    ) -> Result<usize> {
        let from = self
            .get(key)
            .map(|c| c.axis)
            .ok_or_else(|| PlotError::CurveNotFound(key.to_string()))?;
        let at = axes.move_curve(key, from, to, position)?;
        let visible = axes.get(to).map(|a| a.visible()).unwrap_or(true);
        let curve = self.curve_mut(key)?;
        curve.axis = to;
        curve.active = visible;
        debug!(%key, %from, %to, position = at, "moved curve");
        Ok(at)
    }

    /// Change the address of a direct curve in place.
    pub fn set_address(&mut self, key: CurveKey, address: &str) -> Result<bool> {
        let curve = self.curve_mut(key)?;
        match &mut curve.kind {
            CurveKind::Direct { address: current } => {
                if current == address {
                    return Ok(false);
                }
                *current = address.to_string();
                Ok(true)
            }
            CurveKind::Formula { .. } => Err(PlotError::MissingFormulaPrefix(address.to_string())),
        }
    }

    pub(crate) fn set_edit_pending(&mut self, key: CurveKey, pending: bool) {
        if let Some(curve) = self.curves.get_mut(&key) {
            curve.edit_pending = pending;
        }
    }

    // -- Evaluation --------------------------------------------------------

    /// Evaluate a curve against sample values for direct curves.
    pub fn evaluate(&self, key: CurveKey, samples: &HashMap<CurveKey, f64>) -> Result<f64> {
        let mut visiting = HashSet::new();
        self.evaluate_inner(key, samples, &mut visiting)
    }

    fn evaluate_inner(
        &self,
        key: CurveKey,
        samples: &HashMap<CurveKey, f64>,
        visiting: &mut HashSet<CurveKey>,
    ) -> Result<f64> {
        let curve = self.get(key).ok_or_else(|| PlotError::UnknownVariable {
            name: key.to_string(),
            available: self.available_keys(),
        })?;
        match &curve.kind {
            CurveKind::Direct { .. } => samples
                .get(&key)
                .copied()
                .ok_or(PlotError::MissingSample(key)),
            CurveKind::Formula {
                formula,
                dependencies,
            } => {
                if !visiting.insert(key) {
                    return Err(PlotError::CyclicDependency);
                }
                let mut env = HashMap::with_capacity(dependencies.len());
                for dep in dependencies {
                    let value = self.evaluate_inner(*dep, samples, visiting)?;
                    env.insert(dep.to_string(), value);
                }
                visiting.remove(&key);
                formula
                    .evaluate(&env)
                    .map_err(|e| PlotError::Evaluation(e.to_string()))
            }
        }
    }

    // -- Restore -----------------------------------------------------------

    /// Insert a curve under a known key, as read back from a saved layout.
    ///
    /// Formula dependencies are not checked here; the caller validates the
    /// whole graph once every curve is back.
    pub(crate) fn restore(
        &mut self,
        axes: &mut AxisCollection,
        axis: AxisId,
        key: CurveKey,
        color: Color,
        kind: CurveKind,
        flags: CurveDefaults,
    ) -> Result<()> {
        if self.contains(key) {
            return Err(PlotError::Layout(format!("duplicate curve key {}", key)));
        }
        Self::require_axis(axes, axis)?;
        let curve = Curve::new(key, axis, color, kind, flags);
        axes.attach(axis, key, None)?;
        self.curves.insert(key, curve);
        self.keys.advance_past(key);
        Ok(())
    }

    /// Never moves the counter backwards.
    pub(crate) fn resume_keys_at(&mut self, next: u64) {
        if next > self.keys.peek().number() {
            self.keys = KeyGenerator::starting_at(next);
        }
    }
}

impl Default for CurveRegistry {
    fn default() -> Self {
        Self::new(ColorAssigner::default(), CurveDefaults::default())
    }
}

impl DependencyLookup for CurveRegistry {
    fn dependencies(&self, key: &CurveKey) -> Option<&BTreeSet<CurveKey>> {
        self.curves.get(key).and_then(Curve::dependencies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn setup() -> (CurveRegistry, AxisCollection, AxisId) {
        let mut axes = AxisCollection::default();
        let axis = axes.add_axis(None).unwrap();
        (CurveRegistry::default(), axes, axis)
    }

    #[test]
    fn direct_keys_are_sequential() {
        let (mut reg, mut axes, axis) = setup();
        let other = axes.add_axis(None).unwrap();
        let keys: Vec<String> = [axis, other, axis]
            .into_iter()
            .map(|a| reg.create_direct(&mut axes, a, "SR:TEMP").unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["PV1", "PV2", "PV3"]);
        assert_eq!(axes.get(axis).unwrap().curves().len(), 2);
    }

    #[test]
    fn colors_follow_curve_count() {
        let (mut reg, mut axes, axis) = setup();
        let a = reg.create_direct(&mut axes, axis, "A").unwrap();
        let b = reg.create_direct(&mut axes, axis, "B").unwrap();
        let colors = ColorAssigner::default();
        assert_eq!(reg.get(a).unwrap().color(), colors.for_index(0));
        assert_eq!(reg.get(b).unwrap().color(), colors.for_index(1));
    }

    #[test]
    fn create_on_missing_axis_burns_nothing() {
        let (mut reg, mut axes, _) = setup();
        let err = reg.create_direct(&mut axes, AxisId::from_raw(42), "A").unwrap_err();
        assert!(matches!(err, PlotError::AxisNotFound(_)));
        assert_eq!(reg.next_key().to_string(), "PV1");
    }

    #[test]
    fn failed_formula_burns_key() {
        let (mut reg, mut axes, axis) = setup();
        assert!(reg.create_formula(&mut axes, axis, None, "f://{PV99}").is_err());
        let key = reg.create_direct(&mut axes, axis, "A").unwrap();
        assert_eq!(key.to_string(), "PV2");
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn self_reference_by_row_name() {
        let (mut reg, mut axes, axis) = setup();
        let err = reg
            .create_formula(&mut axes, axis, Some("X"), "f://{X}+1")
            .unwrap_err();
        assert_eq!(err, PlotError::SelfReference("X".into()));

        // The candidate key is the default row name.
        let err = reg
            .create_formula(&mut axes, axis, None, "f://{PV2}+1")
            .unwrap_err();
        assert_eq!(err, PlotError::SelfReference("PV2".into()));
    }

    #[test]
    fn bare_expression_messages() {
        let (reg, _, _) = setup();
        assert_eq!(
            reg.validate_formula("PV1", "f://2+", ValidationPath::Create).unwrap_err(),
            PlotError::Syntax("Invalid Input".into())
        );
        assert_eq!(
            reg.validate_formula("PV1", "f://2+", ValidationPath::Edit).unwrap_err(),
            PlotError::Syntax("Invalid expression: 2+".into())
        );
        assert!(reg.validate_formula("PV1", "f://2+2", ValidationPath::Create).is_ok());
        assert_eq!(
            reg.validate_formula("PV1", "2+2", ValidationPath::Create).unwrap_err(),
            PlotError::MissingFormulaPrefix("2+2".into())
        );
    }

    #[test]
    fn formula_with_placeholders_and_bad_syntax() {
        let (mut reg, mut axes, axis) = setup();
        reg.create_direct(&mut axes, axis, "A").unwrap();
        let err = reg.create_formula(&mut axes, axis, None, "f://{PV1}+").unwrap_err();
        assert!(matches!(err, PlotError::Syntax(_)));
    }

    #[test]
    fn delete_keep_reports_dangling() {
        let (mut reg, mut axes, axis) = setup();
        let a = reg.create_direct(&mut axes, axis, "A").unwrap();
        let b = reg.create_formula(&mut axes, axis, None, "f://{PV1}*2").unwrap();

        let removal = reg.delete(&mut axes, a, DanglingPolicy::Keep).unwrap();
        assert_eq!(removal.removed, vec![a]);
        assert_eq!(removal.dangling, vec![b]);
        assert_eq!(reg.dangling(), vec![(b, a)]);
        assert_eq!(axes.get(axis).unwrap().curves(), &[b]);

        let err = reg.evaluate(b, &HashMap::new()).unwrap_err();
        assert!(matches!(err, PlotError::UnknownVariable { ref name, .. } if name == "PV1"));
    }

    #[test]
    fn delete_cascade_is_transitive() {
        let (mut reg, mut axes, axis) = setup();
        let a = reg.create_direct(&mut axes, axis, "A").unwrap();
        let b = reg.create_formula(&mut axes, axis, None, "f://{PV1}*2").unwrap();
        let c = reg.create_formula(&mut axes, axis, None, "f://{PV2}+1").unwrap();
        let d = reg.create_direct(&mut axes, axis, "D").unwrap();

        let removal = reg.delete(&mut axes, a, DanglingPolicy::Cascade).unwrap();
        assert_eq!(removal.removed, vec![a, b, c]);
        assert!(removal.dangling.is_empty());
        assert_eq!(axes.get(axis).unwrap().curves(), &[d]);
    }

    #[test]
    fn replace_keeps_slot_and_flags() {
        let (mut reg, mut axes, axis) = setup();
        reg.create_direct(&mut axes, axis, "A").unwrap();
        let f = reg.create_formula(&mut axes, axis, None, "f://{PV1}+1").unwrap();
        reg.create_direct(&mut axes, axis, "C").unwrap();
        reg.curve_mut(f).unwrap().use_live_data = true;

        let Replacement::Replaced { new_key, dangling } =
            reg.replace(&mut axes, f, "f://{PV1}*3").unwrap()
        else {
            panic!("expected a replacement");
        };
        assert_eq!(new_key.to_string(), "PV4");
        assert!(dangling.is_empty());
        assert_eq!(axes.get(axis).unwrap().position_of(new_key), Some(1));
        assert!(reg.get(f).is_none());
        assert!(reg.get(new_key).unwrap().use_live_data);
    }

    #[test]
    fn identical_text_is_a_noop() {
        let (mut reg, mut axes, axis) = setup();
        reg.create_direct(&mut axes, axis, "A").unwrap();
        let f = reg.create_formula(&mut axes, axis, None, "f://{PV1}+1").unwrap();
        let next = reg.next_key();
        assert_eq!(reg.replace(&mut axes, f, "f://{PV1}+1").unwrap(), Replacement::Unchanged);
        assert_eq!(reg.next_key(), next);
    }

    #[test]
    fn direct_curve_becomes_formula_in_place() {
        let (mut reg, mut axes, axis) = setup();
        let a = reg.create_direct(&mut axes, axis, "A").unwrap();
        let b = reg.create_direct(&mut axes, axis, "B").unwrap();
        let Replacement::Replaced { new_key, dangling } = reg.replace(&mut axes, a, "f://{PV2}*2").unwrap()
        else {
            panic!("expected a replacement");
        };
        assert_eq!(new_key.to_string(), "PV3");
        assert!(dangling.is_empty());
        assert_eq!(axes.get(axis).unwrap().curves(), &[new_key, b][..]);
        assert!(reg.get(new_key).unwrap().is_formula());
        assert!(reg.get(a).is_none());
    }

    #[test]
    fn direct_curve_edit_into_cycle_is_rejected() {
        let (mut reg, mut axes, axis) = setup();
        let a = reg.create_direct(&mut axes, axis, "A").unwrap();
        let b = reg.create_formula(&mut axes, axis, None, "f://{PV1}+1").unwrap();
        assert_eq!(
            reg.plan_replace(a, "f://{PV2}+1").unwrap_err(),
            PlotError::CyclicDependency
        );
        assert_eq!(reg.get(a).unwrap().text(), "A");
        assert_eq!(reg.get(b).unwrap().text(), "f://{PV1}+1");
    }

    #[test]
    fn move_adopts_visibility() {
        let (mut reg, mut axes, axis) = setup();
        let hidden = axes.add_axis(Some("Hidden")).unwrap();
        axes.set_visible(hidden, false).unwrap();
        let a = reg.create_direct(&mut axes, axis, "A").unwrap();
        assert!(reg.get(a).unwrap().active);

        reg.move_curve(&mut axes, a, hidden, None).unwrap();
        let curve = reg.get(a).unwrap();
        assert_eq!(curve.axis(), hidden);
        assert!(!curve.active);
        assert!(axes.get(axis).unwrap().curves().is_empty());
    }

    #[test]
    fn evaluate_recursively() {
        let (mut reg, mut axes, axis) = setup();
        let a = reg.create_direct(&mut axes, axis, "A").unwrap();
        reg.create_formula(&mut axes, axis, None, "f://{PV1}*2").unwrap();
        let c = reg.create_formula(&mut axes, axis, None, "f://{PV2}+{PV1}").unwrap();

        let samples = HashMap::from([(a, 5.0)]);
        assert_eq!(reg.evaluate(c, &samples).unwrap(), 15.0);
        assert_eq!(reg.evaluate(c, &HashMap::new()).unwrap_err(), PlotError::MissingSample(a));
    }

    #[test]
    fn set_address_only_on_direct() {
        let (mut reg, mut axes, axis) = setup();
        let a = reg.create_direct(&mut axes, axis, "A").unwrap();
        let f = reg.create_formula(&mut axes, axis, None, "f://1").unwrap();
        assert!(reg.set_address(a, "B").unwrap());
        assert!(!reg.set_address(a, "B").unwrap());
        assert_eq!(reg.get(a).unwrap().text(), "B");
        assert!(matches!(
            reg.set_address(f, "B"),
            Err(PlotError::MissingFormulaPrefix(_))
        ));
    }

    #[test]
    fn policy_parses() {
        assert_eq!("Cascade".parse::<DanglingPolicy>().unwrap(), DanglingPolicy::Cascade);
        assert!("drop".parse::<DanglingPolicy>().is_err());
    }
}
