//! Behavioural properties of a plot session, exercised through the public API.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use trace_core::{
    AxisCollection, CurveKey, CurveRegistry, DanglingPolicy, EditOutcome, PlotError, PlotSession, Replacement, SessionOptions,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn session() -> PlotSession {
    PlotSession::new(SessionOptions {
        edit_delay: Duration::ZERO,
        ..SessionOptions::default()
    })
}

fn key(s: &PlotSession, name: &str) -> CurveKey {
    s.resolve(name).unwrap()
}

fn axis_keys(s: &PlotSession, axis: &str) -> Vec<String> {
    s.axes()
        .by_name(axis)
        .unwrap()
        .curves()
        .iter()
        .map(|k| k.to_string())
        .collect()
}

/// Submit a formula edit and commit it immediately.
fn edit_now(s: &mut PlotSession, key: CurveKey, text: &str) -> Result<Replacement, PlotError> {
    let now = Instant::now();
    match s.edit_curve(key, text, now)? {
        EditOutcome::Scheduled => {}
        EditOutcome::Unchanged => return Ok(Replacement::Unchanged),
        EditOutcome::AddressChanged => panic!("not a formula edit"),
    }
    let mut reports = s.run_due(now);
    assert_eq!(reports.len(), 1);
    reports.remove(0).result
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

#[test]
fn keys_are_sequential_across_axes() {
    let mut s = session();
    s.add_axis(Some("A")).unwrap();
    s.add_axis(Some("B")).unwrap();
    let k1 = s.add_series_to("A", "SR:1").unwrap();
    let k2 = s.add_series_to("B", "SR:2").unwrap();
    let k3 = s.add_series_to("A", "SR:3").unwrap();
    let keys: Vec<String> = [k1, k2, k3].iter().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["PV1", "PV2", "PV3"]);
}

#[test]
fn failed_creations_burn_keys_and_deletions_never_free_them() {
    let mut s = session();
    let a = s.add_series("SR:1").unwrap();
    assert!(s.add_series("f://{PV99}").is_err());
    s.delete(a).unwrap();
    assert_eq!(s.add_series("SR:2").unwrap().to_string(), "PV3");
}

// ---------------------------------------------------------------------------
// Formula validation
// ---------------------------------------------------------------------------

#[test]
fn cycle_rejection_leaves_both_curves_unchanged() {
    let mut s = session();
    let a = s.add_series("SR:A").unwrap();
    let b = s.add_series("f://{PV1}+1").unwrap();
    let before = s.to_layout();

    let err = s.edit_curve(a, "f://{PV2}+1", Instant::now()).unwrap_err();
    assert_eq!(err, PlotError::CyclicDependency);
    assert_eq!(s.curve(a).unwrap().text(), "SR:A");
    assert!(!s.curve(a).unwrap().is_formula());
    assert_eq!(s.curve(b).unwrap().text(), "f://{PV1}+1");
    assert_eq!(s.pending_edits(), 0);

    let mut after = s.to_layout();
    after.saved_at = before.saved_at;
    assert_eq!(after, before);
}

#[test]
fn cycle_rejection_through_a_formula_chain() {
    let mut s = session();
    s.add_series("SR:SOURCE").unwrap();
    let a = s.add_series("f://{PV1}").unwrap();
    s.add_series("f://{PV2}+1").unwrap();

    let err = s.edit_curve(a, "f://{PV3}+1", Instant::now()).unwrap_err();
    assert_eq!(err, PlotError::CyclicDependency);
    assert_eq!(s.curve(a).unwrap().text(), "f://{PV1}");
}

#[test]
fn direct_curve_edited_into_formula_keeps_its_slot() {
    let mut s = session();
    let a = s.add_series("SR:A").unwrap();
    s.add_series("SR:B").unwrap();
    let Replacement::Replaced { new_key, .. } = edit_now(&mut s, a, "f://{PV2}*2").unwrap() else {
        panic!("expected a replacement");
    };
    assert_eq!(axis_keys(&s, "Y-Axis 1"), vec![new_key.to_string(), "PV2".to_string()]);
    assert!(s.curve(new_key).unwrap().is_formula());
}

#[test]
fn self_reference_is_reported_before_lookup() {
    let mut s = session();
    s.add_axis(None).unwrap();
    let axis = s.axes().last_id().unwrap();
    let err = s
        .registry()
        .validate_formula("X", "f://{X}+1", trace_core::registry::ValidationPath::Create)
        .unwrap_err();
    assert_eq!(err, PlotError::SelfReference("X".into()));
    assert!(s.axes().get(axis).unwrap().curves().is_empty());
}

#[test]
fn self_referencing_creation_leaves_registry_and_axis_untouched() {
    let mut axes = AxisCollection::default();
    let axis = axes.add_axis(None).unwrap();
    let mut reg = CurveRegistry::default();

    let err = reg
        .create_formula(&mut axes, axis, Some("X"), "f://{X}+1")
        .unwrap_err();
    assert_eq!(err, PlotError::SelfReference("X".into()));
    assert!(reg.is_empty());
    assert!(axes.get(axis).unwrap().curves().is_empty());

    // PV1 was burned above. A live key referencing itself would also close
    // a cycle; the self-reference is what gets reported.
    let a = reg.create_direct(&mut axes, axis, "SR:A").unwrap();
    assert_eq!(a.to_string(), "PV2");
    let err = reg
        .create_formula(&mut axes, axis, Some("PV2"), "f://{PV2}+1")
        .unwrap_err();
    assert_eq!(err, PlotError::SelfReference("PV2".into()));
    assert_eq!(reg.len(), 1);
    assert_eq!(axes.get(axis).unwrap().curves(), &[a][..]);
}

#[test]
fn unknown_variable_lists_available_keys() {
    let mut s = session();
    s.add_series("SR:1").unwrap();
    s.add_series("SR:2").unwrap();
    let err = s.add_series("f://{PV99}").unwrap_err();
    assert_eq!(
        err,
        PlotError::UnknownVariable {
            name: "PV99".into(),
            available: vec!["PV1".into(), "PV2".into()],
        }
    );
    assert_eq!(s.registry().len(), 2);
}

#[test]
fn bare_expressions() {
    let mut s = session();
    assert!(s.add_series("f://2+2").is_ok());
    assert_eq!(
        s.add_series("f://2+").unwrap_err(),
        PlotError::Syntax("Invalid Input".into())
    );

    let f = key(&s, "PV1");
    assert_eq!(
        s.edit_curve(f, "f://2+", Instant::now()).unwrap_err(),
        PlotError::Syntax("Invalid expression: 2+".into())
    );
}

// ---------------------------------------------------------------------------
// Axes
// ---------------------------------------------------------------------------

#[test]
fn auto_naming_picks_smallest_free_number() {
    let mut s = session();
    s.add_axis(Some("Y-Axis 1")).unwrap();
    s.add_axis(Some("Y-Axis 3")).unwrap();
    s.add_axis(None).unwrap();
    let names: Vec<&str> = s.axes().iter().map(|a| a.name()).collect();
    assert_eq!(names, vec!["Y-Axis 1", "Y-Axis 3", "Y-Axis 2"]);
}

#[test]
fn duplicate_axis_names_are_rejected() {
    let mut s = session();
    s.add_axis(Some("Temp")).unwrap();
    s.add_axis(Some("Other")).unwrap();
    assert_eq!(
        s.rename_axis("Other", "Temp").unwrap_err(),
        PlotError::DuplicateAxisName("Temp".into())
    );
}

#[test]
fn moves_keep_every_key_on_exactly_one_axis() {
    let mut s = session();
    s.add_axis(Some("A")).unwrap();
    s.add_axis(Some("B")).unwrap();
    for n in 1..=3 {
        s.add_series_to("A", &format!("SR:{}", n)).unwrap();
    }
    let k2 = key(&s, "PV2");
    assert_eq!(s.move_curve(k2, "B", None).unwrap(), 0);
    assert_eq!(axis_keys(&s, "A"), vec!["PV1", "PV3"]);
    assert_eq!(axis_keys(&s, "B"), vec!["PV2"]);

    let k3 = key(&s, "PV3");
    s.move_curve(k3, "A", Some(0)).unwrap();
    assert_eq!(axis_keys(&s, "A"), vec!["PV3", "PV1"]);

    let total: usize = s.axes().iter().map(|a| a.curves().len()).sum();
    assert_eq!(total, s.registry().len());
}

// ---------------------------------------------------------------------------
// Edits
// ---------------------------------------------------------------------------

#[test]
fn edit_preserves_position() {
    let mut s = session();
    s.add_series("SR:1").unwrap();
    s.add_series("SR:2").unwrap();
    let f = s.add_series("f://{PV1}+{PV2}").unwrap();
    s.add_series("SR:4").unwrap();
    assert_eq!(axis_keys(&s, "Y-Axis 1"), vec!["PV1", "PV2", "PV3", "PV4"]);

    let result = edit_now(&mut s, f, "f://{PV1}-{PV2}").unwrap();
    assert!(matches!(result, Replacement::Replaced { .. }));
    assert_eq!(axis_keys(&s, "Y-Axis 1"), vec!["PV1", "PV2", "PV5", "PV4"]);
}

#[test]
fn identical_edit_is_a_noop() {
    let mut s = session();
    s.add_series("SR:1").unwrap();
    let f = s.add_series("f://{PV1}*2").unwrap();
    let before = s.to_layout();

    assert_eq!(
        s.edit_curve(f, "f://{PV1}*2", Instant::now()).unwrap(),
        EditOutcome::Unchanged
    );
    assert_eq!(s.pending_edits(), 0);

    let mut after = s.to_layout();
    after.saved_at = before.saved_at;
    assert_eq!(after, before);
    assert_eq!(s.registry().next_key().to_string(), "PV3");
}

#[test]
fn replacing_a_dependency_leaves_dependents_dangling() {
    let mut s = session();
    s.add_series("SR:1").unwrap();
    let mid = s.add_series("f://{PV1}*2").unwrap();
    let top = s.add_series("f://{PV2}+1").unwrap();

    let Replacement::Replaced { new_key, dangling } = edit_now(&mut s, mid, "f://{PV1}*3").unwrap()
    else {
        panic!("expected a replacement");
    };
    assert_eq!(new_key.to_string(), "PV4");
    assert_eq!(dangling, vec![top]);

    // The dependent now fails on evaluation and on its next edit.
    let samples = HashMap::from([(key(&s, "PV1"), 1.0)]);
    assert!(matches!(
        s.evaluate(top, &samples),
        Err(PlotError::UnknownVariable { .. })
    ));
    assert!(matches!(
        s.edit_curve(top, "f://{PV2}+2", Instant::now()),
        Err(PlotError::UnknownVariable { .. })
    ));
}

// ---------------------------------------------------------------------------
// Deletion policy and evaluation
// ---------------------------------------------------------------------------

#[test]
fn cascade_policy_removes_dependents() {
    let mut s = PlotSession::new(SessionOptions {
        on_delete: DanglingPolicy::Cascade,
        ..SessionOptions::default()
    });
    let a = s.add_series("SR:1").unwrap();
    s.add_series("f://{PV1}*2").unwrap();
    s.add_series("SR:3").unwrap();

    let removal = s.delete(a).unwrap();
    assert_eq!(removal.removed.len(), 2);
    assert_eq!(axis_keys(&s, "Y-Axis 1"), vec!["PV3"]);
    assert_eq!(s.surface().len(), 1);
}

#[test]
fn evaluation_follows_formula_chains() {
    let mut s = session();
    let t = s.add_series("SR:T").unwrap();
    let p = s.add_series("SR:P").unwrap();
    s.add_series("f://{PV1}*{PV2}").unwrap();
    let ratio = s.add_series("f://{PV3} / max({PV2}, 1)").unwrap();

    let samples = HashMap::from([(t, 6.0), (p, 3.0)]);
    assert_eq!(s.evaluate(ratio, &samples).unwrap(), 6.0);
}
