//! Turning caller decisions into merge overrides.

use std::collections::BTreeMap;

use docvc_types::{ConflictResolution, ResolutionChoice, Value, ValuePath};

/// The conflicts a merge must settle, as reported to the caller.
pub(crate) fn conflict_report(
    paths: &[ValuePath],
    source: &Value,
    target: &Value,
) -> Vec<ConflictResolution> {
    paths
        .iter()
        .map(|path| {
            ConflictResolution::unresolved(
                path.clone(),
                source.get_path(path).cloned(),
                target.get_path(path).cloned(),
            )
        })
        .collect()
}

/// Conflicts split by whether the caller decided them.
#[derive(Debug, Default)]
pub(crate) struct Settlement {
    pub resolved: Vec<ConflictResolution>,
    pub unresolved: Vec<ConflictResolution>,
    /// Value to write at each resolved path; `None` removes the path.
    pub overrides: BTreeMap<ValuePath, Option<Value>>,
}

/// Match each conflict with the caller's decision for its path.
///
/// A `manual` decision without a value leaves the conflict unresolved.
/// Decisions for paths that are not in conflict are ignored.
pub(crate) fn settle(
    conflicts: Vec<ConflictResolution>,
    decisions: &[ConflictResolution],
    merger: &str,
) -> Settlement {
    let mut settlement = Settlement::default();

    for conflict in conflicts {
        let decision = decisions.iter().find(|d| d.path == conflict.path);
        let value = decision.and_then(|d| match d.resolution {
            ResolutionChoice::Source => Some(conflict.source_value.clone()),
            ResolutionChoice::Target => Some(conflict.target_value.clone()),
            ResolutionChoice::Both => Some(combine_both(
                conflict.source_value.as_ref(),
                conflict.target_value.as_ref(),
            )),
            ResolutionChoice::Manual => d.resolved_value.clone().map(Some),
        });

        match (decision, value) {
            (Some(decision), Some(value)) => {
                settlement
                    .overrides
                    .insert(conflict.path.clone(), value.clone());
                settlement.resolved.push(ConflictResolution {
                    resolved_value: value,
                    resolved_by: Some(
                        decision
                            .resolved_by
                            .clone()
                            .unwrap_or_else(|| merger.to_string()),
                    ),
                    resolution: decision.resolution,
                    ..conflict
                });
            }
            _ => settlement.unresolved.push(conflict),
        }
    }

    settlement
}

/// Keep both sides of a conflict.
///
/// Two sequences concatenate (target first); two maps union, the source
/// winning on shared keys; a side that is absent yields the other; any
/// other pair becomes a two-element sequence `[target, source]`.
pub fn combine_both(source: Option<&Value>, target: Option<&Value>) -> Option<Value> {
    match (source, target) {
        (None, None) => None,
        (Some(only), None) | (None, Some(only)) => Some(only.clone()),
        (Some(Value::Sequence(s)), Some(Value::Sequence(t))) => {
            Some(Value::Sequence(t.iter().chain(s).cloned().collect()))
        }
        (Some(Value::Map(s)), Some(Value::Map(t))) => {
            let mut merged = t.clone();
            merged.extend(s.iter().map(|(k, v)| (k.clone(), v.clone())));
            Some(Value::Map(merged))
        }
        (Some(s), Some(t)) => Some(Value::Sequence(vec![t.clone(), s.clone()])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn p(s: &str) -> ValuePath {
        s.parse().unwrap()
    }

    fn report() -> Vec<ConflictResolution> {
        conflict_report(
            &[p("total"), p("title")],
            &v(json!({"total": 110, "title": "A"})),
            &v(json!({"total": 120, "title": "B"})),
        )
    }

    #[test]
    fn report_carries_both_sides() {
        let conflicts = report();
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].source_value, Some(Value::from(110)));
        assert_eq!(conflicts[0].target_value, Some(Value::from(120)));
        assert_eq!(conflicts[0].resolution, ResolutionChoice::Manual);
        assert!(conflicts[0].resolved_value.is_none());
    }

    #[test]
    fn decisions_become_overrides() {
        let decisions = vec![
            ConflictResolution::manual(p("total"), Value::from(115)),
            ConflictResolution::decide(p("title"), ResolutionChoice::Source),
        ];
        let settlement = settle(report(), &decisions, "lead");
        assert!(settlement.unresolved.is_empty());
        assert_eq!(settlement.overrides[&p("total")], Some(Value::from(115)));
        assert_eq!(settlement.overrides[&p("title")], Some(Value::from("A")));
        assert!(settlement
            .resolved
            .iter()
            .all(|r| r.resolved_by.as_deref() == Some("lead")));
    }

    #[test]
    fn missing_or_empty_decisions_stay_unresolved() {
        let decisions = vec![ConflictResolution::decide(p("total"), ResolutionChoice::Manual)];
        let settlement = settle(report(), &decisions, "lead");
        assert_eq!(settlement.unresolved.len(), 2);
        assert!(settlement.overrides.is_empty());
    }

    #[test]
    fn combine_both_shapes() {
        assert_eq!(
            combine_both(Some(&v(json!([3]))), Some(&v(json!([1, 2])))),
            Some(v(json!([1, 2, 3])))
        );
        assert_eq!(
            combine_both(Some(&v(json!({"a": 1, "b": 2}))), Some(&v(json!({"b": 0, "c": 3})))),
            Some(v(json!({"a": 1, "b": 2, "c": 3})))
        );
        assert_eq!(
            combine_both(Some(&Value::from(1)), Some(&Value::from(2))),
            Some(v(json!([2, 1])))
        );
        assert_eq!(combine_both(None, Some(&Value::from(2))), Some(Value::from(2)));
        assert_eq!(combine_both(None, None), None);
    }
}
