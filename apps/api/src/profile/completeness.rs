use serde_json::{Map, Value};

use crate::profile::models::{
    CAPABILITIES, FACTS, LEADERSHIP_FLAGS, LEADERSHIP_SIGNALS, MENTORED, RELEVANCE_TAGS,
    TECHNOLOGIES,
};

/// Tracked whole-value fields that gate an enrichment call.
const TRACKED_COLLECTIONS: [&str; 4] = [FACTS, CAPABILITIES, TECHNOLOGIES, RELEVANCE_TAGS];

/// Emptiness rule shared by the gate and the merge engine.
///
/// - null / absent → empty
/// - array / object → empty iff it has no elements
/// - string → empty iff blank after trimming
/// - number → empty iff exactly zero
/// - boolean → empty iff false
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(fields)) => fields.is_empty(),
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::Bool(b)) => !b,
    }
}

/// Membership in the leadership default set: null, "", 0, false.
/// Narrower than `is_empty`: whitespace strings and empty collections are not defaults.
pub fn is_default_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::Bool(b)) => !b,
        Some(Value::Array(_)) | Some(Value::Object(_)) => false,
    }
}

/// A leadership aggregate carries no signal: not an object, or no mentees and
/// every flag false or absent.
pub fn is_leadership_empty(signals: Option<&Value>) -> bool {
    let Some(Value::Object(signals)) = signals else {
        return true;
    };
    mentored_is_zero(signals.get(MENTORED))
        && LEADERSHIP_FLAGS
            .iter()
            .all(|flag| !is_truthy(signals.get(*flag)))
}

/// Whether an experience entry has any gap worth an oracle call.
pub fn needs_enrichment(experience: &Map<String, Value>) -> bool {
    TRACKED_COLLECTIONS
        .iter()
        .any(|field| is_empty(experience.get(*field)))
        || is_leadership_empty(experience.get(LEADERSHIP_SIGNALS))
}

/// Names of the tracked fields that are currently empty, in table order.
pub fn empty_fields(experience: &Map<String, Value>) -> Vec<&'static str> {
    let mut fields: Vec<&'static str> = TRACKED_COLLECTIONS
        .iter()
        .copied()
        .filter(|field| is_empty(experience.get(*field)))
        .collect();
    if is_leadership_empty(experience.get(LEADERSHIP_SIGNALS)) {
        fields.push(LEADERSHIP_SIGNALS);
    }
    fields
}

fn mentored_is_zero(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Bool(b)) => !b,
        Some(_) => false,
    }
}

/// Loose truthiness used when a flag has not been normalized yet.
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    !is_empty(value)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn entry(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn complete_entry() -> Map<String, Value> {
        entry(json!({
            "facts": [{"what": "x", "myRole": "owner"}],
            "capabilities": [{"name": "y", "evidence": []}],
            "technologies": [{"name": "Rust", "depth": "basic"}],
            "leadershipSignals": {"mentored": 2, "ledProjects": false,
                                  "hiringInvolvement": false, "crossFunctional": false},
            "relevanceTags": ["backend"]
        }))
    }

    #[test]
    fn test_is_empty_rules() {
        assert!(is_empty(None));
        assert!(is_empty(Some(&json!(null))));
        assert!(is_empty(Some(&json!([]))));
        assert!(is_empty(Some(&json!({}))));
        assert!(is_empty(Some(&json!("   "))));
        assert!(is_empty(Some(&json!(0))));
        assert!(is_empty(Some(&json!(0.0))));
        assert!(is_empty(Some(&json!(false))));

        assert!(!is_empty(Some(&json!([0]))));
        assert!(!is_empty(Some(&json!({"a": null}))));
        assert!(!is_empty(Some(&json!(" x "))));
        assert!(!is_empty(Some(&json!(-1))));
        assert!(!is_empty(Some(&json!(0.5))));
        assert!(!is_empty(Some(&json!(true))));
    }

    #[test]
    fn test_default_set_is_narrower_than_empty() {
        assert!(is_default_value(Some(&json!(""))));
        assert!(is_default_value(Some(&json!(0))));
        assert!(is_default_value(Some(&json!(false))));
        assert!(is_default_value(None));
        assert!(!is_default_value(Some(&json!("  "))));
        assert!(!is_default_value(Some(&json!([]))));
        assert!(!is_default_value(Some(&json!(3))));
    }

    #[test]
    fn test_leadership_empty() {
        assert!(is_leadership_empty(None));
        assert!(is_leadership_empty(Some(&json!("yes"))));
        assert!(is_leadership_empty(Some(&json!({}))));
        assert!(is_leadership_empty(Some(&json!({
            "mentored": 0, "ledProjects": false, "hiringInvolvement": null
        }))));
        assert!(!is_leadership_empty(Some(&json!({"mentored": 1}))));
        assert!(!is_leadership_empty(Some(&json!({"crossFunctional": true}))));
        assert!(!is_leadership_empty(Some(&json!({"ledProjects": "true"}))));
    }

    #[test]
    fn test_complete_entry_needs_no_enrichment() {
        assert!(!needs_enrichment(&complete_entry()));
        assert!(empty_fields(&complete_entry()).is_empty());
    }

    #[test]
    fn test_any_gap_triggers_enrichment() {
        for field in TRACKED_COLLECTIONS {
            let mut e = complete_entry();
            e.insert(field.to_string(), json!([]));
            assert!(needs_enrichment(&e), "{field} empty should trigger");
            assert_eq!(empty_fields(&e), vec![field]);
        }

        let mut e = complete_entry();
        e.insert(LEADERSHIP_SIGNALS.to_string(), json!({"mentored": 0}));
        assert!(needs_enrichment(&e));
        assert_eq!(empty_fields(&e), vec![LEADERSHIP_SIGNALS]);
    }

    #[test]
    fn test_missing_fields_count_as_empty() {
        let e = entry(json!({"immutable": {"company": "Acme"}}));
        assert!(needs_enrichment(&e));
        assert_eq!(empty_fields(&e).len(), 5);
    }
}
