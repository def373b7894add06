//! Conservative merge engine.
//!
//! Folds candidate values into an authoritative record without overwriting
//! anything already populated. Behaviour per field comes from a rule table, so
//! tracking a new field means adding a row, not new control flow.

use serde_json::{Map, Value};

use crate::profile::completeness::{is_default_value, is_empty};
use crate::profile::invariants::{CAN_REFRAME, CANNOT_MODIFY};
use crate::profile::models::{
    CAPABILITIES, CONSTRAINTS, FACTS, LEADERSHIP_ATTRIBUTES, LEADERSHIP_SIGNALS, RELEVANCE_TAGS,
    STRATEGY, STRATEGY_ATTRIBUTES, TECHNOLOGIES,
};

/// How one field of the authoritative record absorbs a candidate value.
#[derive(Debug, Clone, Copy)]
pub enum MergeRule {
    /// Adopt the candidate value wholesale iff the current slot is empty
    /// and the candidate is not.
    FillIfEmpty,
    /// The field is an object; each listed attribute is filled independently
    /// when `vacant` holds for the current value and not for the candidate's.
    FillAttributes {
        attributes: &'static [&'static str],
        vacant: fn(Option<&Value>) -> bool,
    },
    /// The field is an object whose listed attributes are overwritten with
    /// fixed string sequences regardless of either record.
    PinAttributes(&'static [(&'static str, &'static [&'static str])]),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub rule: MergeRule,
}

/// Rules for one experience entry.
pub const EXPERIENCE_RULES: &[FieldRule] = &[
    FieldRule {
        field: FACTS,
        rule: MergeRule::FillIfEmpty,
    },
    FieldRule {
        field: CAPABILITIES,
        rule: MergeRule::FillIfEmpty,
    },
    FieldRule {
        field: TECHNOLOGIES,
        rule: MergeRule::FillIfEmpty,
    },
    FieldRule {
        field: LEADERSHIP_SIGNALS,
        rule: MergeRule::FillAttributes {
            attributes: &LEADERSHIP_ATTRIBUTES,
            vacant: is_default_value,
        },
    },
    FieldRule {
        field: RELEVANCE_TAGS,
        rule: MergeRule::FillIfEmpty,
    },
];

/// Rules for the profile root.
pub const PROFILE_RULES: &[FieldRule] = &[
    FieldRule {
        field: CONSTRAINTS,
        rule: MergeRule::PinAttributes(&[
            ("cannotModify", CANNOT_MODIFY),
            ("canReframe", CAN_REFRAME),
        ]),
    },
    FieldRule {
        field: STRATEGY,
        rule: MergeRule::FillAttributes {
            attributes: &STRATEGY_ATTRIBUTES,
            vacant: is_empty,
        },
    },
];

/// Result of a merge: the new record plus the slots that were filled from the
/// candidate (`field` or `field.attribute`). Pins are not reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub record: Map<String, Value>,
    pub filled: Vec<String>,
}

/// Produces a new record from `authoritative` and `candidate` under `rules`.
/// Neither input is modified. Fields not named by a rule are carried over as is.
pub fn merge(
    authoritative: &Map<String, Value>,
    candidate: &Map<String, Value>,
    rules: &[FieldRule],
) -> Merged {
    let mut record = authoritative.clone();
    let mut filled = Vec::new();

    for FieldRule { field, rule } in rules {
        match *rule {
            MergeRule::FillIfEmpty => {
                let Some(proposed) = candidate.get(*field) else {
                    continue;
                };
                if is_empty(record.get(*field)) && !is_empty(Some(proposed)) {
                    record.insert(field.to_string(), proposed.clone());
                    filled.push(field.to_string());
                }
            }
            MergeRule::FillAttributes { attributes, vacant } => {
                let Some(Value::Object(proposed)) = candidate.get(*field) else {
                    continue;
                };
                let mut current = match record.get(*field) {
                    Some(Value::Object(current)) => current.clone(),
                    None | Some(Value::Null) => Map::new(),
                    // A populated non-object value is left alone.
                    Some(_) => continue,
                };
                let mut changed = false;
                for attribute in attributes {
                    let offered = proposed.get(*attribute);
                    if vacant(current.get(*attribute)) && !vacant(offered) {
                        if let Some(offered) = offered {
                            current.insert(attribute.to_string(), offered.clone());
                            filled.push(format!("{field}.{attribute}"));
                            changed = true;
                        }
                    }
                }
                if changed {
                    record.insert(field.to_string(), Value::Object(current));
                }
            }
            MergeRule::PinAttributes(pins) => {
                let mut current = match record.get(*field) {
                    Some(Value::Object(current)) => current.clone(),
                    _ => Map::new(),
                };
                for (attribute, values) in pins {
                    current.insert(
                        attribute.to_string(),
                        Value::Array(values.iter().map(|v| Value::from(*v)).collect()),
                    );
                }
                record.insert(field.to_string(), Value::Object(current));
            }
        }
    }

    Merged { record, filled }
}
