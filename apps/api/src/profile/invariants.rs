use serde_json::{Map, Value};

use crate::profile::merge::{merge, PROFILE_RULES};
use crate::profile::models::{Profile, STRATEGY};

/// Profile facts that tailoring must never alter. Exact order is part of the contract.
pub const CANNOT_MODIFY: &[&str] = &[
    "dates",
    "companies",
    "officialTitle",
    "technologies",
    "educationDegrees",
];

/// Profile content that tailoring may rephrase. Exact order is part of the contract.
pub const CAN_REFRAME: &[&str] = &[
    "achievements",
    "summary",
    "bulletOrdering",
    "skillHighlighting",
    "capabilityEmphasis",
    "headline",
];

/// Pins the constraint lists and guarantees a `strategy` object exists.
/// Runs at the end of every enrichment pass, whatever the oracle returned.
pub fn enforce_invariants(profile: &mut Profile) {
    let pinned = merge(profile.as_map(), &Map::new(), PROFILE_RULES).record;
    *profile.as_map_mut() = pinned;

    let map = profile.as_map_mut();
    if matches!(map.get(STRATEGY), None | Some(Value::Null)) {
        map.insert(STRATEGY.to_string(), Value::Object(Map::new()));
    }
}
