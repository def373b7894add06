//! Profile document model and the validated shapes of oracle candidate payloads.
//!
//! The profile is persisted and exchanged as a JSON document whose sections the
//! core never deletes, so it is kept as a JSON object. Candidate payloads coming
//! from the oracle are validated key by key against the typed schemas below; a
//! key that does not validate is treated as absent.

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use tracing::warn;

use crate::errors::AppError;
use crate::llm_client::json_kind;

pub const FACTS: &str = "facts";
pub const CAPABILITIES: &str = "capabilities";
pub const TECHNOLOGIES: &str = "technologies";
pub const LEADERSHIP_SIGNALS: &str = "leadershipSignals";
pub const RELEVANCE_TAGS: &str = "relevanceTags";

pub const MENTORED: &str = "mentored";
pub const LEADERSHIP_FLAGS: [&str; 3] = ["ledProjects", "hiringInvolvement", "crossFunctional"];
pub const LEADERSHIP_ATTRIBUTES: [&str; 4] = [
    MENTORED,
    "ledProjects",
    "hiringInvolvement",
    "crossFunctional",
];

pub const CONSTRAINTS: &str = "constraints";
pub const STRATEGY: &str = "strategy";
pub const STRATEGY_ATTRIBUTES: [&str; 5] = [
    "targetRoles",
    "avoidRoles",
    "seniority",
    "workMode",
    "industries",
];

// ────────────────────────────────────────────────────────────────────────────
// Profile document
// ────────────────────────────────────────────────────────────────────────────

/// The root profile record. Sections other than `experience`, `constraints`
/// and `strategy` pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Profile(Map<String, Value>);

impl Profile {
    /// Validates the top-level structure: an object with `personal`, and an
    /// `experience` array of objects when present.
    pub fn from_value(value: Value) -> Result<Self, AppError> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(AppError::Validation(format!(
                    "Profile must be a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };
        if !map.contains_key("personal") {
            return Err(AppError::Validation(
                "Profile must contain at least the 'personal' key".to_string(),
            ));
        }
        match map.get("experience") {
            None | Some(Value::Null) => {}
            Some(Value::Array(entries)) => {
                if let Some(pos) = entries.iter().position(|e| !e.is_object()) {
                    return Err(AppError::Validation(format!(
                        "experience[{pos}] must be a JSON object"
                    )));
                }
            }
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "'experience' must be an array, got {}",
                    json_kind(other)
                )))
            }
        }
        Ok(Self(map))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    /// Experience entries in stored order. Empty when the section is absent.
    pub fn experiences(&self) -> impl Iterator<Item = &Map<String, Value>> {
        self.0
            .get("experience")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
    }

    pub fn experience_count(&self) -> usize {
        self.experiences().count()
    }

    /// Mutable access to the entries; `None` when the section is absent.
    pub fn experiences_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.0.get_mut("experience").and_then(Value::as_array_mut)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Experience schema (candidate validation)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FactRole {
    Owner,
    Contributor,
    Support,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Fact {
    pub what: String,
    #[serde(default)]
    pub metric: Option<Number>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scope: String,
    pub my_role: FactRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Capability {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TechDepth {
    Architecture,
    Implementation,
    Basic,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Technology {
    pub name: String,
    #[serde(default)]
    pub years_in_this_role: Option<Number>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub used_in_production: bool,
    pub depth: TechDepth,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contexts: Vec<String>,
}

/// Explicit `null` reads as the field's default, like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Validated partial payload of an experience enrichment call.
/// Only keys that passed validation are present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExperienceCandidate(Map<String, Value>);

impl ExperienceCandidate {
    /// Validates each tracked key independently. Extra keys are ignored.
    pub fn from_payload(payload: &Map<String, Value>) -> Self {
        let mut fields = Map::new();
        insert_validated::<Vec<Fact>>(&mut fields, payload, FACTS);
        insert_validated::<Vec<Capability>>(&mut fields, payload, CAPABILITIES);
        insert_validated::<Vec<Technology>>(&mut fields, payload, TECHNOLOGIES);
        insert_validated::<Vec<String>>(&mut fields, payload, RELEVANCE_TAGS);

        // Leadership values may arrive non-canonical; normalization fixes them
        // after merge, so only the container shape is checked here.
        match payload.get(LEADERSHIP_SIGNALS) {
            Some(Value::Object(signals)) => {
                fields.insert(LEADERSHIP_SIGNALS.to_string(), Value::Object(signals.clone()));
            }
            Some(other) => warn!(
                "Discarding candidate '{LEADERSHIP_SIGNALS}': expected object, got {}",
                json_kind(other)
            ),
            None => {}
        }

        Self(fields)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Strategy schema (candidate validation)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Seniority {
    Mid,
    Senior,
    Staff,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WorkMode {
    #[serde(rename = "remoto")]
    Remote,
    #[serde(rename = "híbrido")]
    Hybrid,
    #[serde(rename = "presencial")]
    OnSite,
}

/// Validated partial `strategy` payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyCandidate(Map<String, Value>);

impl StrategyCandidate {
    pub fn from_value(value: Option<&Value>) -> Self {
        let mut fields = Map::new();
        let Some(Value::Object(payload)) = value else {
            return Self(fields);
        };
        insert_validated::<Vec<String>>(&mut fields, payload, "targetRoles");
        insert_validated::<Vec<String>>(&mut fields, payload, "avoidRoles");
        insert_validated::<Seniority>(&mut fields, payload, "seniority");
        insert_validated::<WorkMode>(&mut fields, payload, "workMode");
        insert_validated::<Vec<String>>(&mut fields, payload, "industries");
        Self(fields)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Copies `payload[key]` into `fields` if it deserializes as `T`.
/// The value is re-serialized so only schema fields survive.
fn insert_validated<T>(fields: &mut Map<String, Value>, payload: &Map<String, Value>, key: &str)
where
    T: DeserializeOwned + Serialize,
{
    let Some(raw) = payload.get(key) else {
        return;
    };
    let validated = serde_json::from_value::<T>(raw.clone()).and_then(serde_json::to_value);
    match validated {
        Ok(value) => {
            fields.insert(key.to_string(), value);
        }
        Err(e) => warn!("Discarding candidate '{key}': {e}"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_profile_requires_personal() {
        let err = Profile::from_value(json!({"experience": []})).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_profile_rejects_non_object() {
        assert!(Profile::from_value(json!(["personal"])).is_err());
    }

    #[test]
    fn test_profile_rejects_non_array_experience() {
        let err = Profile::from_value(json!({"personal": {}, "experience": "x"})).unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_profile_rejects_non_object_entry() {
        let err =
            Profile::from_value(json!({"personal": {}, "experience": [{}, 3]})).unwrap_err();
        assert!(err.to_string().contains("experience[1]"));
    }

    #[test]
    fn test_profile_without_experience_is_valid() {
        let profile = Profile::from_value(json!({"personal": {"firstName": "Ana"}})).unwrap();
        assert_eq!(profile.experience_count(), 0);
    }

    #[test]
    fn test_candidate_keeps_valid_keys() {
        let payload = as_map(json!({
            "facts": [{"what": "Migró el DWH", "metric": 40, "scope": "equipo", "myRole": "owner"}],
            "capabilities": [{"name": "Data modeling", "evidence": ["DWH"]}],
            "technologies": [{"name": "Spark", "yearsInThisRole": 2, "usedInProduction": true,
                              "depth": "implementation", "contexts": ["ETL"]}],
            "leadershipSignals": {"mentored": "2", "ledProjects": "true"},
            "relevanceTags": ["data"],
            "unexpected": 1
        }));
        let candidate = ExperienceCandidate::from_payload(&payload);
        let map = candidate.as_map();
        assert_eq!(map.len(), 5);
        assert!(!map.contains_key("unexpected"));
        assert_eq!(map["facts"][0]["myRole"], "owner");
        assert_eq!(map["leadershipSignals"]["mentored"], "2");
    }

    #[test]
    fn test_candidate_accepts_null_optional_fields() {
        let payload = as_map(json!({
            "facts": [
                {"what": "Migró el DWH", "metric": null, "scope": "equipo", "myRole": "owner"},
                {"what": "Bajó costos", "metric": 30, "scope": null, "myRole": "contributor"}
            ],
            "capabilities": [{"name": "Data modeling", "evidence": null}],
            "technologies": [{"name": "Spark", "yearsInThisRole": null, "usedInProduction": null,
                              "depth": "basic", "contexts": null}]
        }));
        let candidate = ExperienceCandidate::from_payload(&payload);
        let map = candidate.as_map();
        assert_eq!(map["facts"].as_array().map(Vec::len), Some(2));
        assert_eq!(map["facts"][1]["scope"], "");
        assert_eq!(map["capabilities"][0]["evidence"], json!([]));
        assert_eq!(map["technologies"][0]["usedInProduction"], false);
        assert_eq!(map["technologies"][0]["contexts"], json!([]));
    }

    #[test]
    fn test_candidate_invalid_role_fails_closed() {
        let payload = as_map(json!({
            "facts": [{"what": "x", "myRole": "boss"}],
            "relevanceTags": ["data"]
        }));
        let candidate = ExperienceCandidate::from_payload(&payload);
        assert!(!candidate.as_map().contains_key("facts"));
        assert!(candidate.as_map().contains_key("relevanceTags"));
    }

    #[test]
    fn test_candidate_invalid_depth_fails_closed() {
        let payload = as_map(json!({
            "technologies": [{"name": "Kafka", "depth": "expert"}]
        }));
        assert!(ExperienceCandidate::from_payload(&payload).is_empty());
    }

    #[test]
    fn test_candidate_non_object_leadership_is_absent() {
        let payload = as_map(json!({"leadershipSignals": [true]}));
        assert!(ExperienceCandidate::from_payload(&payload).is_empty());
    }

    #[test]
    fn test_strategy_candidate_validates_enums() {
        let value = json!({
            "targetRoles": ["Data Engineer"],
            "seniority": "principal",
            "workMode": "híbrido",
            "industries": "fintech"
        });
        let candidate = StrategyCandidate::from_value(Some(&value));
        let map = candidate.as_map();
        assert_eq!(map["targetRoles"], json!(["Data Engineer"]));
        assert_eq!(map["workMode"], "híbrido");
        assert!(!map.contains_key("seniority"));
        assert!(!map.contains_key("industries"));
    }

    #[test]
    fn test_strategy_candidate_non_object_is_empty() {
        assert!(StrategyCandidate::from_value(Some(&json!("senior")))
            .as_map()
            .is_empty());
        assert!(StrategyCandidate::from_value(None).as_map().is_empty());
    }
}
