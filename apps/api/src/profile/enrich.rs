//! Enrichment pass: fills the gaps of a profile through the oracle.
//!
//! Pipeline per pass:
//!   1. every experience entry that needs enrichment gets one oracle call,
//!      all dispatched concurrently and joined;
//!   2. each reply is validated into an `ExperienceCandidate` and merged
//!      conservatively into its own entry (failures stay in that entry);
//!   3. one constraints/strategy call back-fills `strategy`;
//!   4. invariants are enforced and leadership signals normalized.

use futures::future::join_all;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::prompts::clip;
use crate::llm_client::{call_json_object, CallOptions, Oracle};
use crate::profile::completeness::{empty_fields, needs_enrichment};
use crate::profile::invariants::enforce_invariants;
use crate::profile::merge::{merge, EXPERIENCE_RULES, PROFILE_RULES};
use crate::profile::models::{ExperienceCandidate, Profile, StrategyCandidate, STRATEGY};
use crate::profile::normalize::normalize_profile;
use crate::profile::prompts::{experience_enrich_system, strategy_enrich_system};

const EXPERIENCE_MAX_TOKENS: u32 = 4000;
const STRATEGY_MAX_TOKENS: u32 = 1500;
const ENRICH_TEMPERATURE: f32 = 0.1;
/// Characters of each entry's `raw` text included in the strategy summary.
const SUMMARY_RAW_CHARS: usize = 800;

// ────────────────────────────────────────────────────────────────────────────
// Report
// ────────────────────────────────────────────────────────────────────────────

/// What happened to one unit of work during a pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Nothing to do (entry already complete, or no experience at all).
    Skipped,
    /// The oracle answered; `filled` lists the slots it filled, possibly none.
    Enriched { filled: Vec<String> },
    /// The oracle call failed or its reply was unusable. Nothing was changed.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryOutcome {
    pub index: usize,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentReport {
    pub run_id: Uuid,
    pub entries: Vec<EntryOutcome>,
    pub strategy: StepOutcome,
}

impl EnrichmentReport {
    pub fn failed_entries(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, StepOutcome::Failed { .. }))
            .count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichedProfile {
    pub profile: Profile,
    pub report: EnrichmentReport,
}

// ────────────────────────────────────────────────────────────────────────────
// Pass
// ────────────────────────────────────────────────────────────────────────────

/// Runs one enrichment pass over `profile`.
///
/// Fails only when no oracle is configured. Oracle failures are recorded in
/// the report and leave the affected part of the profile as it was.
pub async fn enrich_profile(
    oracle: Option<&dyn Oracle>,
    profile: Profile,
    model: Option<&str>,
) -> Result<EnrichedProfile, AppError> {
    let oracle = oracle.ok_or_else(|| {
        AppError::MissingCredential("OPENAI_API_KEY is not configured; enrichment needs it".into())
    })?;

    let run_id = Uuid::new_v4();
    let mut profile = profile;
    info!(%run_id, entries = profile.experience_count(), "Starting enrichment pass");

    let options = CallOptions {
        model,
        max_tokens: EXPERIENCE_MAX_TOKENS,
        temperature: Some(ENRICH_TEMPERATURE),
    };

    let (entries, strategy) = if profile.experience_count() == 0 {
        (Vec::new(), StepOutcome::Skipped)
    } else {
        let entries = enrich_experiences(oracle, &mut profile, options).await;
        let strategy = enrich_strategy(
            oracle,
            &mut profile,
            CallOptions {
                max_tokens: STRATEGY_MAX_TOKENS,
                ..options
            },
        )
        .await;
        (entries, strategy)
    };

    enforce_invariants(&mut profile);
    normalize_profile(&mut profile);

    let report = EnrichmentReport {
        run_id,
        entries,
        strategy,
    };
    info!(
        %run_id,
        failed = report.failed_entries(),
        "Enrichment pass finished"
    );
    Ok(EnrichedProfile { profile, report })
}

async fn enrich_experiences(
    oracle: &dyn Oracle,
    profile: &mut Profile,
    options: CallOptions<'_>,
) -> Vec<EntryOutcome> {
    let system = experience_enrich_system();

    let mut outcomes: Vec<EntryOutcome> = Vec::new();
    let mut requests: Vec<(usize, String)> = Vec::new();
    for (index, entry) in profile.experiences().enumerate() {
        if needs_enrichment(entry) {
            debug!(index, gaps = ?empty_fields(entry), "Entry needs enrichment");
            requests.push((index, experience_payload(entry).to_string()));
        } else {
            outcomes.push(EntryOutcome {
                index,
                outcome: StepOutcome::Skipped,
            });
        }
    }

    let system = system.as_str();
    let replies = join_all(requests.iter().map(|(index, payload)| async move {
        let reply = call_json_object(oracle, system, payload, options).await;
        (*index, reply)
    }))
    .await;

    let Some(entries) = profile.experiences_mut() else {
        return outcomes;
    };
    for (index, reply) in replies {
        let Some(entry) = entries.get_mut(index).and_then(Value::as_object_mut) else {
            continue;
        };
        let outcome = match reply {
            Ok(payload) => {
                let candidate = ExperienceCandidate::from_payload(&payload);
                if candidate.is_empty() {
                    debug!(index, "Reply carried no valid fields");
                }
                let merged = merge(entry, candidate.as_map(), EXPERIENCE_RULES);
                *entry = merged.record;
                info!(index, filled = ?merged.filled, "Experience entry enriched");
                StepOutcome::Enriched {
                    filled: merged.filled,
                }
            }
            Err(e) => {
                warn!(index, "Experience enrichment failed, entry kept as is: {e}");
                StepOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        outcomes.push(EntryOutcome { index, outcome });
    }

    outcomes.sort_by_key(|o| o.index);
    outcomes
}

async fn enrich_strategy(
    oracle: &dyn Oracle,
    profile: &mut Profile,
    options: CallOptions<'_>,
) -> StepOutcome {
    let system = strategy_enrich_system();
    let summary = profile_summary(profile).to_string();

    match call_json_object(oracle, &system, &summary, options).await {
        Ok(payload) => {
            // Only the strategy is taken; constraints are pinned locally.
            let candidate = StrategyCandidate::from_value(payload.get(STRATEGY));
            let mut proposed = Map::new();
            proposed.insert(
                STRATEGY.to_string(),
                Value::Object(candidate.as_map().clone()),
            );
            let merged = merge(profile.as_map(), &proposed, PROFILE_RULES);
            *profile.as_map_mut() = merged.record;
            StepOutcome::Enriched {
                filled: merged.filled,
            }
        }
        Err(e) => {
            warn!("Strategy enrichment failed, strategy kept as is: {e}");
            StepOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

/// `{raw, immutable, context}` for one entry; absent parts become empty values.
fn experience_payload(entry: &Map<String, Value>) -> Value {
    json!({
        "raw": present_or(entry.get("raw"), json!("")),
        "immutable": present_or(entry.get("immutable"), json!({})),
        "context": present_or(entry.get("context"), json!({})),
    })
}

/// The slice of the profile the strategy call reasons over.
fn profile_summary(profile: &Profile) -> Value {
    let map = profile.as_map();
    let section = |key: &str| map.get(key).cloned().unwrap_or(Value::Null);
    let experience: Vec<Value> = profile
        .experiences()
        .map(|entry| {
            let raw = entry.get("raw").and_then(Value::as_str).unwrap_or_default();
            json!({
                "immutable": entry.get("immutable").cloned().unwrap_or(Value::Null),
                "raw": clip(raw, SUMMARY_RAW_CHARS),
            })
        })
        .collect();

    json!({
        "personal": section("personal"),
        "narrative": section("narrative"),
        "experience": experience,
        "education": section("education"),
        "skills": section("skills"),
        "constraints": section("constraints"),
        "strategy": section("strategy"),
    })
}

fn present_or(value: Option<&Value>, default: Value) -> Value {
    match value {
        None | Some(Value::Null) => default,
        Some(v) => v.clone(),
    }
}
