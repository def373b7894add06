//! Match scoring pipeline.
//!
//! The oracle supplies a technical score, a seniority reading and free-text
//! reasons. Everything after that is local and deterministic: clamping, the
//! seniority penalty, the structural-gap check and the recommendation table.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::llm_client::prompts::clip;
use crate::llm_client::{call_json_object, json_kind, CallOptions, LlmError, Oracle};
use crate::matching::prompts::{match_analysis_prompt, match_analysis_system};
use crate::profile::models::Profile;

pub const MATCH_THRESHOLD: u32 = 70;
/// Below this final score a structural gap means "do not apply".
const RESERVATIONS_FLOOR: u32 = 50;
const MAX_SCORE: i64 = 100;

const PROFILE_PROMPT_CHARS: usize = 25_000;
const JD_PROMPT_CHARS: usize = 15_000;
const MATCH_MAX_TOKENS: u32 = 1200;

pub const FALLBACK_REASON: &str = "No se pudo evaluar el match porque falta JD o OPENAI_API_KEY.";

// ────────────────────────────────────────────────────────────────────────────
// Report types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeniorityFit {
    Match,
    Overqualified,
    Underqualified,
}

impl SeniorityFit {
    /// Reads `seniority_detected`. Anything unrecognised counts as a match.
    pub fn from_raw(value: Option<&Value>) -> Self {
        match value
            .and_then(Value::as_str)
            .map(|s| s.trim().to_lowercase())
            .as_deref()
        {
            Some("overqualified") => SeniorityFit::Overqualified,
            Some("underqualified") => SeniorityFit::Underqualified,
            _ => SeniorityFit::Match,
        }
    }

    pub fn penalty(self) -> i64 {
        match self {
            SeniorityFit::Match => 0,
            SeniorityFit::Overqualified => 25,
            SeniorityFit::Underqualified => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Postularse,
    NoPostularse,
    PostularseConReservas,
}

impl Recommendation {
    pub fn decide(score: u32, has_structural_gap: bool) -> Self {
        if score >= MATCH_THRESHOLD {
            Recommendation::Postularse
        } else if score >= RESERVATIONS_FLOOR || !has_structural_gap {
            Recommendation::PostularseConReservas
        } else {
            Recommendation::NoPostularse
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub score: u32,
    pub threshold: u32,
    pub approved: bool,
    pub seniority_fit: SeniorityFit,
    pub reasons_for: Vec<String>,
    pub reasons_against: Vec<String>,
    pub recommendation: Recommendation,
}

impl MatchReport {
    /// Returned when there is nothing to evaluate against or no oracle.
    pub fn fallback() -> Self {
        Self {
            score: 0,
            threshold: MATCH_THRESHOLD,
            approved: false,
            seniority_fit: SeniorityFit::Match,
            reasons_for: Vec::new(),
            reasons_against: vec![FALLBACK_REASON.to_string()],
            recommendation: Recommendation::NoPostularse,
        }
    }

    /// Applies the business rules to a raw oracle report.
    /// The raw `recommendation` is ignored.
    pub fn from_raw(raw: &Map<String, Value>) -> Result<Self, LlmError> {
        let technical = parse_score(raw.get("score"))?;
        let seniority_fit = SeniorityFit::from_raw(raw.get("seniority_detected"));
        let score = clamp_score(technical - seniority_fit.penalty());

        let reasons_for = coerce_reasons(raw.get("reasons_for"));
        let gap = has_structural_gap(&string_reasons(raw.get("reasons_against")));
        let reasons_against = coerce_reasons(raw.get("reasons_against"));

        Ok(Self {
            score,
            threshold: MATCH_THRESHOLD,
            approved: score >= MATCH_THRESHOLD,
            seniority_fit,
            reasons_for,
            reasons_against,
            recommendation: Recommendation::decide(score, gap),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Raw report coercion
// ────────────────────────────────────────────────────────────────────────────

/// Raw technical score, clamped into [0, 100].
fn parse_score(value: Option<&Value>) -> Result<i64, LlmError> {
    let raw = match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => i,
            // u64 beyond i64, or a float; `as` saturates and truncates toward zero
            None => n.as_f64().map(|f| f as i64).unwrap_or(MAX_SCORE),
        },
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| {
            LlmError::Schema(format!("score is not an integer: {s:?}"))
        })?,
        Some(other) => {
            return Err(LlmError::Schema(format!(
                "score must be a number, got {}",
                json_kind(other)
            )))
        }
    };
    Ok(raw.clamp(0, MAX_SCORE))
}

fn clamp_score(score: i64) -> u32 {
    score.clamp(0, MAX_SCORE) as u32
}

fn coerce_reasons(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(reason_text).collect(),
        Some(other) => vec![reason_text(other)],
    }
}

/// Only reasons the oracle wrote as strings; other items say nothing about gaps.
fn string_reasons(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn reason_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A reason naming a structural gap, in Spanish or English.
pub fn has_structural_gap(reasons_against: &[String]) -> bool {
    reasons_against.iter().any(|reason| {
        let reason = reason.to_lowercase();
        reason.contains("estructural") || reason.contains("structural")
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Scores `profile` against `jd_text`.
///
/// Without an oracle, or with a blank JD, returns the fallback report and
/// makes no call. Oracle failures are returned unchanged so callers can tell
/// transport failures from malformed payloads.
pub async fn score_match(
    oracle: Option<&dyn Oracle>,
    profile: &Profile,
    jd_text: &str,
    model: Option<&str>,
) -> Result<MatchReport, LlmError> {
    let Some(oracle) = oracle.filter(|_| !jd_text.trim().is_empty()) else {
        info!("Match evaluation skipped: no JD or no oracle credential");
        return Ok(MatchReport::fallback());
    };

    let profile_json = serde_json::to_string(profile)?;
    let prompt = match_analysis_prompt(
        clip(&profile_json, PROFILE_PROMPT_CHARS),
        clip(jd_text, JD_PROMPT_CHARS).trim(),
    );

    let raw = call_json_object(
        oracle,
        &match_analysis_system(),
        &prompt,
        CallOptions {
            model,
            max_tokens: MATCH_MAX_TOKENS,
            temperature: Some(0.0),
        },
    )
    .await?;
    debug!(?raw, "Raw match report");

    let report = MatchReport::from_raw(&raw)?;
    info!(
        score = report.score,
        seniority = ?report.seniority_fit,
        recommendation = ?report.recommendation,
        "Match evaluated"
    );
    Ok(report)
}
